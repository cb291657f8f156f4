use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;
pub type SignResult<T> = std::result::Result<T, ConfigurationError>;
pub type TokenReaderResult<T> = std::result::Result<T, TokenReaderError>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error : {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("authorization required : {message}")]
    Auth {
        message: String,
        status_code: Option<u16>,
    },
    #[error("request failed with status {status_code} : {message}")]
    Request { message: String, status_code: u16 },
    #[error("token acquisition failed : {0}")]
    TokenReader(#[from] TokenReaderError),
    #[error("transport failed : {0}")]
    Transport(#[source] BoxError),
    #[error("malformed JSON response : {0}")]
    Json(#[from] serde_json::Error),
    #[error("token store failed : {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn auth<T: Into<String>>(message: T) -> Self {
        Error::Auth {
            message: message.into(),
            status_code: None,
        }
    }

    /// The HTTP status the provider answered with, if this error carries one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Request { status_code, .. } => Some(*status_code),
            Error::Auth { status_code, .. } => *status_code,
            _ => None,
        }
    }

    /// Whether a caller-driven retry may succeed.
    ///
    /// 4xx answers (bad parameters, rejected credentials, rate limiting) are
    /// never retryable; 5xx answers and transport failures are.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Request { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(Box::new(err))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("missing credential : {0} must not be empty")]
    MissingCredential(&'static str),
    #[error("unknown oauth parameter : {0}")]
    UnknownParameter(String),
    #[error("invalid url : {0}")]
    InvalidUrl(String),
    #[error("unsupported url scheme {0}, must be http or https")]
    UnsupportedScheme(String),
    #[error("missing required parameter {parameter} for {endpoint}")]
    MissingParameter {
        endpoint: &'static str,
        parameter: String,
    },
    #[error("{endpoint} requires one of the parameters {candidates}")]
    MissingAlternative {
        endpoint: &'static str,
        candidates: String,
    },
    #[error("invalid parameters : {0}")]
    InvalidParameters(String),
    #[error("invalid proxy settings : {0}")]
    InvalidProxy(String),
    #[error("{0} is not supported by this build, enable the feature of the same name")]
    FeatureDisabled(&'static str),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenReaderError {
    #[error("response has malformed format: not found {0} in {1}")]
    TokenKeyNotFound(&'static str, String),
}
