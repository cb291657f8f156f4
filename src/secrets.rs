use std::fmt;

use serde::Deserialize;

use crate::{ConfigurationError, SignResult, Token};

/// Supplies the key material a [`Signer`](crate::Signer) needs.
pub trait SecretsProvider {
    fn get_consumer_key_pair<'a>(&'a self) -> (&'a str, &'a str);

    fn get_token_pair_option<'a>(&'a self) -> Option<(&'a str, &'a str)>;

    fn get_token_option_pair<'a>(&'a self) -> (Option<&'a str>, Option<&'a str>) {
        self.get_token_pair_option()
            .map(|s| (Some(s.0), Some(s.1)))
            .unwrap_or_else(|| (None, None))
    }
}

/// The consumer key/secret pair identifying the calling application.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credential {
    consumer_key: String,
    consumer_secret: String,
}

impl Credential {
    pub fn new<TKey, TSecret>(consumer_key: TKey, consumer_secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        Credential {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    /// Fails when either half of the pair is empty.
    pub fn validate(&self) -> SignResult<()> {
        if self.consumer_key.is_empty() {
            return Err(ConfigurationError::MissingCredential("consumer_key"));
        }
        if self.consumer_secret.is_empty() {
            return Err(ConfigurationError::MissingCredential("consumer_secret"));
        }
        Ok(())
    }

    /// Pair this credential with a token for signing.
    pub fn token<'a>(&'a self, token: &'a Token) -> Secrets<'a> {
        Secrets {
            credential: self,
            token: Some(token),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .finish()
    }
}

impl SecretsProvider for Credential {
    fn get_consumer_key_pair<'a>(&'a self) -> (&'a str, &'a str) {
        (&self.consumer_key, &self.consumer_secret)
    }

    fn get_token_pair_option<'a>(&'a self) -> Option<(&'a str, &'a str)> {
        None
    }
}

/// A credential borrowed together with an optional token.
#[derive(Debug, Clone, Copy)]
pub struct Secrets<'a> {
    credential: &'a Credential,
    token: Option<&'a Token>,
}

impl<'a> Secrets<'a> {
    pub fn new(credential: &'a Credential, token: Option<&'a Token>) -> Self {
        Secrets { credential, token }
    }
}

impl SecretsProvider for Secrets<'_> {
    fn get_consumer_key_pair<'a>(&'a self) -> (&'a str, &'a str) {
        self.credential.get_consumer_key_pair()
    }

    fn get_token_pair_option<'a>(&'a self) -> Option<(&'a str, &'a str)> {
        self.token.map(|t| (t.key.as_str(), t.secret.as_str()))
    }
}
