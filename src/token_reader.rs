use std::collections::HashMap;

use serde::Deserialize;

use crate::{
    Error, HttpResponse, Result, Token, TokenKind, TokenReaderError, TokenReaderResult,
    OAUTH_TOKEN_KEY,
};

const OAUTH_TOKEN_SECRET_KEY: &str = "oauth_token_secret";

const OAUTH_CALLBACK_CONFIRMED_KEY: &str = "oauth_callback_confirmed";

/// Represents response of token acquisition.
#[derive(Deserialize, Debug)]
pub struct TokenResponse {
    /// OAuth Token
    pub oauth_token: String,
    /// OAuth Token Secret
    pub oauth_token_secret: String,
    /// Other contents
    #[serde(flatten)]
    pub remain: HashMap<String, String>,
}

impl TokenResponse {
    /// Turn the response into a token of the given kind.
    pub fn into_token(mut self, kind: TokenKind) -> Token {
        let callback_confirmed = self
            .remain
            .remove(OAUTH_CALLBACK_CONFIRMED_KEY)
            .map(|v| v == "true")
            .unwrap_or(false);
        Token {
            key: self.oauth_token,
            secret: self.oauth_token_secret,
            kind,
            callback_confirmed,
            verifier: None,
            extra: self.remain,
        }
    }
}

/// Add parse_oauth_token feature to the handshake responses.
// this trait is sealed
pub trait TokenReader: private::Sealed {
    fn parse_oauth_token(self) -> Result<TokenResponse>;
}

impl TokenReader for HttpResponse {
    fn parse_oauth_token(self) -> Result<TokenResponse> {
        if !self.is_success() {
            return Err(Error::Auth {
                message: format!("token endpoint answered {}: {}", self.status, self.body),
                status_code: Some(self.status.as_u16()),
            });
        }
        Ok(read_oauth_token(self.body)?)
    }
}

impl<E> TokenReader for std::result::Result<HttpResponse, E>
where
    E: Into<Error>,
{
    fn parse_oauth_token(self) -> Result<TokenResponse> {
        match self {
            Ok(resp) => resp.parse_oauth_token(),
            Err(err) => Err(err.into()),
        }
    }
}

fn read_oauth_token(text: String) -> TokenReaderResult<TokenResponse> {
    let mut destructured = url::form_urlencoded::parse(text.trim().as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect::<HashMap<String, String>>();
    let oauth_token = destructured.remove(OAUTH_TOKEN_KEY);
    let oauth_token_secret = destructured.remove(OAUTH_TOKEN_SECRET_KEY);
    match (oauth_token, oauth_token_secret) {
        (Some(t), Some(s)) => Ok(TokenResponse {
            oauth_token: t,
            oauth_token_secret: s,
            remain: destructured,
        }),
        (None, _) => Err(TokenReaderError::TokenKeyNotFound(OAUTH_TOKEN_KEY, text)),
        (_, _) => Err(TokenReaderError::TokenKeyNotFound(
            OAUTH_TOKEN_SECRET_KEY,
            text,
        )),
    }
}

mod private {
    use crate::{Error, HttpResponse};

    pub trait Sealed {}
    impl Sealed for HttpResponse {}
    impl<E> Sealed for std::result::Result<HttpResponse, E> where E: Into<Error> {}
}
