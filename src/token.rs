use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which leg of the handshake a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Temporary credential, only good for obtaining the user's approval.
    Request,
    /// Durable credential used to sign resource requests.
    Access,
}

/// An OAuth token obtained from the provider.
///
/// A `Request` token is handed to the caller by
/// [`Client::fetch_for_authorize`](crate::Client::fetch_for_authorize); the
/// caller records the verifier the user received with [`Token::set_verifier`]
/// and redeems it with
/// [`Client::fetch_access_token`](crate::Client::fetch_access_token).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub key: String,
    pub secret: String,
    pub kind: TokenKind,
    #[serde(default)]
    pub callback_confirmed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifier: Option<String>,
    /// Extra pairs of the token response, e.g. `user_id` and `screen_name`.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, String>,
}

impl Token {
    pub fn new<TKey, TSecret>(key: TKey, secret: TSecret, kind: TokenKind) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        Token {
            key: key.into(),
            secret: secret.into(),
            kind,
            callback_confirmed: false,
            verifier: None,
            extra: HashMap::new(),
        }
    }

    pub fn request<TKey, TSecret>(key: TKey, secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        Token::new(key, secret, TokenKind::Request)
    }

    pub fn access<TKey, TSecret>(key: TKey, secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        Token::new(key, secret, TokenKind::Access)
    }

    /// Record the verifier (PIN or callback `oauth_verifier`) the user received.
    pub fn set_verifier<T: Into<String>>(&mut self, verifier: T) {
        self.verifier = Some(verifier.into());
    }

    pub fn is_access(&self) -> bool {
        self.kind == TokenKind::Access
    }

    /// The screen name the provider reported alongside an access token.
    pub fn screen_name(&self) -> Option<&str> {
        self.extra.get("screen_name").map(String::as_str)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.extra.get("user_id").map(String::as_str)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("key", &self.key)
            .field("secret", &"[REDACTED]")
            .field("kind", &self.kind)
            .field("callback_confirmed", &self.callback_confirmed)
            .field("verifier", &self.verifier.as_ref().map(|_| "[REDACTED]"))
            .field("extra", &self.extra)
            .finish()
    }
}
