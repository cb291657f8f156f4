//! The three-legged handshake.
//!
//! ```text
//! Unauthenticated --fetch_for_authorize--> HasRequestToken
//! HasRequestToken --fetch_access_token---> HasAccessToken
//! any state       --fetch_for_authorize--> HasRequestToken
//! ```
//!
//! A failed step leaves the state untouched.

use http::Method;
use tracing::{debug, info};
use url::Url;

use crate::{
    ClientConfig, Error, OAuthParameters, ResourceClient, Result, SignResult, Token, TokenKind,
    TokenReader, Transport,
};

const REQUEST_TOKEN_PATH: &str = "oauth/request_token";
const ACCESS_TOKEN_PATH: &str = "oauth/access_token";
const AUTHORIZE_PATH: &str = "oauth/authorize";
const AUTHENTICATE_PATH: &str = "oauth/authenticate";

/// Out-of-band callback: the provider shows the user a PIN instead of
/// redirecting.
pub const OUT_OF_BAND: &str = "oob";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationState {
    Unauthenticated,
    HasRequestToken,
    HasAccessToken,
}

#[derive(Debug, Clone)]
pub struct AuthorizationFlow {
    token: Option<Token>,
    desktop: bool,
    force_login: bool,
    callback: Option<String>,
    request_token_url: Url,
    access_token_url: Url,
    authorize_url: Url,
    authenticate_url: Url,
}

impl AuthorizationFlow {
    pub fn new(config: &ClientConfig) -> SignResult<Self> {
        Ok(AuthorizationFlow {
            token: None,
            desktop: config.desktop,
            force_login: config.force_login,
            callback: config.callback.clone(),
            request_token_url: config.oauth_url(REQUEST_TOKEN_PATH)?,
            access_token_url: config.oauth_url(ACCESS_TOKEN_PATH)?,
            authorize_url: config.oauth_url(AUTHORIZE_PATH)?,
            authenticate_url: config.oauth_url(AUTHENTICATE_PATH)?,
        })
    }

    pub fn state(&self) -> AuthorizationState {
        match self.token {
            None => AuthorizationState::Unauthenticated,
            Some(ref token) if token.is_access() => AuthorizationState::HasAccessToken,
            Some(_) => AuthorizationState::HasRequestToken,
        }
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// The held token, if it is an access token.
    pub fn access_token(&self) -> Option<&Token> {
        self.token.as_ref().filter(|token| token.is_access())
    }

    /// Adopt a previously obtained token, e.g. one loaded from a store or
    /// a request token handed back by a web callback.
    pub fn restore(&mut self, token: Token) {
        debug!(kind = ?token.kind, "restored token");
        self.token = Some(token);
    }

    /// Forget the held token.
    pub fn reset(&mut self) {
        self.token = None;
    }

    /// Obtain a request token and the URL the user must visit to approve it.
    ///
    /// Any token held before is discarded once the provider answered.
    pub fn fetch_for_authorize<T: Transport>(
        &mut self,
        resources: &ResourceClient<T>,
    ) -> Result<(String, Token)> {
        let callback = if self.desktop {
            Some(OUT_OF_BAND)
        } else {
            self.callback.as_deref()
        };
        let oauth = match callback {
            Some(callback) => OAuthParameters::new().callback(callback),
            None => OAuthParameters::new(),
        };

        let token = resources
            .send_signed(
                Method::POST,
                self.request_token_url.clone(),
                &[] as &[(&str, &str)],
                None,
                oauth,
            )
            .parse_oauth_token()?
            .into_token(TokenKind::Request);

        let url = self.authorization_url(&token);
        info!(callback_confirmed = token.callback_confirmed, "obtained request token");
        self.token = Some(token.clone());
        Ok((url, token))
    }

    /// The page where the user approves `token`.
    ///
    /// Desktop applications use the PIN-based authorize page; web
    /// applications the sign-in page which redirects back immediately for
    /// users that approved the application before.
    pub fn authorization_url(&self, token: &Token) -> String {
        let mut url = if self.desktop {
            self.authorize_url.clone()
        } else {
            self.authenticate_url.clone()
        };
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("oauth_token", &token.key);
            if self.desktop {
                query.append_pair("oauth_callback", OUT_OF_BAND);
            }
            if self.force_login {
                query.append_pair("force_login", "true");
            }
        }
        url.into()
    }

    /// Exchange the approved request token for an access token.
    ///
    /// `token` must be the request token this flow holds, carrying the
    /// verifier the user obtained.
    pub fn fetch_access_token<T: Transport>(
        &mut self,
        resources: &ResourceClient<T>,
        token: &Token,
    ) -> Result<Token> {
        let pending = match self.token {
            Some(ref pending) if pending.kind == TokenKind::Request => pending,
            _ => {
                return Err(Error::auth(
                    "fetch_access_token() requires a request token, call fetch_for_authorize() first",
                ))
            }
        };
        if token.kind != TokenKind::Request {
            return Err(Error::auth("fetch_access_token() expects a request token"));
        }
        if token.key != pending.key {
            return Err(Error::auth(
                "token does not match the pending request token",
            ));
        }
        let verifier = match token.verifier.as_deref() {
            Some(verifier) if !verifier.is_empty() => verifier,
            _ => return Err(Error::auth("fetch_access_token() requires a verifier")),
        };

        let access = resources
            .send_signed(
                Method::POST,
                self.access_token_url.clone(),
                &[] as &[(&str, &str)],
                Some(token),
                OAuthParameters::new().verifier(verifier),
            )
            .parse_oauth_token()?
            .into_token(TokenKind::Access);

        info!(
            screen_name = access.screen_name().unwrap_or_default(),
            "obtained access token"
        );
        self.token = Some(access.clone());
        Ok(access)
    }
}
