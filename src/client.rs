use http::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::{
    Attachment, AuthorizationFlow, AuthorizationState, ClientConfig, ConfigurationError,
    Endpoint, Error, HttpResponse, MemoryTokenStore, MultipartForm, Params, ResourceClient,
    ReqwestTransport, Result, Token, TokenKind, TokenStore, Transport,
};

/// An OAuth 1.0a client for the Twitter REST API.
///
/// Owns the handshake state, the token store and the transport. Calls to
/// endpoints that need an access token fail with [`Error::Auth`] before
/// anything is sent while the client is not authorized.
pub struct Client<T = ReqwestTransport, S = MemoryTokenStore> {
    config: ClientConfig,
    resources: ResourceClient<T>,
    flow: AuthorizationFlow,
    store: S,
}

impl Client {
    /// Constructs a new `Client` with a reqwest transport and an in-memory
    /// token store.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Client::with_store(config, MemoryTokenStore::new())
    }
}

impl<S: TokenStore> Client<ReqwestTransport, S> {
    /// Constructs a new `Client` that resumes from, and saves to, `store`.
    pub fn with_store(config: ClientConfig, store: S) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Client::with_transport(config, transport, store)
    }
}

impl<T: Transport, S: TokenStore> Client<T, S> {
    /// Constructs a new `Client` on top of any [`Transport`].
    ///
    /// An access token found in `store` makes the client authorized right
    /// away.
    pub fn with_transport(config: ClientConfig, transport: T, store: S) -> Result<Self> {
        config.validate()?;
        let mut flow = AuthorizationFlow::new(&config)?;
        match store.lookup()? {
            Some(token) if token.is_access() => flow.restore(token),
            Some(_) => debug!("ignoring stored token that is not an access token"),
            None => {}
        }
        Ok(Client {
            resources: ResourceClient::new(&config, transport),
            config,
            flow,
            store,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> AuthorizationState {
        self.flow.state()
    }

    /// Whether an access token is held.
    pub fn is_authorized(&self) -> bool {
        self.state() == AuthorizationState::HasAccessToken
    }

    pub fn token(&self) -> Option<&Token> {
        self.flow.token()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Start (or restart) the handshake.
    ///
    /// Returns the URL the user has to visit and the request token to
    /// hand back to [`fetch_access_token`](Self::fetch_access_token) once
    /// the user's verifier is set on it. A held access token is discarded
    /// and removed from the store.
    pub fn fetch_for_authorize(&mut self) -> Result<(String, Token)> {
        let previous = self.flow.token().cloned();
        let result = self.flow.fetch_for_authorize(&self.resources)?;
        if previous.as_ref().map_or(false, Token::is_access) {
            if let Err(e) = self.store.delete() {
                self.rollback(previous);
                return Err(e);
            }
        }
        Ok(result)
    }

    /// Adopt a request token obtained earlier, e.g. by another process
    /// serving the web callback.
    pub fn resume_authorization(&mut self, token: Token) -> Result<()> {
        if token.kind != TokenKind::Request {
            return Err(Error::auth(
                "resume_authorization() expects a request token",
            ));
        }
        self.flow.restore(token);
        Ok(())
    }

    /// Exchange the verified request token for an access token and save it.
    ///
    /// A failing store leaves the client holding the request token.
    pub fn fetch_access_token(&mut self, token: &Token) -> Result<Token> {
        let previous = self.flow.token().cloned();
        let access = self.flow.fetch_access_token(&self.resources, token)?;
        if let Err(e) = self.store.save(&access) {
            self.rollback(previous);
            return Err(e);
        }
        Ok(access)
    }

    /// Forget the held token, also in the store.
    pub fn sign_out(&mut self) -> Result<()> {
        self.flow.reset();
        self.store.delete()
    }

    /// Send a signed request to an arbitrary resource URL.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Auth`] without sending anything unless an access
    /// token is held.
    pub fn fetch<P>(&self, method: Method, url: &str, params: &P) -> Result<HttpResponse>
    where
        P: Serialize + ?Sized,
    {
        let token = self.require_access_token("fetch")?;
        let url = Url::parse(url).map_err(|e| ConfigurationError::InvalidUrl(e.to_string()))?;
        self.resources.fetch(method, url, params, Some(token))
    }

    /// Call a catalogued endpoint and return its JSON answer.
    pub fn call(&self, endpoint: &Endpoint, params: Params) -> Result<serde_json::Value> {
        self.call_as(endpoint, params)
    }

    /// Call a catalogued endpoint and deserialize its answer into `D`.
    pub fn call_as<D: DeserializeOwned>(&self, endpoint: &Endpoint, params: Params) -> Result<D> {
        if let Some(field) = endpoint.upload {
            return Err(ConfigurationError::MissingParameter {
                endpoint: endpoint.name(),
                parameter: field.to_string(),
            }
            .into());
        }
        self.dispatch(endpoint, params, None)?.json()
    }

    /// Call an upload endpoint with `attachment` as its file.
    pub fn upload(
        &self,
        endpoint: &Endpoint,
        params: Params,
        attachment: Attachment,
    ) -> Result<serde_json::Value> {
        self.dispatch(endpoint, params, Some(attachment))?.json()
    }

    fn dispatch(
        &self,
        endpoint: &Endpoint,
        mut params: Params,
        attachment: Option<Attachment>,
    ) -> Result<HttpResponse> {
        let token = self.flow.access_token();
        if endpoint.requires_auth && token.is_none() {
            return Err(Error::auth(format!(
                "{}() requires authorization",
                endpoint.name()
            )));
        }
        endpoint.validate(&params)?;
        let url = endpoint.url(
            &self.config,
            &mut params,
            token.and_then(Token::screen_name),
        )?;
        debug!(endpoint = endpoint.name(), "calling endpoint");

        match (endpoint.upload, attachment) {
            (Some(field), Some(attachment)) => {
                let form = MultipartForm::new().file(field, attachment);
                self.resources.fetch_multipart(url, &params, form, token)
            }
            (None, Some(_)) => Err(ConfigurationError::InvalidParameters(format!(
                "{} does not take a file",
                endpoint.name()
            ))
            .into()),
            _ => self.resources.fetch(endpoint.method(), url, &params, token),
        }
    }

    fn rollback(&mut self, previous: Option<Token>) {
        warn!("token store failed, keeping the previous authorization state");
        match previous {
            Some(token) => self.flow.restore(token),
            None => self.flow.reset(),
        }
    }

    fn require_access_token(&self, operation: &str) -> Result<&Token> {
        self.flow
            .access_token()
            .ok_or_else(|| Error::auth(format!("{}() requires authorization", operation)))
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use serde::Deserialize;

    use super::*;
    use crate::endpoints::{
        HOME_TIMELINE, PUBLIC_TIMELINE, SEARCH, STATUS_UPDATE, UPDATE_PROFILE_COLORS,
        UPDATE_PROFILE_IMAGE, VERIFY_CREDENTIALS,
    };
    use crate::testing::StubTransport;
    use crate::{Credential, FileTokenStore, RequestBody};

    fn config() -> ClientConfig {
        ClientConfig::new(Credential::new("CK", "CS")).desktop(true)
    }

    fn authorized(transport: &StubTransport) -> Client<&StubTransport> {
        let mut access = Token::access("T2", "S2");
        access.extra.insert("screen_name".into(), "alice".into());
        Client::with_transport(config(), transport, MemoryTokenStore::with_token(access)).unwrap()
    }

    #[test]
    fn end_to_end_desktop_flow() {
        let transport = StubTransport::new()
            .respond(
                StatusCode::OK,
                "oauth_token=T1&oauth_token_secret=S1&oauth_callback_confirmed=true",
            )
            .respond(
                StatusCode::OK,
                "oauth_token=T2&oauth_token_secret=S2&screen_name=alice",
            )
            .respond(StatusCode::OK, r#"{"screen_name":"alice"}"#);
        let mut client =
            Client::with_transport(config(), &transport, MemoryTokenStore::new()).unwrap();
        assert_eq!(client.state(), AuthorizationState::Unauthenticated);

        let (url, mut token) = client.fetch_for_authorize().unwrap();
        assert!(url.contains("oauth_token=T1"));
        assert!(url.contains("oauth_callback=oob"));
        assert_eq!(client.state(), AuthorizationState::HasRequestToken);

        token.set_verifier("0000");
        let access = client.fetch_access_token(&token).unwrap();
        assert_eq!(access.key, "T2");
        assert!(client.is_authorized());
        assert_eq!(client.store().lookup().unwrap().unwrap().key, "T2");

        let me = client.call(&VERIFY_CREDENTIALS, Params::new()).unwrap();
        assert_eq!(me["screen_name"], "alice");
        let query = transport.last_request().url.query().unwrap().to_string();
        assert!(query.contains("oauth_token=T2"));
        assert_eq!(transport.requests().len(), 3);
    }

    #[test]
    fn protected_calls_are_refused_before_sending() {
        let transport = StubTransport::new();
        let client = Client::with_transport(config(), &transport, MemoryTokenStore::new()).unwrap();

        match client.call(&HOME_TIMELINE, Params::new()) {
            Err(Error::Auth { message, .. }) => {
                assert!(message.contains("statuses/home_timeline"))
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            client.fetch(Method::GET, "https://api.twitter.com/1/help/test.json", &Params::new()),
            Err(Error::Auth { .. })
        ));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn missing_parameters_are_refused_before_sending() {
        let transport = StubTransport::new();
        let client = authorized(&transport);
        assert!(matches!(
            client.call(&STATUS_UPDATE, Params::new()),
            Err(Error::Configuration(ConfigurationError::MissingParameter { .. }))
        ));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn malformed_colours_are_refused_before_sending() {
        let transport = StubTransport::new();
        let client = authorized(&transport);
        assert!(matches!(
            client.call(
                &UPDATE_PROFILE_COLORS,
                Params::new().set("profile_link_color", "blue")
            ),
            Err(Error::Configuration(ConfigurationError::InvalidParameters(_)))
        ));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn rejection_is_propagated() {
        let transport = StubTransport::new().respond(
            StatusCode::FORBIDDEN,
            r#"{"error":"Status is a duplicate."}"#,
        );
        let client = authorized(&transport);
        let err = client
            .call(&STATUS_UPDATE, Params::new().set("status", "hello"))
            .unwrap_err();
        assert_eq!(err.status_code(), Some(403));
        assert!(!err.is_retryable());
        assert!(client.is_authorized());
    }

    #[test]
    fn stored_token_authorizes_at_construction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        FileTokenStore::new(&path)
            .save(&Token::access("T2", "S2"))
            .unwrap();

        let transport = StubTransport::new();
        let mut client =
            Client::with_transport(config(), &transport, FileTokenStore::new(&path)).unwrap();
        assert!(client.is_authorized());

        client.sign_out().unwrap();
        assert_eq!(client.state(), AuthorizationState::Unauthenticated);
        assert!(!path.exists());
    }

    #[test]
    fn stored_request_token_is_ignored() {
        let transport = StubTransport::new();
        let client = Client::with_transport(
            config(),
            &transport,
            MemoryTokenStore::with_token(Token::request("T1", "S1")),
        )
        .unwrap();
        assert_eq!(client.state(), AuthorizationState::Unauthenticated);
    }

    #[test]
    fn reauthorizing_forgets_the_stored_access_token() {
        let transport = StubTransport::new()
            .respond(StatusCode::OK, "oauth_token=T3&oauth_token_secret=S3");
        let mut client = authorized(&transport);
        client.fetch_for_authorize().unwrap();
        assert_eq!(client.state(), AuthorizationState::HasRequestToken);
        assert!(client.store().lookup().unwrap().is_none());
        assert!(matches!(
            client.call(&HOME_TIMELINE, Params::new()),
            Err(Error::Auth { .. })
        ));
    }

    #[test]
    fn web_flow_resumes_in_another_client() {
        let transport = StubTransport::new()
            .respond(StatusCode::OK, "oauth_token=T2&oauth_token_secret=S2");
        let config = ClientConfig::new(Credential::new("CK", "CS")).callback("https://example.com/cb");
        let mut client =
            Client::with_transport(config, &transport, MemoryTokenStore::new()).unwrap();

        assert!(client
            .resume_authorization(Token::access("T2", "S2"))
            .is_err());

        let mut token = Token::request("T1", "S1");
        client.resume_authorization(token.clone()).unwrap();
        token.set_verifier("verifier");
        client.fetch_access_token(&token).unwrap();
        assert!(client.is_authorized());
    }

    #[test]
    fn unauthenticated_endpoints_work_without_token() {
        let transport = StubTransport::new()
            .respond(StatusCode::OK, "[]")
            .respond(StatusCode::OK, r#"{"results":[]}"#);
        let client = Client::with_transport(config(), &transport, MemoryTokenStore::new()).unwrap();

        client.call(&PUBLIC_TIMELINE, Params::new()).unwrap();
        let request = transport.last_request();
        assert_eq!(request.method, Method::GET);
        assert!(!request.url.query().unwrap().contains("oauth_token="));

        client
            .call(&SEARCH, Params::new().set("q", "rust"))
            .unwrap();
        let request = transport.last_request();
        assert_eq!(request.url.host_str(), Some("search.twitter.com"));
        assert!(request.url.query().unwrap().contains("q=rust"));
    }

    #[test]
    fn typed_answers() {
        #[derive(Deserialize)]
        struct User {
            id: u64,
            screen_name: String,
        }

        let transport = StubTransport::new()
            .respond(StatusCode::OK, r#"{"id":7,"screen_name":"alice","extra":1}"#);
        let client = authorized(&transport);
        let user: User = client.call_as(&VERIFY_CREDENTIALS, Params::new()).unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.screen_name, "alice");
    }

    #[test]
    fn upload_sends_multipart_and_signs_query() {
        let transport = StubTransport::new().respond(StatusCode::OK, "{}");
        let client = authorized(&transport);

        assert!(matches!(
            client.call(&UPDATE_PROFILE_IMAGE, Params::new()),
            Err(Error::Configuration(ConfigurationError::MissingParameter { .. }))
        ));

        let attachment = Attachment::new("me.png", vec![0x89, b'P', b'N', b'G']);
        client
            .upload(&UPDATE_PROFILE_IMAGE, Params::new(), attachment)
            .unwrap();
        let request = transport.last_request();
        assert_eq!(request.method, Method::POST);
        assert!(request.url.query().unwrap().contains("oauth_signature="));
        match request.body {
            RequestBody::Multipart(form) => {
                assert_eq!(form.files.len(), 1);
                assert_eq!(form.files[0].0, "image");
                assert_eq!(form.files[0].1.content_type, "image/png");
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn raw_fetch_uses_the_access_token() {
        let transport = StubTransport::new().respond(StatusCode::OK, "ok");
        let client = authorized(&transport);
        let response = client
            .fetch(
                Method::GET,
                "https://api.twitter.com/1/help/test.json",
                &[("a", "1")],
            )
            .unwrap();
        assert_eq!(response.text(), "ok");
        assert!(transport
            .last_request()
            .url
            .query()
            .unwrap()
            .contains("oauth_token=T2"));
    }

    struct FailingStore {
        stored: Option<Token>,
    }

    impl TokenStore for FailingStore {
        fn save(&self, _token: &Token) -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into())
        }

        fn lookup(&self) -> Result<Option<Token>> {
            Ok(self.stored.clone())
        }

        fn delete(&self) -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }
    }

    #[test]
    fn failed_save_keeps_the_request_token() {
        let transport = StubTransport::new()
            .respond(StatusCode::OK, "oauth_token=T1&oauth_token_secret=S1")
            .respond(StatusCode::OK, "oauth_token=T2&oauth_token_secret=S2");
        let mut client =
            Client::with_transport(config(), &transport, FailingStore { stored: None }).unwrap();

        let (_, mut token) = client.fetch_for_authorize().unwrap();
        token.set_verifier("0000");
        assert!(matches!(
            client.fetch_access_token(&token),
            Err(Error::Io(_))
        ));
        assert_eq!(client.state(), AuthorizationState::HasRequestToken);
        assert_eq!(client.token().unwrap().key, "T1");
        assert!(matches!(
            client.call(&VERIFY_CREDENTIALS, Params::new()),
            Err(Error::Auth { .. })
        ));
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn failed_delete_keeps_the_access_token() {
        let transport = StubTransport::new()
            .respond(StatusCode::OK, "oauth_token=T3&oauth_token_secret=S3");
        let stored = Token::access("T2", "S2");
        let mut client = Client::with_transport(
            config(),
            &transport,
            FailingStore {
                stored: Some(stored),
            },
        )
        .unwrap();
        assert!(client.is_authorized());

        assert!(matches!(client.fetch_for_authorize(), Err(Error::Io(_))));
        assert!(client.is_authorized());
        assert_eq!(client.token().unwrap().key, "T2");
    }
}
