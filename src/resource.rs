use http::Method;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::{
    ClientConfig, Credential, Error, HttpResponse, MultipartForm, OAuthParameters,
    ParameterPlacement, RequestBuilder, Result, Secrets, Token, Transport,
};

/// Signs requests with the consumer credential (and a token, when given)
/// and hands them to the transport.
pub struct ResourceClient<T> {
    credential: Credential,
    placement: ParameterPlacement,
    realm: Option<String>,
    transport: T,
}

impl<T: Transport> ResourceClient<T> {
    pub fn new(config: &ClientConfig, transport: T) -> Self {
        ResourceClient {
            credential: config.credential.clone(),
            placement: config.placement,
            realm: config.realm.clone(),
            transport,
        }
    }

    /// Sign and send, returning whatever the provider answered.
    pub fn send_signed<P>(
        &self,
        method: Method,
        url: Url,
        params: &P,
        token: Option<&Token>,
        oauth: OAuthParameters<'_>,
    ) -> Result<HttpResponse>
    where
        P: Serialize + ?Sized,
    {
        self.send(method, url, params, token, oauth, None)
    }

    /// Sign and send a request; non-2xx answers become [`Error::Request`].
    ///
    /// Parameters travel in the query string for GET and DELETE and in the
    /// form body otherwise.
    pub fn fetch<P>(
        &self,
        method: Method,
        url: Url,
        params: &P,
        token: Option<&Token>,
    ) -> Result<HttpResponse>
    where
        P: Serialize + ?Sized,
    {
        let response = self.send(method, url, params, token, self.oauth_parameters(), None)?;
        check_status(response)
    }

    /// Like [`fetch`](Self::fetch) but with a multipart body. The parameters
    /// go in the query string, the only part that is signed.
    pub fn fetch_multipart<P>(
        &self,
        url: Url,
        params: &P,
        form: MultipartForm,
        token: Option<&Token>,
    ) -> Result<HttpResponse>
    where
        P: Serialize + ?Sized,
    {
        let response = self.send(
            Method::POST,
            url,
            params,
            token,
            self.oauth_parameters(),
            Some(form),
        )?;
        check_status(response)
    }

    fn oauth_parameters(&self) -> OAuthParameters<'_> {
        match &self.realm {
            Some(realm) => OAuthParameters::new().realm(realm.as_str()),
            None => OAuthParameters::new(),
        }
    }

    fn send<P>(
        &self,
        method: Method,
        url: Url,
        params: &P,
        token: Option<&Token>,
        oauth: OAuthParameters<'_>,
        multipart: Option<MultipartForm>,
    ) -> Result<HttpResponse>
    where
        P: Serialize + ?Sized,
    {
        let secrets = Secrets::new(&self.credential, token);
        debug!(
            method = %method,
            url = %url,
            signed_with_token = token.is_some(),
            "dispatching signed request"
        );

        let builder = RequestBuilder::new(method.clone(), url, &secrets, oauth)
            .placement(self.placement);
        let builder = match multipart {
            Some(form) => builder.query(params).multipart(form),
            None if method == Method::GET || method == Method::DELETE => builder.query(params),
            None => builder.form(params),
        };
        let request = builder.build()?;
        self.transport.send(request)
    }
}

fn check_status(response: HttpResponse) -> Result<HttpResponse> {
    if response.is_success() {
        return Ok(response);
    }
    let status_code = response.status.as_u16();
    warn!(status = status_code, "provider rejected request");
    Err(Error::Request {
        message: response.body,
        status_code,
    })
}
