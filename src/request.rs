// ----------------------------------------------------------------------------
// This source code contains derived artifacts from seanmonstar's `reqwest`.
// for further information(including license information),
// please visit their repository: https://github.com/seanmonstar/reqwest .
// ----------------------------------------------------------------------------
use std::convert::TryFrom;

use http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use http::Method;
use reqwest::IntoUrl;
use serde::Serialize;
use url::Url;

use crate::signer::encode_pairs;
use crate::{
    ConfigurationError, HttpRequest, MultipartForm, OAuthParameters, ParameterPlacement,
    RequestBody, Result, SecretsProvider, Signer, OAUTH_CALLBACK_KEY, OAUTH_VERIFIER_KEY,
};

/// Collects the parameters of one request and turns them into a signed
/// [`HttpRequest`].
pub struct RequestBuilder<'a, TSecretsProvider>
where
    TSecretsProvider: SecretsProvider,
{
    method: Method,
    url: Option<Url>,
    query: Vec<(String, String)>,
    form: Vec<(String, String)>,
    headers: HeaderMap,
    multipart: Option<MultipartForm>,
    placement: ParameterPlacement,
    signer: Signer<'a, TSecretsProvider>,
    error: Option<ConfigurationError>,
}

impl<'a, TSecretsProvider> RequestBuilder<'a, TSecretsProvider>
where
    TSecretsProvider: SecretsProvider,
{
    pub fn new<U: IntoUrl>(
        method: Method,
        url: U,
        secrets: &'a TSecretsProvider,
        params: OAuthParameters<'a>,
    ) -> Self {
        let (url, error) = match url.into_url() {
            Ok(url) => (Some(url), None),
            Err(e) => (None, Some(ConfigurationError::InvalidUrl(e.to_string()))),
        };
        RequestBuilder {
            method,
            url,
            query: Vec::new(),
            form: Vec::new(),
            headers: HeaderMap::new(),
            multipart: None,
            placement: ParameterPlacement::default(),
            signer: Signer::new(secrets, params),
            error,
        }
    }

    /// Choose where the `oauth_*` parameters go.
    pub fn placement(mut self, placement: ParameterPlacement) -> Self {
        self.placement = placement;
        self
    }

    /// Modify the query string of the URL.
    ///
    /// Modifies the URL of this request, adding the parameters provided.
    /// This method appends and does not overwrite. This means that it can
    /// be called multiple times and that existing query parameters are not
    /// overwritten if the same key is used. The key will simply show up
    /// twice in the query string.
    /// Calling `.query(&[("foo", "a"), ("foo", "b")])` gives `"foo=a&foo=b"`.
    ///
    /// # Note
    /// This method does not support serializing a single key-value
    /// pair. Instead of using `.query(("key", "val"))`, use a sequence, such
    /// as `.query(&[("key", "val")])`. It's also possible to serialize structs
    /// and maps into a key-value pair.
    pub fn query<T: Serialize + ?Sized>(mut self, query: &T) -> Self {
        match serialize_pairs(query) {
            Ok(pairs) => self.query.extend(pairs),
            Err(e) => self.error = Some(e),
        }
        self
    }

    /// Send a form body. Form parameters are part of the signature.
    pub fn form<T: Serialize + ?Sized>(mut self, form: &T) -> Self {
        match serialize_pairs(form) {
            Ok(pairs) => self.form.extend(pairs),
            Err(e) => self.error = Some(e),
        }
        self
    }

    /// Sends a multipart/form-data body.
    ///
    /// Note: multipart/form-data is not handled by the OAuth signer; only the
    /// query parameters are signed.
    pub fn multipart(mut self, multipart: MultipartForm) -> Self {
        self.multipart = Some(multipart);
        self
    }

    /// Add a `Header` to this Request.
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: std::fmt::Display,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: std::fmt::Display,
    {
        let name = HeaderName::try_from(key).map_err(|e| e.to_string());
        let value = HeaderValue::try_from(value).map_err(|e| e.to_string());
        match (name, value) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            (Err(e), _) | (_, Err(e)) => {
                self.error = Some(ConfigurationError::InvalidParameters(e));
            }
        }
        self
    }

    /// Sign the collected parameters and assemble the request.
    ///
    /// # Errors
    ///
    /// Fails if the URL could not be parsed, a parameter could not be
    /// serialized, or the signer rejected its input.
    pub fn build(self) -> Result<HttpRequest> {
        if let Some(e) = self.error {
            return Err(e.into());
        }
        let mut url = match self.url {
            Some(url) => url,
            None => return Err(ConfigurationError::InvalidUrl(String::new()).into()),
        };

        let mut query = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect::<Vec<_>>();
        query.extend(self.query);
        url.set_query(None);
        url.set_fragment(None);

        let signed_params = query
            .iter()
            .chain(self.form.iter())
            .cloned()
            .collect::<Vec<_>>();
        let signature = self.signer.sign(&self.method, &url, &signed_params)?;

        // the signer moved these into the oauth set
        let plain = |(key, _): &(String, String)| {
            key != OAUTH_CALLBACK_KEY && key != OAUTH_VERIFIER_KEY
        };
        query.retain(plain);
        let mut form = self.form;
        form.retain(plain);

        let mut headers = self.headers;
        let has_form_body = self.multipart.is_none()
            && (!form.is_empty() || carries_body(&self.method));
        match self.placement {
            ParameterPlacement::Header => {
                let value = HeaderValue::try_from(signature.authorization_header())
                    .map_err(|e| ConfigurationError::InvalidParameters(e.to_string()))?;
                headers.insert(AUTHORIZATION, value);
            }
            ParameterPlacement::QueryOrBody if has_form_body => {
                form.extend(signature.oauth_parameters().iter().cloned());
            }
            ParameterPlacement::QueryOrBody => {
                query.extend(signature.oauth_parameters().iter().cloned());
            }
        }

        if !query.is_empty() {
            url.set_query(Some(&encode_pairs(&query)));
        }
        let body = match self.multipart {
            Some(multipart) => RequestBody::Multipart(multipart),
            None if has_form_body => RequestBody::Form(encode_pairs(&form)),
            None => RequestBody::Empty,
        };

        Ok(HttpRequest {
            method: self.method,
            url,
            headers,
            body,
        })
    }
}

fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

fn serialize_pairs<T: Serialize + ?Sized>(value: &T) -> std::result::Result<Vec<(String, String)>, ConfigurationError> {
    let encoded = serde_urlencoded::to_string(value)
        .map_err(|e| ConfigurationError::InvalidParameters(e.to_string()))?;
    Ok(url::form_urlencoded::parse(encoded.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect())
}
