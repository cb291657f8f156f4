//! The HTTP seam.
//!
//! Everything the crate sends goes through a [`Transport`]. Production code
//! uses [`ReqwestTransport`]; tests substitute a recording stub.

use std::fmt;
use std::path::Path;

use http::{HeaderMap, Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::{ClientConfig, ConfigurationError, Result};

/// A fully signed request, ready to be dispatched.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    /// `application/x-www-form-urlencoded` payload.
    Form(String),
    Multipart(MultipartForm),
}

/// A multipart/form-data body. Never part of the OAuth signature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub files: Vec<(String, Attachment)>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn text<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn file<K: Into<String>>(mut self, name: K, attachment: Attachment) -> Self {
        self.files.push((name.into(), attachment));
        self
    }
}

/// A file to upload, e.g. a profile image.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new<N: Into<String>>(file_name: N, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        Attachment {
            content_type: content_type_for(&file_name).to_string(),
            file_name,
            bytes,
        }
    }

    /// Read `path` and guess its content type from the extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Attachment::new(file_name, bytes))
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "gif" => "image/gif",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

/// Status and body of a provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    pub fn new<B: Into<String>>(status: StatusCode, body: B) -> Self {
        HttpResponse {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Sends one HTTP request and waits for the answer.
pub trait Transport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        (**self).send(request)
    }
}

/// Blocking reqwest client honouring the configured proxy and user agent.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(ref user_agent) = config.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        if let Some(ref proxy) = config.proxy {
            let proxy = reqwest::Proxy::all(proxy.url().as_str())
                .map_err(|e| ConfigurationError::InvalidProxy(e.to_string()))?
                .basic_auth(&proxy.username, &proxy.password);
            builder = builder.proxy(proxy);
        }
        Ok(ReqwestTransport {
            inner: builder.build()?,
        })
    }

    /// Constructs a transport on top of an existing `reqwest::blocking::Client`.
    pub fn new_with_client(client: reqwest::blocking::Client) -> Self {
        ReqwestTransport { inner: client }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;
        let mut builder = self.inner.request(method, url).headers(headers);
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Form(body) => builder
                .header(
                    http::header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .body(body),
            RequestBody::Multipart(form) => attach_multipart(builder, form)?,
        };
        let response = builder.send()?;
        let status = response.status();
        let body = response.text()?;
        debug!(status = status.as_u16(), len = body.len(), "received response");
        Ok(HttpResponse { status, body })
    }
}

#[cfg(feature = "multipart")]
fn attach_multipart(
    builder: reqwest::blocking::RequestBuilder,
    form: MultipartForm,
) -> Result<reqwest::blocking::RequestBuilder> {
    use reqwest::blocking::multipart::{Form, Part};

    let mut multipart = Form::new();
    for (name, value) in form.fields {
        multipart = multipart.text(name, value);
    }
    for (name, attachment) in form.files {
        let part = Part::bytes(attachment.bytes)
            .file_name(attachment.file_name)
            .mime_str(&attachment.content_type)?;
        multipart = multipart.part(name, part);
    }
    Ok(builder.multipart(multipart))
}

#[cfg(not(feature = "multipart"))]
fn attach_multipart(
    _builder: reqwest::blocking::RequestBuilder,
    _form: MultipartForm,
) -> Result<reqwest::blocking::RequestBuilder> {
    Err(ConfigurationError::FeatureDisabled("multipart").into())
}
