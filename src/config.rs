use std::fmt;

use serde::Deserialize;
use url::Url;

use crate::{ConfigurationError, Credential, SignResult};

pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";
pub const DEFAULT_SEARCH_BASE: &str = "https://search.twitter.com";
pub const DEFAULT_OAUTH_BASE: &str = "https://api.twitter.com";
pub const DEFAULT_API_VERSION: u32 = 1;

/// Where the signed `oauth_*` parameters travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterPlacement {
    /// In the query string for GET/DELETE, in the form body for POST.
    QueryOrBody,
    /// In an `Authorization: OAuth ...` header.
    Header,
}

impl Default for ParameterPlacement {
    fn default() -> Self {
        ParameterPlacement::QueryOrBody
    }
}

/// Proxy to tunnel every request through.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ProxyConfig {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
}

impl ProxyConfig {
    pub fn new<U, P, H>(username: U, password: P, host: H, port: u16) -> Self
    where
        U: Into<String>,
        P: Into<String>,
        H: Into<String>,
    {
        ProxyConfig {
            username: username.into(),
            password: password.into(),
            host: host.into(),
            port,
        }
    }

    /// `http://host:port`; a host that already names its scheme keeps it.
    pub fn url(&self) -> String {
        if self.host.contains("://") {
            format!("{}:{}", self.host.trim_end_matches('/'), self.port)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

/// Everything a [`Client`](crate::Client) is constructed from.
///
/// Only the credential is required. The struct deserializes from any serde
/// format; missing fields take the defaults below.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub credential: Credential,
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Desktop applications show the user a PIN (`oauth_callback=oob`);
    /// web applications redirect back to `callback`.
    #[serde(default)]
    pub desktop: bool,
    #[serde(default)]
    pub force_login: bool,
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
    #[serde(default = "default_api_version")]
    pub api_version: u32,
    #[serde(default)]
    pub callback: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_search_base")]
    pub search_base: String,
    #[serde(default = "default_oauth_base")]
    pub oauth_base: String,
    #[serde(default)]
    pub placement: ParameterPlacement,
    #[serde(default)]
    pub realm: Option<String>,
}

fn default_api_version() -> u32 {
    DEFAULT_API_VERSION
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_search_base() -> String {
    DEFAULT_SEARCH_BASE.to_string()
}

fn default_oauth_base() -> String {
    DEFAULT_OAUTH_BASE.to_string()
}

impl ClientConfig {
    pub fn new(credential: Credential) -> Self {
        ClientConfig {
            credential,
            user_agent: None,
            desktop: false,
            force_login: false,
            proxy: None,
            api_version: DEFAULT_API_VERSION,
            callback: None,
            api_base: default_api_base(),
            search_base: default_search_base(),
            oauth_base: default_oauth_base(),
            placement: ParameterPlacement::default(),
            realm: None,
        }
    }

    pub fn user_agent<T: Into<String>>(self, user_agent: T) -> Self {
        ClientConfig {
            user_agent: Some(user_agent.into()),
            ..self
        }
    }

    pub fn desktop(self, desktop: bool) -> Self {
        ClientConfig { desktop, ..self }
    }

    /// Make the provider ask for the user's password even if a session exists.
    pub fn force_login(self, force_login: bool) -> Self {
        ClientConfig {
            force_login,
            ..self
        }
    }

    pub fn proxy(self, proxy: ProxyConfig) -> Self {
        ClientConfig {
            proxy: Some(proxy),
            ..self
        }
    }

    pub fn api_version(self, api_version: u32) -> Self {
        ClientConfig {
            api_version,
            ..self
        }
    }

    /// Callback URL announced on the request-token call in web mode.
    pub fn callback<T: Into<String>>(self, callback: T) -> Self {
        ClientConfig {
            callback: Some(callback.into()),
            ..self
        }
    }

    pub fn api_base<T: Into<String>>(self, api_base: T) -> Self {
        ClientConfig {
            api_base: api_base.into(),
            ..self
        }
    }

    pub fn search_base<T: Into<String>>(self, search_base: T) -> Self {
        ClientConfig {
            search_base: search_base.into(),
            ..self
        }
    }

    pub fn oauth_base<T: Into<String>>(self, oauth_base: T) -> Self {
        ClientConfig {
            oauth_base: oauth_base.into(),
            ..self
        }
    }

    pub fn placement(self, placement: ParameterPlacement) -> Self {
        ClientConfig { placement, ..self }
    }

    pub fn realm<T: Into<String>>(self, realm: T) -> Self {
        ClientConfig {
            realm: Some(realm.into()),
            ..self
        }
    }

    /// Check the credential and the base URLs.
    pub fn validate(&self) -> SignResult<()> {
        self.credential.validate()?;
        for base in &[&self.api_base, &self.search_base, &self.oauth_base] {
            parse_base(base)?;
        }
        Ok(())
    }

    pub(crate) fn oauth_url(&self, path: &str) -> SignResult<Url> {
        join_base(&self.oauth_base, path)
    }
}

fn parse_base(base: &str) -> SignResult<Url> {
    let url = Url::parse(base).map_err(|e| ConfigurationError::InvalidUrl(format!("{}: {}", base, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigurationError::UnsupportedScheme(other.to_string())),
    }
}

/// `base` followed by `path`, whatever slashes either side carries.
pub(crate) fn join_base(base: &str, path: &str) -> SignResult<Url> {
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    parse_base(&joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_provider() {
        let config = ClientConfig::new(Credential::new("CK", "CS"));
        assert_eq!(config.api_version, 1);
        assert!(!config.desktop);
        assert!(!config.force_login);
        assert_eq!(config.placement, ParameterPlacement::QueryOrBody);
        assert_eq!(
            config.oauth_url("oauth/request_token").unwrap().as_str(),
            "https://api.twitter.com/oauth/request_token"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ClientConfig = serde_json::from_str(
            r#"{
                "credential": {"consumer_key": "CK", "consumer_secret": "CS"},
                "desktop": true,
                "proxy": {"username": "u", "password": "p", "host": "proxy.local", "port": 87}
            }"#,
        )
        .unwrap();
        assert!(config.desktop);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.search_base, DEFAULT_SEARCH_BASE);
        assert_eq!(config.proxy.unwrap().url(), "http://proxy.local:87");
    }

    #[test]
    fn builder_overrides() {
        let config = ClientConfig::new(Credential::new("CK", "CS"))
            .desktop(true)
            .force_login(true)
            .api_version(2)
            .oauth_base("http://127.0.0.1:8080/")
            .placement(ParameterPlacement::Header);
        assert!(config.desktop && config.force_login);
        assert_eq!(config.api_version, 2);
        assert_eq!(
            config.oauth_url("/oauth/access_token").unwrap().as_str(),
            "http://127.0.0.1:8080/oauth/access_token"
        );
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let config = ClientConfig::new(Credential::new("CK", "")).api_base("ftp://example.com");
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::MissingCredential("consumer_secret"))
        );
        let config = ClientConfig::new(Credential::new("CK", "CS")).api_base("ftp://example.com");
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::UnsupportedScheme("ftp".to_string()))
        );
        let config = ClientConfig::new(Credential::new("CK", "CS")).api_base("not a url");
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidUrl(_))
        ));
    }

    #[test]
    fn proxy_keeps_explicit_scheme_and_hides_password() {
        let proxy = ProxyConfig::new("u", "hunter2", "https://proxy.local/", 3128);
        assert_eq!(proxy.url(), "https://proxy.local:3128");
        assert!(!format!("{:?}", proxy).contains("hunter2"));
    }
}
