use std::borrow::Cow;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use http::Method;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;
use url::{Position, Url};

use crate::{
    ConfigurationError, SecretsProvider, SignResult, OAUTH_CALLBACK_KEY, OAUTH_CONSUMER_KEY,
    OAUTH_KEY_PREFIX, OAUTH_NONCE_KEY, OAUTH_SIGNATURE_KEY, OAUTH_SIGNATURE_METHOD_KEY,
    OAUTH_TIMESTAMP_KEY, OAUTH_TOKEN_KEY, OAUTH_VERIFIER_KEY, OAUTH_VERSION_KEY, REALM_KEY,
};

/// The only supported `oauth_signature_method`.
pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";
const NONCE_LENGTH: usize = 32;

// RFC 3986 unreserved characters stay as they are, everything else is escaped.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a key or value the way OAuth 1.0a requires.
pub fn percent_encode(src: &str) -> String {
    utf8_percent_encode(src, OAUTH_ENCODE_SET).to_string()
}

/// Encode every pair, sort by key then value and join them with `&`.
pub fn normalize_parameters<K, V>(params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut encoded = params
        .iter()
        .map(|(k, v)| (percent_encode(k.as_ref()), percent_encode(v.as_ref())))
        .collect::<Vec<_>>();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Scheme, authority and path of `url`; query and fragment are dropped.
///
/// `url` already lowercases scheme and host and elides default ports.
pub fn normalize_url(url: &Url) -> String {
    url[..Position::AfterPath].to_string()
}

pub fn signature_base_string(method: &Method, normalized_url: &str, normalized_params: &str) -> String {
    format!(
        "{}&{}&{}",
        method.as_str().to_ascii_uppercase(),
        percent_encode(normalized_url),
        percent_encode(normalized_params)
    )
}

pub fn signing_key(consumer_secret: &str, token_secret: Option<&str>) -> String {
    format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret.unwrap_or_default())
    )
}

fn hmac_sha1_base64(key: &str, base_string: &str) -> String {
    type HmacSha1 = Hmac<Sha1>;
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(base_string.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// A fresh random `oauth_nonce`.
pub fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}

/// Current Unix time in seconds, the `oauth_timestamp` of a fresh request.
pub fn timestamp_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Computes HMAC-SHA1 signatures for one set of secrets.
///
/// The signer holds no mutable state; sharing one across threads is fine.
#[derive(Debug, Clone)]
pub struct Signer<'a, TSecretsProvider>
where
    TSecretsProvider: SecretsProvider,
{
    secrets: &'a TSecretsProvider,
    parameters: OAuthParameters<'a>,
}

impl<'a, TSecretsProvider> Signer<'a, TSecretsProvider>
where
    TSecretsProvider: SecretsProvider,
{
    pub fn new(secrets: &'a TSecretsProvider, parameters: OAuthParameters<'a>) -> Self {
        Signer {
            secrets,
            parameters,
        }
    }

    /// Sign a request.
    ///
    /// `params` are the request's own query or form parameters; pairs already
    /// present in the query of `url` are signed as well. Caller-supplied
    /// `oauth_callback`/`oauth_verifier` are honoured, any other `oauth_*`
    /// key is rejected.
    ///
    /// # Errors
    ///
    /// Fails when the consumer credential is empty or `url` is not http(s).
    pub fn sign<K, V>(&self, method: &Method, url: &Url, params: &[(K, V)]) -> SignResult<Signature>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let (consumer_key, consumer_secret) = self.secrets.get_consumer_key_pair();
        if consumer_key.is_empty() {
            return Err(ConfigurationError::MissingCredential("consumer_key"));
        }
        if consumer_secret.is_empty() {
            return Err(ConfigurationError::MissingCredential("consumer_secret"));
        }
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(ConfigurationError::UnsupportedScheme(other.to_string())),
        }
        let (token, token_secret) = self.secrets.get_token_option_pair();

        // split caller parameters into plain ones and recognised oauth_* ones
        let mut callback = self.parameters.callback.clone();
        let mut verifier = self.parameters.verifier.clone();
        let mut request_params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        for (key, value) in params {
            request_params.push((key.as_ref().to_string(), value.as_ref().to_string()));
        }
        let mut plain = Vec::with_capacity(request_params.len());
        for (key, value) in request_params {
            if !key.starts_with(OAUTH_KEY_PREFIX) {
                plain.push((key, value));
            } else if key == OAUTH_CALLBACK_KEY {
                callback.get_or_insert(Cow::Owned(value));
            } else if key == OAUTH_VERIFIER_KEY {
                verifier.get_or_insert(Cow::Owned(value));
            } else {
                return Err(ConfigurationError::UnknownParameter(key));
            }
        }

        let nonce = self
            .parameters
            .nonce
            .clone()
            .unwrap_or_else(|| Cow::Owned(generate_nonce()));
        let timestamp = self.parameters.timestamp.unwrap_or_else(timestamp_now);

        let mut oauth = vec![
            (OAUTH_CONSUMER_KEY.to_string(), consumer_key.to_string()),
            (OAUTH_NONCE_KEY.to_string(), nonce.into_owned()),
            (
                OAUTH_SIGNATURE_METHOD_KEY.to_string(),
                SIGNATURE_METHOD.to_string(),
            ),
            (OAUTH_TIMESTAMP_KEY.to_string(), timestamp.to_string()),
        ];
        if let Some(token) = token {
            oauth.push((OAUTH_TOKEN_KEY.to_string(), token.to_string()));
        }
        if self.parameters.version {
            oauth.push((OAUTH_VERSION_KEY.to_string(), OAUTH_VERSION.to_string()));
        }
        if let Some(callback) = callback {
            oauth.push((OAUTH_CALLBACK_KEY.to_string(), callback.into_owned()));
        }
        if let Some(verifier) = verifier {
            oauth.push((OAUTH_VERIFIER_KEY.to_string(), verifier.into_owned()));
        }

        let normalized_url = normalize_url(url);
        let all = plain.iter().chain(oauth.iter()).cloned().collect::<Vec<_>>();
        let base_string = signature_base_string(method, &normalized_url, &normalize_parameters(&all));
        let signature = hmac_sha1_base64(&signing_key(consumer_secret, token_secret), &base_string);

        oauth.push((OAUTH_SIGNATURE_KEY.to_string(), signature.clone()));
        oauth.sort();

        Ok(Signature {
            signature,
            params: plain,
            oauth,
            base_string,
            realm: self.parameters.realm.as_ref().map(|r| r.to_string()),
        })
    }
}

/// Output of [`Signer::sign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    signature: String,
    params: Vec<(String, String)>,
    oauth: Vec<(String, String)>,
    base_string: String,
    realm: Option<String>,
}

impl Signature {
    /// The base64 `oauth_signature` value.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn base_string(&self) -> &str {
        &self.base_string
    }

    /// The request's own parameters, including those taken from the url query.
    pub fn request_parameters(&self) -> &[(String, String)] {
        &self.params
    }

    /// The `oauth_*` protocol parameters, `oauth_signature` included.
    pub fn oauth_parameters(&self) -> &[(String, String)] {
        &self.oauth
    }

    /// Every parameter that has to reach the provider for the signature to verify.
    pub fn signed_params(&self) -> Vec<(String, String)> {
        self.params.iter().chain(self.oauth.iter()).cloned().collect()
    }

    /// `signed_params` encoded for a query string or form body.
    pub fn to_encoded_pairs(&self) -> String {
        encode_pairs(&self.signed_params())
    }

    /// The `Authorization` header carrying the `oauth_*` parameters.
    pub fn authorization_header(&self) -> String {
        let mut items = Vec::with_capacity(self.oauth.len() + 1);
        if let Some(ref realm) = self.realm {
            items.push(format!("{}=\"{}\"", REALM_KEY, percent_encode(realm)));
        }
        for (k, v) in &self.oauth {
            items.push(format!("{}=\"{}\"", percent_encode(k), percent_encode(v)));
        }
        format!("OAuth {}", items.join(","))
    }
}

/// Encode pairs in order, without sorting.
pub(crate) fn encode_pairs<K, V>(pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k.as_ref()), percent_encode(v.as_ref())))
        .collect::<Vec<_>>()
        .join("&")
}

#[derive(Debug, Clone)]
pub struct OAuthParameters<'a> {
    callback: Option<Cow<'a, str>>,
    nonce: Option<Cow<'a, str>>,
    realm: Option<Cow<'a, str>>,
    timestamp: Option<u64>,
    verifier: Option<Cow<'a, str>>,
    version: bool,
}

impl Default for OAuthParameters<'_> {
    fn default() -> Self {
        OAuthParameters {
            callback: None,
            nonce: None,
            realm: None,
            timestamp: None,
            verifier: None,
            version: true,
        }
    }
}

impl<'a> OAuthParameters<'a> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn callback<T>(self, callback: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            callback: Some(callback.into()),
            ..self
        }
    }

    /// set the oauth_nonce value
    ///
    /// Only fix the nonce for reproducible signatures; real requests need a
    /// fresh one each time.
    pub fn nonce<T>(self, nonce: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            nonce: Some(nonce.into()),
            ..self
        }
    }

    /// set the realm of the Authorization header
    pub fn realm<T>(self, realm: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            realm: Some(realm.into()),
            ..self
        }
    }

    /// set the oauth_timestamp value
    pub fn timestamp<T>(self, timestamp: T) -> Self
    where
        T: Into<u64>,
    {
        OAuthParameters {
            timestamp: Some(timestamp.into()),
            ..self
        }
    }

    /// set the oauth_verifier value
    pub fn verifier<T>(self, verifier: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            verifier: Some(verifier.into()),
            ..self
        }
    }

    /// set the oauth_version value (boolean)
    ///
    /// # Note
    /// When the version has value `true` (the default), oauth_version will be
    /// set with "1.0". Otherwise, oauth_version will not be included in your request.
    pub fn version<T>(self, version: T) -> Self
    where
        T: Into<bool>,
    {
        OAuthParameters {
            version: version.into(),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Credential, Token};

    fn rfc_credential() -> Credential {
        Credential::new("dpf43f3p2l4k3l03", "kd94hf93k423kf44")
    }

    #[test]
    fn sign_post_query() {
        // https://tools.ietf.org/html/rfc5849#section-1.2
        let credential = rfc_credential();
        let params = OAuthParameters::new()
            .nonce("wIjqoS")
            .timestamp(137_131_200u64)
            .callback("http://printer.example.com/ready")
            .realm("photos")
            .version(false);
        let url = Url::parse("https://photos.example.net/initiate").unwrap();

        let signed = Signer::new(&credential, params)
            .sign::<&str, &str>(&Method::POST, &url, &[])
            .unwrap();
        assert_eq!(signed.signature(), "74KNZJeDHnMBp0EMJ9ZHt/XKycU=");
        assert!(signed
            .authorization_header()
            .starts_with("OAuth realm=\"photos\",oauth_callback="));
    }

    #[test]
    fn sign_get_query() {
        // https://tools.ietf.org/html/rfc5849#section-1.2
        let credential = rfc_credential();
        let token = Token::access("nnch734d00sl2jdk", "pfkkdhi9sl3r4s00");
        let secrets = credential.token(&token);
        let params = OAuthParameters::new()
            .nonce("chapoH")
            .timestamp(137_131_202u64)
            .realm("Photos")
            .version(false);
        let url = Url::parse("http://photos.example.net/photos?file=vacation.jpg&size=original").unwrap();

        let signed = Signer::new(&secrets, params)
            .sign::<&str, &str>(&Method::GET, &url, &[])
            .unwrap();
        assert_eq!(
            signed.base_string(),
            "GET&http%3A%2F%2Fphotos.example.net%2Fphotos&file%3Dvacation.jpg%26\
             oauth_consumer_key%3Ddpf43f3p2l4k3l03%26oauth_nonce%3DchapoH%26\
             oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D137131202%26\
             oauth_token%3Dnnch734d00sl2jdk%26size%3Doriginal"
        );
        assert_eq!(signed.signature(), "MdpQcU8iPSUjWoN/UDMsK2sui9I=");
        assert_eq!(
            signed.request_parameters(),
            &[
                ("file".to_string(), "vacation.jpg".to_string()),
                ("size".to_string(), "original".to_string())
            ]
        );
    }

    #[test]
    fn sign_post_body() {
        // https://developer.twitter.com/ja/docs/basics/authentication/guides/creating-a-signature
        let credential = Credential::new(
            "xvz1evFS4wEEPTGEFPHBog",
            "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
        );
        let token = Token::access(
            "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb",
            "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
        );
        let secrets = credential.token(&token);
        let params = OAuthParameters::new()
            .nonce("kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg")
            .timestamp(1_318_622_958u64);
        let url = Url::parse("https://api.twitter.com/1.1/statuses/update.json").unwrap();
        let form = [
            ("include_entities", "true"),
            ("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
        ];

        let signer = Signer::new(&secrets, params);
        let first = signer.sign(&Method::POST, &url, &form).unwrap();
        assert_eq!(first.signature(), "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");

        // fixed nonce and timestamp: byte-identical output
        let second = signer.sign(&Method::POST, &url, &form).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_encoded_pairs(), second.to_encoded_pairs());
    }

    #[test]
    fn fresh_nonce_changes_the_signature() {
        let credential = Credential::new("CK", "CS");
        let url = Url::parse("https://api.twitter.com/1/statuses/home_timeline.json").unwrap();
        let signer = Signer::new(&credential, OAuthParameters::new().timestamp(1_000u64));
        let a = signer.sign(&Method::GET, &url, &[("count", "2")]).unwrap();
        let b = signer.sign(&Method::GET, &url, &[("count", "2")]).unwrap();
        assert_ne!(a.signature(), b.signature());
    }

    #[test]
    fn percent_encoding_escapes_reserved_characters() {
        assert_eq!(
            percent_encode("Hello Ladies + Gentlemen, a signed OAuth request!"),
            "Hello%20Ladies%20%2B%20Gentlemen%2C%20a%20signed%20OAuth%20request%21"
        );
        assert_eq!(percent_encode("a&b=c"), "a%26b%3Dc");
        assert_eq!(percent_encode("☃"), "%E2%98%83");
        assert_eq!(percent_encode("少女"), "%E5%B0%91%E5%A5%B3");
        assert_eq!(percent_encode("AZaz09-._~"), "AZaz09-._~");

        for byte in 0x20u8..0x7f {
            let c = byte as char;
            let encoded = percent_encode(&c.to_string());
            if c.is_ascii_alphanumeric() || "-._~".contains(c) {
                assert_eq!(encoded, c.to_string());
            } else {
                assert_eq!(encoded, format!("%{:02X}", byte));
            }
        }
    }

    #[test]
    fn parameters_sort_by_key_then_value() {
        let params = [("b", "2"), ("a", "2"), ("a", "1")];
        assert_eq!(normalize_parameters(&params), "a=1&a=2&b=2");
    }

    #[test]
    fn url_normalization_drops_query_fragment_and_default_port() {
        let url = Url::parse("HTTPS://Api.Twitter.com:443/1/users/show.json?screen_name=a#frag").unwrap();
        assert_eq!(normalize_url(&url), "https://api.twitter.com/1/users/show.json");
        let url = Url::parse("http://example.com:8080/r%20v").unwrap();
        assert_eq!(normalize_url(&url), "http://example.com:8080/r%20v");
    }

    #[test]
    fn signing_key_uses_empty_token_secret() {
        assert_eq!(signing_key("c&s", None), "c%26s&");
        assert_eq!(signing_key("cs", Some("ts")), "cs&ts");
    }

    #[test]
    fn missing_credential_is_a_configuration_error() {
        let credential = Credential::new("", "CS");
        let url = Url::parse("https://api.twitter.com/oauth/request_token").unwrap();
        let err = Signer::new(&credential, OAuthParameters::new())
            .sign::<&str, &str>(&Method::POST, &url, &[])
            .unwrap_err();
        assert_eq!(err, ConfigurationError::MissingCredential("consumer_key"));
    }

    #[test]
    fn unknown_oauth_parameter_is_rejected() {
        let credential = Credential::new("CK", "CS");
        let url = Url::parse("https://api.twitter.com/1/help/test.json").unwrap();
        let signer = Signer::new(&credential, OAuthParameters::new());
        let err = signer
            .sign(&Method::GET, &url, &[("oauth_signature", "forged")])
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownParameter("oauth_signature".to_string())
        );

        let signed = signer
            .sign(&Method::POST, &url, &[("oauth_callback", "oob")])
            .unwrap();
        assert!(signed
            .oauth_parameters()
            .contains(&("oauth_callback".to_string(), "oob".to_string())));
        assert!(signed.request_parameters().is_empty());
    }

    #[test]
    fn signed_params_carry_protocol_fields() {
        let credential = Credential::new("CK", "CS");
        let token = Token::access("T2", "S2");
        let secrets = credential.token(&token);
        let url = Url::parse("https://api.twitter.com/1/statuses/home_timeline.json").unwrap();
        let signed = Signer::new(&secrets, OAuthParameters::new())
            .sign(&Method::GET, &url, &[("count", "2")])
            .unwrap();
        let keys = signed
            .signed_params()
            .into_iter()
            .map(|(k, _)| k)
            .collect::<Vec<_>>();
        assert_eq!(
            keys,
            vec![
                "count",
                "oauth_consumer_key",
                "oauth_nonce",
                "oauth_signature",
                "oauth_signature_method",
                "oauth_timestamp",
                "oauth_token",
                "oauth_version",
            ]
        );
    }
}
