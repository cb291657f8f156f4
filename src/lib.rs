/*!
reqwest-twitter-oauth1: a blocking OAuth 1.0a client for the Twitter REST API.

# Overview

This library signs requests with HMAC-SHA1 as described in RFC 5849, drives
the three-legged handshake that turns a consumer credential into an access
token, persists that token, and calls the catalogued REST endpoints on
behalf of the authorized user. Requests are sent with a blocking
[reqwest](https://crates.io/crates/reqwest) client.

# How to use

## Basic usecase 1 - authorizing a desktop application

```rust,no_run
use std::io;

use reqwest_twitter_oauth1::{Client, ClientConfig, Credential, FileTokenStore, Params};
use reqwest_twitter_oauth1::endpoints::VERIFY_CREDENTIALS;

# fn main() -> Result<(), Box<dyn std::error::Error>> {
let config = ClientConfig::new(Credential::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]"))
    .desktop(true);
let mut client = Client::with_store(config, FileTokenStore::new("twitter-token.json"))?;

if !client.is_authorized() {
    // step 1: acquire a request token and show the user where to approve it
    let (url, mut token) = client.fetch_for_authorize()?;
    println!("please access to: {}", url);

    // step 2: acquire the user's pin
    println!("input pin: ");
    let mut user_input = String::new();
    io::stdin().read_line(&mut user_input)?;
    token.set_verifier(user_input.trim());

    // step 3: exchange it for an access token, saved in the store
    client.fetch_access_token(&token)?;
}

let me = client.call(&VERIFY_CREDENTIALS, Params::new())?;
println!("signed in as {}", me["screen_name"]);
# Ok(())
# }
```

## Basic usecase 2 - sending the tweet

```rust,no_run
use reqwest_twitter_oauth1::{Client, ClientConfig, Credential, MemoryTokenStore, Params, Token};
use reqwest_twitter_oauth1::endpoints::STATUS_UPDATE;

# fn main() -> Result<(), Box<dyn std::error::Error>> {
let config = ClientConfig::new(Credential::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]"));
let store = MemoryTokenStore::with_token(Token::access("[ACCESS_TOKEN]", "[TOKEN_SECRET]"));
let client = Client::with_store(config, store)?;

client.call(&STATUS_UPDATE, Params::new().set("status", "Hello, Twitter!"))?;
# Ok(())
# }
```
*/
mod client;
mod config;
pub mod endpoints;
mod error;
mod flow;
mod params;
mod request;
mod resource;
mod secrets;
mod signer;
mod store;
#[cfg(test)]
mod testing;
mod token;
mod token_reader;
mod transport;

// exposed to external program
pub use client::Client;
pub use config::{
    ClientConfig, ParameterPlacement, ProxyConfig, DEFAULT_API_BASE, DEFAULT_API_VERSION,
    DEFAULT_OAUTH_BASE, DEFAULT_SEARCH_BASE,
};
pub use endpoints::{Endpoint, Host, Verb};
pub use error::{
    ConfigurationError, Error, Result, SignResult, TokenReaderError, TokenReaderResult,
};
pub use flow::{AuthorizationFlow, AuthorizationState, OUT_OF_BAND};
pub use params::{Pagination, Params};
pub use request::RequestBuilder;
pub use resource::ResourceClient;
pub use secrets::{Credential, Secrets, SecretsProvider};
pub use signer::{
    generate_nonce, normalize_parameters, normalize_url, percent_encode, signature_base_string,
    signing_key, timestamp_now, OAuthParameters, Signature, Signer, SIGNATURE_METHOD,
};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use token::{Token, TokenKind};
pub use token_reader::{TokenReader, TokenResponse};
pub use transport::{
    Attachment, HttpRequest, HttpResponse, MultipartForm, RequestBody, ReqwestTransport,
    Transport,
};

// exposed constant variables
/// Represents `oauth_callback`.
pub const OAUTH_CALLBACK_KEY: &str = "oauth_callback";
/// Represents `oauth_nonce`.
pub const OAUTH_NONCE_KEY: &str = "oauth_nonce";
/// Represents `oauth_timestamp`.
pub const OAUTH_TIMESTAMP_KEY: &str = "oauth_timestamp";
/// Represents `oauth_verifier`.
pub const OAUTH_VERIFIER_KEY: &str = "oauth_verifier";
/// Represents `oauth_version`.
pub const OAUTH_VERSION_KEY: &str = "oauth_version";
/// Represents `realm`.
pub const REALM_KEY: &str = "realm";

// crate-private constant variables
pub(crate) const OAUTH_KEY_PREFIX: &str = "oauth_";
pub(crate) const OAUTH_SIGNATURE_METHOD_KEY: &str = "oauth_signature_method";
pub(crate) const OAUTH_SIGNATURE_KEY: &str = "oauth_signature";
pub(crate) const OAUTH_CONSUMER_KEY: &str = "oauth_consumer_key";
pub(crate) const OAUTH_TOKEN_KEY: &str = "oauth_token";
