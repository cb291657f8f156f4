//! The REST endpoint catalogue.
//!
//! Every endpoint is a plain descriptor: verb, host, path template, whether
//! it needs an access token, and which parameters it insists on. A single
//! dispatcher ([`Client::call`](crate::Client::call)) turns descriptor plus
//! [`Params`] into a signed request.
//!
//! Path templates use `{name}` for a segment taken out of the parameters and
//! `{name?}` for a segment that is dropped when the parameter is absent.
//! `{user}` falls back to the screen name of the access token. The API
//! version is prefixed and `.json` appended automatically.

use http::Method;
use url::Url;

use crate::config::join_base;
use crate::signer::percent_encode;
use crate::{ClientConfig, ConfigurationError, Params, SignResult};

const USER_PLACEHOLDER: &str = "user";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Delete,
}

impl Verb {
    pub fn method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Delete => Method::DELETE,
        }
    }
}

/// Which base URL an endpoint lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Host {
    /// The versioned REST API.
    Api,
    /// The unversioned search service.
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub verb: Verb,
    pub host: Host,
    pub path: &'static str,
    pub requires_auth: bool,
    pub required: &'static [&'static str],
    pub one_of: &'static [&'static str],
    /// Multipart field carrying the file, for upload endpoints.
    pub upload: Option<&'static str>,
    /// Parameters that must be six-digit hex colours when present.
    pub colors: &'static [&'static str],
}

impl Endpoint {
    const fn new(verb: Verb, path: &'static str) -> Self {
        Endpoint {
            verb,
            host: Host::Api,
            path,
            requires_auth: false,
            required: &[],
            one_of: &[],
            upload: None,
            colors: &[],
        }
    }

    const fn get(path: &'static str) -> Self {
        Endpoint::new(Verb::Get, path)
    }

    const fn post(path: &'static str) -> Self {
        Endpoint::new(Verb::Post, path)
    }

    const fn delete(path: &'static str) -> Self {
        Endpoint::new(Verb::Delete, path)
    }

    const fn auth(self) -> Self {
        Endpoint {
            requires_auth: true,
            ..self
        }
    }

    const fn search(self) -> Self {
        Endpoint {
            host: Host::Search,
            ..self
        }
    }

    const fn required(self, required: &'static [&'static str]) -> Self {
        Endpoint { required, ..self }
    }

    const fn one_of(self, one_of: &'static [&'static str]) -> Self {
        Endpoint { one_of, ..self }
    }

    const fn upload(self, field: &'static str) -> Self {
        Endpoint {
            upload: Some(field),
            ..self
        }
    }

    const fn colors(self, colors: &'static [&'static str]) -> Self {
        Endpoint { colors, ..self }
    }

    /// Name used in error messages.
    pub fn name(&self) -> &'static str {
        self.path
    }

    pub fn method(&self) -> Method {
        self.verb.method()
    }

    /// Check required parameters and alternatives before anything is sent.
    pub fn validate(&self, params: &Params) -> SignResult<()> {
        let present = |key: &str| params.get(key).map_or(false, |v| !v.is_empty());
        if let Some(missing) = self.required.iter().find(|key| !present(key)) {
            return Err(ConfigurationError::MissingParameter {
                endpoint: self.name(),
                parameter: missing.to_string(),
            });
        }
        if !self.one_of.is_empty() && !self.one_of.iter().any(|key| present(key)) {
            return Err(ConfigurationError::MissingAlternative {
                endpoint: self.name(),
                candidates: self.one_of.join(", "),
            });
        }
        for key in self.colors {
            match params.get(key) {
                Some(value) if !is_hex_color(value) => {
                    return Err(ConfigurationError::InvalidParameters(format!(
                        "{} : {} must be a six-digit hexadecimal colour, got {:?}",
                        self.name(),
                        key,
                        value
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Render the full URL, consuming the parameters used as path segments.
    pub fn url(
        &self,
        config: &ClientConfig,
        params: &mut Params,
        default_user: Option<&str>,
    ) -> SignResult<Url> {
        let mut path = match self.host {
            Host::Api => config.api_version.to_string(),
            Host::Search => String::new(),
        };
        for piece in self.path.split('/') {
            let segment = match placeholder(piece) {
                None => Some(piece.to_string()),
                Some((name, optional)) => {
                    match params.take(name).filter(|v| !v.is_empty()) {
                        Some(value) => Some(percent_encode(&value)),
                        None if name == USER_PLACEHOLDER && default_user.is_some() => {
                            default_user.map(percent_encode)
                        }
                        None if optional => None,
                        None => {
                            return Err(ConfigurationError::MissingParameter {
                                endpoint: self.name(),
                                parameter: name.to_string(),
                            })
                        }
                    }
                }
            };
            if let Some(segment) = segment {
                if !path.is_empty() {
                    path.push('/');
                }
                path.push_str(&segment);
            }
        }
        path.push_str(".json");

        let base = match self.host {
            Host::Api => &config.api_base,
            Host::Search => &config.search_base,
        };
        join_base(base, &path)
    }
}

/// `{name}` gives `(name, false)`, `{name?}` gives `(name, true)`.
fn placeholder(piece: &str) -> Option<(&str, bool)> {
    let inner = piece.strip_prefix('{')?.strip_suffix('}')?;
    Some(match inner.strip_suffix('?') {
        Some(name) => (name, true),
        None => (inner, false),
    })
}

const USER_ALTERNATIVES: &[&str] = &["id", "user_id", "screen_name"];

// account
pub const VERIFY_CREDENTIALS: Endpoint = Endpoint::get("account/verify_credentials").auth();
pub const RATE_LIMIT_STATUS: Endpoint = Endpoint::get("account/rate_limit_status");
pub const END_SESSION: Endpoint = Endpoint::post("account/end_session").auth();
pub const UPDATE_DELIVERY_DEVICE: Endpoint = Endpoint::post("account/update_delivery_device")
    .auth()
    .required(&["device"]);
pub const UPDATE_PROFILE_COLORS: Endpoint = Endpoint::post("account/update_profile_colors")
    .auth()
    .colors(&[
        "profile_background_color",
        "profile_text_color",
        "profile_link_color",
        "profile_sidebar_fill_color",
        "profile_sidebar_border_color",
    ]);
pub const UPDATE_PROFILE: Endpoint = Endpoint::post("account/update_profile").auth();
pub const UPDATE_PROFILE_IMAGE: Endpoint = Endpoint::post("account/update_profile_image")
    .auth()
    .upload("image");
pub const UPDATE_PROFILE_BACKGROUND_IMAGE: Endpoint =
    Endpoint::post("account/update_profile_background_image")
        .auth()
        .upload("image");

// timelines
pub const PUBLIC_TIMELINE: Endpoint = Endpoint::get("statuses/public_timeline");
pub const HOME_TIMELINE: Endpoint = Endpoint::get("statuses/home_timeline").auth();
pub const FRIENDS_TIMELINE: Endpoint = Endpoint::get("statuses/friends_timeline").auth();
pub const USER_TIMELINE: Endpoint = Endpoint::get("statuses/user_timeline/{id?}");
pub const MENTIONS: Endpoint = Endpoint::get("statuses/mentions").auth();
pub const RETWEETED_BY_ME: Endpoint = Endpoint::get("statuses/retweeted_by_me").auth();
pub const RETWEETED_TO_ME: Endpoint = Endpoint::get("statuses/retweeted_to_me").auth();
pub const RETWEETS_OF_ME: Endpoint = Endpoint::get("statuses/retweets_of_me").auth();

// statuses
pub const STATUS_SHOW: Endpoint = Endpoint::get("statuses/show/{id}");
pub const STATUS_UPDATE: Endpoint = Endpoint::post("statuses/update")
    .auth()
    .required(&["status"]);
pub const STATUS_DESTROY: Endpoint = Endpoint::post("statuses/destroy/{id}").auth();
pub const STATUS_RETWEET: Endpoint = Endpoint::post("statuses/retweet/{id}").auth();
pub const STATUS_RETWEETS: Endpoint = Endpoint::get("statuses/retweets/{id}").auth();
pub const STATUS_RETWEETED_BY: Endpoint = Endpoint::get("statuses/{id}/retweeted_by").auth();
pub const STATUS_RETWEETED_BY_IDS: Endpoint =
    Endpoint::get("statuses/{id}/retweeted_by/ids").auth();

// users
pub const USER_SHOW: Endpoint = Endpoint::get("users/show").one_of(&["user_id", "screen_name"]);
pub const USER_LOOKUP: Endpoint = Endpoint::post("users/lookup")
    .auth()
    .one_of(&["user_id", "screen_name"]);
pub const USER_SEARCH: Endpoint = Endpoint::get("users/search").auth().required(&["q"]);
pub const USER_SUGGESTIONS: Endpoint = Endpoint::get("users/suggestions");
pub const USER_SUGGESTIONS_SLUG: Endpoint = Endpoint::get("users/suggestions/{slug}");
pub const USER_PROFILE_IMAGE: Endpoint = Endpoint::get("users/profile_image/{screen_name}");
pub const USER_FRIENDS: Endpoint = Endpoint::get("statuses/friends/{id?}");
pub const USER_FOLLOWERS: Endpoint = Endpoint::get("statuses/followers/{id?}");
pub const REPORT_SPAM: Endpoint = Endpoint::post("report_spam")
    .auth()
    .one_of(USER_ALTERNATIVES);

// direct messages
pub const DIRECT_MESSAGES: Endpoint = Endpoint::get("direct_messages").auth();
pub const DIRECT_MESSAGES_SENT: Endpoint = Endpoint::get("direct_messages/sent").auth();
pub const DIRECT_MESSAGE_NEW: Endpoint = Endpoint::post("direct_messages/new")
    .auth()
    .required(&["user", "text"]);
pub const DIRECT_MESSAGE_DESTROY: Endpoint = Endpoint::post("direct_messages/destroy/{id}").auth();

// friendships
pub const FRIENDSHIP_CREATE: Endpoint = Endpoint::post("friendships/create/{id?}")
    .auth()
    .one_of(USER_ALTERNATIVES);
pub const FRIENDSHIP_DESTROY: Endpoint = Endpoint::post("friendships/destroy/{id?}")
    .auth()
    .one_of(USER_ALTERNATIVES);
pub const FRIENDSHIP_EXISTS: Endpoint = Endpoint::get("friendships/exists")
    .auth()
    .required(&["user_a", "user_b"]);
pub const FRIENDSHIP_SHOW: Endpoint = Endpoint::get("friendships/show")
    .auth()
    .one_of(&["target_id", "target_screen_name"]);

// social graph
pub const FRIENDS_IDS: Endpoint = Endpoint::get("friends/ids/{id?}");
pub const FOLLOWERS_IDS: Endpoint = Endpoint::get("followers/ids/{id?}");

// favorites
pub const FAVORITES: Endpoint = Endpoint::get("favorites/{id?}").auth();
pub const FAVORITE_CREATE: Endpoint = Endpoint::post("favorites/create/{id}").auth();
pub const FAVORITE_DESTROY: Endpoint = Endpoint::post("favorites/destroy/{id}").auth();

// notifications
pub const NOTIFICATION_FOLLOW: Endpoint = Endpoint::post("notifications/follow/{id?}")
    .auth()
    .one_of(USER_ALTERNATIVES);
pub const NOTIFICATION_LEAVE: Endpoint = Endpoint::post("notifications/leave/{id?}")
    .auth()
    .one_of(USER_ALTERNATIVES);

// blocks
pub const BLOCK_CREATE: Endpoint = Endpoint::post("blocks/create/{id}").auth();
pub const BLOCK_DESTROY: Endpoint = Endpoint::post("blocks/destroy/{id}").auth();
pub const BLOCK_EXISTS: Endpoint = Endpoint::get("blocks/exists/{id?}")
    .auth()
    .one_of(USER_ALTERNATIVES);
pub const BLOCKING: Endpoint = Endpoint::get("blocks/blocking").auth();
pub const BLOCKING_IDS: Endpoint = Endpoint::get("blocks/blocking/ids").auth();

// search and trends
pub const SEARCH: Endpoint = Endpoint::get("search").search().required(&["q"]);
pub const TRENDS_CURRENT: Endpoint = Endpoint::get("trends/current");
pub const TRENDS_DAILY: Endpoint = Endpoint::get("trends/daily");
pub const TRENDS_WEEKLY: Endpoint = Endpoint::get("trends/weekly");
pub const TRENDS_AVAILABLE: Endpoint = Endpoint::get("trends/available");
pub const TRENDS_LOCATION: Endpoint = Endpoint::get("trends/{woeid}");

// saved searches
pub const SAVED_SEARCHES: Endpoint = Endpoint::get("saved_searches").auth();
pub const SAVED_SEARCH_SHOW: Endpoint = Endpoint::get("saved_searches/show/{id}").auth();
pub const SAVED_SEARCH_CREATE: Endpoint = Endpoint::post("saved_searches/create")
    .auth()
    .required(&["query"]);
pub const SAVED_SEARCH_DESTROY: Endpoint = Endpoint::post("saved_searches/destroy/{id}").auth();

// lists
pub const LIST_CREATE: Endpoint = Endpoint::post("{user}/lists").auth().required(&["name"]);
pub const LIST_UPDATE: Endpoint = Endpoint::post("{user}/lists/{list_id}").auth();
pub const LISTS: Endpoint = Endpoint::get("{user}/lists").auth();
pub const LIST_MEMBERSHIPS: Endpoint = Endpoint::get("{user}/lists/memberships").auth();
pub const LIST_SUBSCRIPTIONS: Endpoint = Endpoint::get("{user}/lists/subscriptions").auth();
pub const LIST_SHOW: Endpoint = Endpoint::get("{user}/lists/{list_id}").auth();
pub const LIST_DELETE: Endpoint = Endpoint::delete("{user}/lists/{list_id}").auth();
pub const LIST_STATUSES: Endpoint = Endpoint::get("{user}/lists/{list_id}/statuses");
pub const LIST_MEMBERS: Endpoint = Endpoint::get("{user}/{list_id}/members").auth();
pub const LIST_MEMBER_ADD: Endpoint = Endpoint::post("{user}/{list_id}/members")
    .auth()
    .required(&["id"]);
pub const LIST_MEMBER_REMOVE: Endpoint = Endpoint::delete("{user}/{list_id}/members")
    .auth()
    .required(&["id"]);
pub const LIST_MEMBER_SHOW: Endpoint = Endpoint::get("{user}/{list_id}/members/{id}").auth();
pub const LIST_SUBSCRIBE: Endpoint = Endpoint::post("{user}/{list_id}/following").auth();
pub const LIST_UNSUBSCRIBE: Endpoint = Endpoint::delete("{user}/{list_id}/following").auth();
pub const LIST_SUBSCRIBER_SHOW: Endpoint =
    Endpoint::get("{user}/{list_id}/following/{id}").auth();

/// `rrggbb`, without a leading `#`.
fn is_hex_color(value: &str) -> bool {
    value.len() == 6 && value.bytes().all(|b| b.is_ascii_hexdigit())
}
