use std::fmt::Display;

use serde::Serialize;

/// Ordered query/form parameters of an endpoint call.
///
/// Keys are the provider's own names (`since_id`, `count`, `screen_name`,
/// ...). Values are stored as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Default::default()
    }

    /// Set `key`, replacing any earlier value.
    pub fn set<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Display,
    {
        self.insert(key, value);
        self
    }

    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Display,
    {
        let key = key.into();
        self.0.retain(|(k, _)| *k != key);
        self.0.push((key, value.to_string()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove `key` and return its value.
    pub fn take(&mut self, key: &str) -> Option<String> {
        let index = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(index).1)
    }

    /// Apply a pagination strategy.
    pub fn paginate(mut self, pagination: Pagination) -> Self {
        pagination.apply(&mut self);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Display,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// How a listing endpoint pages through its results.
///
/// Older endpoints count pages from 1; newer ones hand out opaque cursors,
/// starting at -1 and continuing with the `next_cursor` of each response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    Page(u32),
    Cursor(i64),
}

impl Pagination {
    pub const FIRST_PAGE: Pagination = Pagination::Page(1);
    pub const FIRST_CURSOR: Pagination = Pagination::Cursor(-1);

    /// Writes `page` or `cursor`, removing the other.
    pub fn apply(&self, params: &mut Params) {
        match *self {
            Pagination::Page(page) => {
                params.take("cursor");
                params.insert("page", page);
            }
            Pagination::Cursor(cursor) => {
                params.take("page");
                params.insert("cursor", cursor);
            }
        }
    }
}
