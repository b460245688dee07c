//! Case-insensitive header dictionary.
//!
//! HTTP header names are case-insensitive, but the casing a caller chose is
//! what ends up on the wire. [`HeaderStore`] keeps the first-seen casing of
//! every name while matching lookups, overwrites and removals regardless of
//! case.

use crate::{Error, Result};
use http::{HeaderMap, HeaderName, HeaderValue};
use indexmap::IndexMap;

/// Headers sent by every creator unless overridden or removed.
pub const DEFAULT_HEADERS: [(&str, &str); 2] = [
    ("Accept", "application/json"),
    ("Content-Type", "application/json"),
];

/// An ordered, case-insensitive header dictionary.
///
/// At most one entry exists per case-insensitive name.
///
/// # Examples
///
/// ```
/// use toapi::HeaderStore;
///
/// let mut headers = HeaderStore::with_defaults([("x-api-key", "secret")]);
/// headers.add("content-type", "text/plain");
///
/// assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
/// // the original casing is kept
/// assert!(headers.iter().any(|(name, _)| name == "Content-Type"));
///
/// headers.remove("X-API-KEY");
/// assert_eq!(headers.get("x-api-key"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderStore {
    // lowercased name -> (stored name, value)
    entries: IndexMap<String, (String, String)>,
}

impl HeaderStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with [`DEFAULT_HEADERS`], then applies `overrides`
    /// on top of them.
    pub fn with_defaults<I, N, V>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let mut store: Self = DEFAULT_HEADERS.into_iter().collect();
        store.extend(overrides);
        store
    }

    /// Returns the value of a header, ignoring case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if a header with this name exists, ignoring case.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    /// Sets a header.
    ///
    /// An existing entry with the same case-insensitive name keeps its stored
    /// casing and only gets its value replaced.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let key = name.to_ascii_lowercase();
        match self.entries.get_mut(&key) {
            Some((_, existing)) => *existing = value,
            None => {
                self.entries.insert(key, (name, value));
            }
        }
    }

    /// Removes a header, ignoring case. Does nothing if it is absent.
    pub fn remove(&mut self, name: &str) {
        self.entries.shift_remove(&name.to_ascii_lowercase());
    }

    /// Applies every entry of `other` to this store with [`HeaderStore::add`].
    pub fn merge(&mut self, other: &HeaderStore) {
        for (name, value) in other.iter() {
            self.add(name, value);
        }
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of headers in the store.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store holds no headers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops entries whose value is empty.
    ///
    /// An empty value is how a route blanks out an inherited header.
    pub(crate) fn without_empty(mut self) -> Self {
        self.entries.retain(|_, (_, value)| !value.is_empty());
        self
    }

    /// Converts the store into an [`http::HeaderMap`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a name or value is not valid HTTP.
    pub fn to_header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(self.len());
        for (name, value) in self.iter() {
            let (name, value) = validate(name, value)?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

/// Checks that a header name and value are valid HTTP.
pub(crate) fn validate(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::try_from(name)
        .map_err(|e| Error::Configuration(format!("Invalid header name '{}': {}", name, e)))?;
    let header_value = HeaderValue::try_from(value)
        .map_err(|e| Error::Configuration(format!("Invalid header value for '{}': {}", name, e)))?;
    Ok((header_name, header_value))
}

impl<N, V> FromIterator<(N, V)> for HeaderStore
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut store = Self::new();
        store.extend(iter);
        store
    }
}

impl<N, V> Extend<(N, V)> for HeaderStore
where
    N: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (N, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.add(name, value);
        }
    }
}
