//! Query parameters.
//!
//! Parameters are kept as the percent-encoded `key[=value]` segments they
//! arrived as, in order. Lookups decode on demand; rebuilding the query
//! re-emits the segments untouched, so `%FF` and valueless keys such as
//! `_summary` survive the trip through the rewriter.

use std::borrow::Cow;

use url::form_urlencoded;

/// Ordered query parameters, repeated keys preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParameters {
    segments: Vec<String>,
}

impl QueryParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split an `application/x-www-form-urlencoded` query string.
    ///
    /// Empty segments (`a=1&&b=2`) carry no parameter and are dropped.
    pub fn parse(query: &str) -> Self {
        Self {
            segments: query
                .split('&')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Append a decoded key and value, encoding them.
    pub fn append(&mut self, key: &str, value: &str) {
        let segment = form_urlencoded::Serializer::new(String::new())
            .append_pair(key, value)
            .finish();
        self.segments.push(segment);
    }

    /// Decoded values of every occurrence of `key`, in arrival order.
    ///
    /// A valueless occurrence yields an empty string.
    pub fn get(&self, key: &str) -> Option<Vec<String>> {
        let values: Vec<String> = self
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .collect();
        (!values.is_empty()).then_some(values)
    }

    /// Decoded `(key, value)` pairs in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = (Cow<'_, str>, Cow<'_, str>)> {
        self.segments
            .iter()
            .filter_map(|segment| form_urlencoded::parse(segment.as_bytes()).next())
    }

    /// Number of distinct decoded keys.
    pub fn len(&self) -> usize {
        let mut keys: Vec<Cow<'_, str>> = self.iter().map(|(k, _)| k).collect();
        keys.sort();
        keys.dedup();
        keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Rebuild the query string, one segment per parameter occurrence.
    ///
    /// Returns an empty string when there are no parameters.
    pub fn to_query_string(&self) -> String {
        self.segments.join("&")
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParameters
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.append(key.as_ref(), value.as_ref());
        }
        params
    }
}
