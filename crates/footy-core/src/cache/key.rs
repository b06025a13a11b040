use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical identifier of a logical query.
///
/// Built from an endpoint and its parameters. Parameters are sorted by name
/// (then value) so the same logical query always produces the same key,
/// whatever order the caller listed them in:
///
/// - no parameters: `leagues/seasons`
/// - with parameters: `standings?league=39&season=2023`
///
/// Names and values are percent-encoded, so a value holding `&` or `=` can
/// never pass for a second parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn from_query<K, V>(endpoint: &str, params: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut pairs: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (k.as_ref(), v.as_ref()))
            .collect();
        pairs.sort_unstable();

        let endpoint = endpoint.trim_matches('/');
        if pairs.is_empty() {
            return Self(endpoint.to_string());
        }

        let query = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        Self(format!("{}?{}", endpoint, query))
    }

    /// Wrap an already-canonical key string.
    pub fn raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        Self::raw(key)
    }
}
