//! Request identity keys.

use sha2::{Digest, Sha256};
use url::Url;

/// Compute the cache key for a request identity.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// Normalized request identity: uppercase method plus URL without fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
    pub hash: String,
}

impl RequestKey {
    pub fn new(method: &str, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        let method = method.to_ascii_uppercase();
        let hash = compute_cache_key(&method, url.as_str());
        Self { method, url: url.into(), hash }
    }

    pub fn get(url: &Url) -> Self {
        Self::new("GET", url)
    }

    /// Only `GET` responses are stored or matched.
    pub fn is_cacheable(&self) -> bool {
        self.method == "GET"
    }
}
