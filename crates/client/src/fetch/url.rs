//! URL handling: canonicalization, scope resolution and cache busting.

use url::Url;

/// Error type for URL handling failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize an intercepted request URL.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Require an absolute http(s) URL
/// 3. Lowercase the host (done by the parser)
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Resolve a seed path against the registration scope.
///
/// Leading slashes are stripped so `/index.html` lands under a subpath scope
/// instead of the origin root; `/`, `./` and `` all resolve to the scope itself.
pub fn resolve_in_scope(scope: &Url, path: &str) -> Result<Url, UrlError> {
    let relative = path.trim().trim_start_matches('/');
    if relative.contains("://") {
        return Err(UrlError::InvalidUrl(format!("seed path must be relative: {path}")));
    }
    scope.join(relative).map_err(|e| UrlError::InvalidUrl(e.to_string()))
}

/// Append `param=token` to the query, after any existing parameters.
pub fn cache_bust(url: &Url, param: &str, token: &str) -> Url {
    let mut busted = url.clone();
    busted.query_pairs_mut().append_pair(param, token);
    busted
}
