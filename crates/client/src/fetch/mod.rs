//! Network side of the worker.
//!
//! ### Fetcher seam
//! - Strategies and install talk to the network only through [`Fetcher`], so
//!   tests can script the network and count calls.
//! - A fetch succeeds whenever the transport completes, whatever the HTTP
//!   status; only transport failures are errors.
//!
//! ### Cache bypass
//! - [`CacheMode::Reload`] sends `Cache-Control: no-cache` and `Pragma: no-cache`
//!   so intermediaries revalidate instead of answering from their own cache.
//!
//! ### Limits
//! - Max body bytes: 5MB (configurable)
//! - Max redirects: 5
//! - No request timeout unless one is configured

pub mod url;

use reqwest::Url;
use reqwest::{Client, Method, header};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, cache_bust, canonicalize, resolve_in_scope};

use shellcache_core::{Error, RequestDescriptor, ResponseSnapshot};

/// HTTP cache interaction for an outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Let intermediaries answer as they normally would.
    #[default]
    Default,
    /// Force revalidation end to end.
    Reload,
}

/// An outgoing network request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: Url,
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub cache: CacheMode,
}

impl FetchRequest {
    pub fn get(url: Url) -> Self {
        Self { url, method: "GET".to_string(), headers: Vec::new(), cache: CacheMode::Default }
    }

    /// Forward an intercepted request as-is.
    pub fn from_descriptor(request: &RequestDescriptor) -> Self {
        Self {
            url: request.url.clone(),
            method: request.method.clone(),
            headers: request.headers.clone(),
            cache: CacheMode::Default,
        }
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = url;
        self
    }

    pub fn with_cache(mut self, cache: CacheMode) -> Self {
        self.cache = cache;
        self
    }
}

/// Anything that can turn a request into a buffered response.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform the request.
    ///
    /// Returns `Err` only when no response was received.
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "shellcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: none)
    pub timeout: Option<Duration>,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "shellcache/0.1".to_string(), max_bytes: 5 * 1024 * 1024, timeout: None, max_redirects: 5 }
    }
}

impl From<&shellcache_core::WorkerConfig> for FetchConfig {
    fn from(config: &shellcache_core::WorkerConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// reqwest-backed [`Fetcher`].
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    fn map_send_error(err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::FetchTimeout(err.to_string())
        } else {
            Error::Network(format!("network error: {}", err))
        }
    }
}

#[async_trait::async_trait]
impl Fetcher for FetchClient {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {}: {}", request.method, e)))?;

        let mut builder = self.http.request(method, request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if request.cache == CacheMode::Reload {
            builder = builder
                .header(header::CACHE_CONTROL, "no-cache")
                .header(header::PRAGMA, "no-cache");
        }

        let response = builder.send().await.map_err(Self::map_send_error)?;

        let status = response.status();
        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let final_url = response.url().clone();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();

        let bytes = response.bytes().await.map_err(Self::map_send_error)?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        tracing::debug!(
            "fetched {} -> {} {} in {}ms ({} bytes)",
            request.url,
            final_url,
            status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len()
        );

        Ok(ResponseSnapshot::new(final_url, status.as_u16(), headers, bytes.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header as header_eq, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn url(server: &MockServer, p: &str) -> Url {
        Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "shellcache/0.1");
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, None);
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_worker_config() {
        let worker = shellcache_core::WorkerConfig { timeout_ms: Some(250), max_bytes: 10, ..Default::default() };
        let config = FetchConfig::from(&worker);
        assert_eq!(config.timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.max_bytes, 10);
    }

    #[test]
    fn test_fetch_request_from_descriptor() {
        let descriptor = RequestDescriptor::get(Url::parse("https://dash.example/a.js").unwrap())
            .with_header("accept", "*/*");
        let request = FetchRequest::from_descriptor(&descriptor).with_cache(CacheMode::Reload);
        assert_eq!(request.method, "GET");
        assert_eq!(request.headers, vec![("accept".to_string(), "*/*".to_string())]);
        assert_eq!(request.cache, CacheMode::Reload);
    }

    #[tokio::test]
    async fn test_fetch_returns_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.html"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html></html>"),
            )
            .mount(&server)
            .await;

        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let res = client.fetch(&FetchRequest::get(url(&server, "/index.html"))).await.unwrap();
        assert_eq!(res.status, 200);
        assert_eq!(res.body_text(), "<html></html>");
        assert_eq!(res.content_type(), Some("text/html"));
    }

    #[tokio::test]
    async fn test_fetch_non_success_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let res = client.fetch(&FetchRequest::get(url(&server, "/manifest.json"))).await.unwrap();
        assert_eq!(res.status, 404);
        assert!(!res.is_ok());
    }

    #[tokio::test]
    async fn test_reload_sends_no_cache_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/buttons.json"))
            .and(query_param("v", "1"))
            .and(header_eq("cache-control", "no-cache"))
            .and(header_eq("pragma", "no-cache"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let request = FetchRequest::get(url(&server, "/buttons.json?v=1")).with_cache(CacheMode::Reload);
        let res = client.fetch(&request).await.unwrap();
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn test_fetch_too_large() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("0123456789"))
            .mount(&server)
            .await;

        let client = FetchClient::new(FetchConfig { max_bytes: 4, ..Default::default() }).unwrap();
        let err = client.fetch(&FetchRequest::get(url(&server, "/big"))).await.unwrap_err();
        assert!(matches!(err, Error::FetchTooLarge(_)));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_is_network_error() {
        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let request = FetchRequest::get(Url::parse("http://127.0.0.1:1/").unwrap());
        let err = client.fetch(&request).await.unwrap_err();
        assert!(err.is_network_failure());
    }
}
