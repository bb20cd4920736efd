//! Scripted network for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use shellcache_core::{Error, ResponseSnapshot};
use url::Url;

use crate::fetch::{FetchRequest, Fetcher};

/// In-memory network keyed by URL without query.
///
/// Unknown URLs answer 404. While offline every fetch fails with a network
/// error. Every request is recorded, including failed ones.
#[derive(Default)]
pub struct ScriptedNetwork {
    routes: Mutex<HashMap<String, (u16, String, String)>>,
    offline: AtomicBool,
    calls: Mutex<Vec<FetchRequest>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, url: &str, status: u16, content_type: &str, body: &str) -> Self {
        self.set_route(url, status, content_type, body);
        self
    }

    pub fn set_route(&self, url: &str, status: u16, content_type: &str, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, content_type.to_string(), body.to_string()));
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<FetchRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of requests whose URL (without query) is `url`.
    pub fn calls_to(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| strip_query(&r.url) == url)
            .count()
    }
}

fn strip_query(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

#[async_trait::async_trait]
impl Fetcher for ScriptedNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot, Error> {
        self.calls.lock().unwrap().push(request.clone());

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {}", request.url)));
        }

        let route = self.routes.lock().unwrap().get(&strip_query(&request.url)).cloned();
        let response = match route {
            Some((status, content_type, body)) => ResponseSnapshot::new(
                request.url.clone(),
                status,
                vec![("content-type".to_string(), content_type)],
                body.into_bytes(),
            ),
            None => ResponseSnapshot::new(request.url.clone(), 404, Vec::new(), b"Not Found".to_vec()),
        };
        Ok(response)
    }
}
