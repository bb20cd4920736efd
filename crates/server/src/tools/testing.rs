//! Test doubles for the tool tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use shellcache_client::{FetchRequest, Fetcher, Registration};
use shellcache_core::{ActivationMode, CacheDb, Error, ResponseSnapshot, WorkerConfig};

/// Answers every request with 200 and `network <path>`, unless switched offline.
#[derive(Default)]
pub struct StaticNetwork {
    offline: AtomicBool,
}

impl StaticNetwork {
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetcher for StaticNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot, Error> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".into()));
        }
        let body = format!("network {}", request.url.path()).into_bytes();
        Ok(ResponseSnapshot::new(
            request.url.clone(),
            200,
            vec![("content-type".into(), "text/plain".into())],
            body,
        ))
    }
}

pub fn test_config(cache_name: &str) -> WorkerConfig {
    WorkerConfig { cache_name: cache_name.into(), scope: "https://dash.example/".into(), ..Default::default() }
}

/// Registration with one installed worker on its own in-memory store.
pub async fn registration(mode: ActivationMode, net: Arc<StaticNetwork>, cache_name: &str) -> Arc<Registration> {
    registration_on(CacheDb::open_in_memory().await.unwrap(), mode, net, cache_name).await
}

pub async fn registration_on(
    db: CacheDb, mode: ActivationMode, net: Arc<StaticNetwork>, cache_name: &str,
) -> Arc<Registration> {
    let config = WorkerConfig { activation: mode, ..test_config(cache_name) };
    let (registration, _) = Registration::start(&config, db, net).await.unwrap();
    Arc::new(registration)
}

/// Registration whose worker installed with the network down.
pub async fn offline_registration() -> Arc<Registration> {
    let net = Arc::new(StaticNetwork::default());
    net.set_offline(true);
    registration(ActivationMode::UserGated, net, "v1").await
}

/// Parse the JSON text of the first content item.
pub fn output_json(result: &CallToolResult) -> serde_json::Value {
    let content = serde_json::to_value(&result.content[0]).unwrap();
    let text = content.get("text").and_then(|v| v.as_str()).unwrap();
    serde_json::from_str(text).unwrap()
}
