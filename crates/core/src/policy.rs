//! Request classification.
//!
//! Decides which fetch strategy handles an intercepted request. Precedence,
//! first match wins:
//!
//! 1. Path ends with the dynamic config filename: always network, cache-busted.
//! 2. Navigable document (destination `document` or mode `navigate`): network first.
//! 3. Anything else: cache first.
//!
//! Classification does no I/O and is recomputed for every request.

use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

/// Default filename of the dynamic JSON configuration document.
pub const DEFAULT_DYNAMIC_CONFIG_FILE: &str = "buttons.json";

/// What the requested resource will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// No destination (e.g., `fetch()` from script).
    #[default]
    #[serde(rename = "")]
    Empty,
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    /// Any destination not listed above.
    Other,
}

impl FromStr for Destination {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "" => Destination::Empty,
            "document" => Destination::Document,
            "script" => Destination::Script,
            "style" => Destination::Style,
            "image" => Destination::Image,
            "font" => Destination::Font,
            "manifest" => Destination::Manifest,
            _ => Destination::Other,
        })
    }
}

/// Request mode as seen by the interception layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    Navigate,
    SameOrigin,
    #[default]
    NoCors,
    Cors,
}

impl FromStr for RequestMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "navigate" => Ok(RequestMode::Navigate),
            "same-origin" => Ok(RequestMode::SameOrigin),
            "no-cors" | "" => Ok(RequestMode::NoCors),
            "cors" => Ok(RequestMode::Cors),
            other => Err(format!("unknown request mode: {other}")),
        }
    }
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub url: Url,
    pub method: String,
    pub destination: Destination,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    /// A plain `GET` for a sub-resource.
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: "GET".to_string(),
            destination: Destination::Empty,
            mode: RequestMode::NoCors,
            headers: Vec::new(),
        }
    }

    /// A top-level navigation to `url`.
    pub fn navigate(url: Url) -> Self {
        Self { destination: Destination::Document, mode: RequestMode::Navigate, ..Self::get(url) }
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into().to_ascii_uppercase();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Whether the request targets a navigable document.
    pub fn is_navigation(&self) -> bool {
        self.destination == Destination::Document || self.mode == RequestMode::Navigate
    }
}

/// The strategy chosen for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Always hit the network with a cache-busting query; fall back to the
    /// cached copy, then to an empty config document.
    AlwaysNetworkBusted,
    /// Network with cache bypass; fall back to the cached copy, then to an
    /// offline page.
    NetworkFirst,
    /// Serve from cache; fill from network on miss.
    CacheFirst,
}

/// Classification rules for one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPolicy {
    dynamic_config_file: String,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_DYNAMIC_CONFIG_FILE)
    }
}

impl FetchPolicy {
    pub fn new(dynamic_config_file: impl Into<String>) -> Self {
        Self { dynamic_config_file: dynamic_config_file.into() }
    }

    /// Pick the strategy for `request`.
    pub fn classify(&self, request: &RequestDescriptor) -> Strategy {
        if request.url.path().ends_with(self.dynamic_config_file.as_str()) {
            Strategy::AlwaysNetworkBusted
        } else if request.is_navigation() {
            Strategy::NetworkFirst
        } else {
            Strategy::CacheFirst
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_classification_table() {
        let policy = FetchPolicy::default();
        let cases = [
            (RequestDescriptor::get(url("https://dash.example/buttons.json")), Strategy::AlwaysNetworkBusted),
            (RequestDescriptor::get(url("https://dash.example/app/buttons.json?x=1")), Strategy::AlwaysNetworkBusted),
            (RequestDescriptor::navigate(url("https://dash.example/buttons.json")), Strategy::AlwaysNetworkBusted),
            (RequestDescriptor::navigate(url("https://dash.example/")), Strategy::NetworkFirst),
            (
                RequestDescriptor::get(url("https://dash.example/index.html")).with_destination(Destination::Document),
                Strategy::NetworkFirst,
            ),
            (
                RequestDescriptor::get(url("https://dash.example/other")).with_mode(RequestMode::Navigate),
                Strategy::NetworkFirst,
            ),
            (
                RequestDescriptor::get(url("https://dash.example/app.js")).with_destination(Destination::Script),
                Strategy::CacheFirst,
            ),
            (RequestDescriptor::get(url("https://dash.example/manifest.json")), Strategy::CacheFirst),
            (RequestDescriptor::get(url("https://cdn.example/font.woff2")), Strategy::CacheFirst),
        ];

        for (request, expected) in cases {
            assert_eq!(policy.classify(&request), expected, "{}", request.url);
        }
    }

    #[test]
    fn test_query_does_not_affect_config_match() {
        let policy = FetchPolicy::default();
        let request = RequestDescriptor::get(url("https://dash.example/index.html?file=buttons.json"));
        assert_eq!(policy.classify(&request), Strategy::CacheFirst);
    }

    #[test]
    fn test_custom_config_filename() {
        let policy = FetchPolicy::new("tiles.json");
        assert_eq!(policy.classify(&RequestDescriptor::get(url("https://d.example/tiles.json"))), Strategy::AlwaysNetworkBusted);
        assert_eq!(policy.classify(&RequestDescriptor::get(url("https://d.example/buttons.json"))), Strategy::CacheFirst);
    }

    #[test]
    fn test_destination_parsing() {
        assert_eq!("document".parse::<Destination>().unwrap(), Destination::Document);
        assert_eq!("".parse::<Destination>().unwrap(), Destination::Empty);
        assert_eq!("audioworklet".parse::<Destination>().unwrap(), Destination::Other);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("navigate".parse::<RequestMode>().unwrap(), RequestMode::Navigate);
        assert_eq!("same-origin".parse::<RequestMode>().unwrap(), RequestMode::SameOrigin);
        assert!("teleport".parse::<RequestMode>().is_err());
    }

    #[test]
    fn test_with_method_uppercases() {
        let request = RequestDescriptor::get(url("https://dash.example/")).with_method("post");
        assert_eq!(request.method, "POST");
    }
}
