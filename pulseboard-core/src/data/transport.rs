//! JSON-over-HTTP transport seam.
//!
//! Adapters talk to a `JsonTransport` rather than to `reqwest` directly, so the
//! same adapter code runs against the network or against canned fixtures.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::provider::FetchError;

/// Issues one GET and returns the parsed JSON body.
#[async_trait]
pub trait JsonTransport: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError>;
}

/// `reqwest`-backed transport with a request timeout and a fixed user agent.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl JsonTransport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        debug!(url, "GET");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        resp.json::<Value>()
            .await
            .map_err(|e| FetchError::malformed(url, format!("body is not JSON: {e}")))
    }
}

/// Deserialize an upstream body, reporting shape mismatches as `Malformed`.
pub fn decode<T: DeserializeOwned>(source_name: &str, body: Value) -> Result<T, FetchError> {
    serde_json::from_value(body).map_err(|e| FetchError::malformed(source_name, e.to_string()))
}

/// Canned responses keyed by exact URL, for tests and offline demos.
///
/// Unknown URLs answer HTTP 404. Every request is recorded.
#[derive(Default)]
pub struct FixtureTransport {
    routes: Mutex<HashMap<String, Result<Value, FetchError>>>,
    requests: Mutex<Vec<String>>,
}

impl FixtureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(self, url: impl Into<String>, body: Value) -> Self {
        self.set(url, Ok(body));
        self
    }

    pub fn with_error(self, url: impl Into<String>, err: FetchError) -> Self {
        self.set(url, Err(err));
        self
    }

    /// Replace the answer for one URL.
    pub fn set(&self, url: impl Into<String>, answer: Result<Value, FetchError>) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.into(), answer);
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl JsonTransport for FixtureTransport {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
            .unwrap_or_else(|| {
                Err(FetchError::Status {
                    status: 404,
                    url: url.to_string(),
                })
            })
    }
}
