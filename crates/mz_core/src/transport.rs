use async_trait::async_trait;
use serde_json::Value;

use crate::Result;

/// Issues a GET request and returns the decoded JSON document.
///
/// Implementations perform exactly one request per call and never retry.
#[async_trait]
pub trait JsonTransport: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value>;
}
