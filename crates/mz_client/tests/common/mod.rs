#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mz_client::{ApiConfig, Client, Endpoints, Error, JsonTransport, Language, RequestKind, Result};
use serde_json::{json, Map, Value};

/// Serves canned JSON per URL and records every request it receives.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<String, Value>>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn search_requests(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|url| url.contains("/search?"))
            .collect()
    }

    pub fn respond(&self, url: String, body: Value) {
        self.responses.lock().unwrap().insert(url, body);
    }
}

#[async_trait]
impl JsonTransport for MockTransport {
    async fn get_json(&self, url: &str) -> Result<Value> {
        self.requests.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// A client wired to a fresh mock transport plus helpers to describe what
/// the service returns.
pub struct Fixture {
    pub client: Client,
    pub transport: Arc<MockTransport>,
    pub endpoints: Endpoints,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(ApiConfig::default())
    }

    pub fn with_config(config: ApiConfig) -> Self {
        let transport = Arc::new(MockTransport::default());
        let endpoints = Endpoints::new(&config);
        let client = Client::with_transport(config, transport.clone()).unwrap();
        Self {
            client,
            transport,
            endpoints,
        }
    }

    pub fn search_url(&self, kind: RequestKind, value: &str, language: Language, page: u32) -> String {
        let per_page = self.client.config().page_size;
        self.endpoints
            .search_url(kind, value, language, page, per_page)
            .unwrap()
    }

    /// Registers one search page listing `references` in order.
    pub fn page(
        &self,
        kind: RequestKind,
        value: &str,
        language: Language,
        page: u32,
        references: &[&str],
    ) {
        let documents: Map<String, Value> = references
            .iter()
            .map(|r| (r.to_string(), json!({})))
            .collect();
        self.transport.respond(
            self.search_url(kind, value, language, page),
            json!({ "documents": documents }),
        );
    }

    pub fn raw_page(&self, kind: RequestKind, value: &str, language: Language, page: u32, body: Value) {
        self.transport
            .respond(self.search_url(kind, value, language, page), body);
    }

    /// Registers the article behind `reference`.
    pub fn article(&self, reference: &str, tag: &str) {
        let url = self.endpoints.resolve_article_url(reference).unwrap();
        self.transport.respond(
            url,
            json!({
                "root": {
                    "url": reference,
                    "title": format!("Title of {}", reference),
                    "tag": {"name": tag},
                    "document_type": "news",
                    "content": {"blocks": [{"type": "p", "data": reference}]},
                    "published_at": 1700000000,
                    "modified_at": 1700000600
                }
            }),
        );
    }

    pub fn reactions(&self, links: &[&str], body: Value) {
        self.transport
            .respond(self.endpoints.social_url(links).unwrap(), body);
    }
}
