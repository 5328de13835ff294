use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use mz_core::{
    ApiConfig, Article, Error, JsonTransport, PushNotification, ReactionCount, Result,
    StockQuote, StocksSnapshot,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::transport::HttpTransport;
use crate::urls::Endpoints;

/// Entry point to every endpoint of the service.
///
/// Cloning is cheap; clones share the transport and configuration.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn JsonTransport>,
    endpoints: Arc<Endpoints>,
    config: Arc<ApiConfig>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("transport", &"<dyn JsonTransport>")
            .field("endpoints", &self.endpoints)
            .field("config", &self.config)
            .finish()
    }
}

impl Client {
    pub fn new(config: ApiConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(config: ApiConfig, transport: Arc<dyn JsonTransport>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transport,
            endpoints: Arc::new(Endpoints::new(&config)),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub(crate) async fn fetch(&self, url: &str) -> Result<Value> {
        self.transport.get_json(url).await
    }

    /// Returns the raw `root` payload of an article.
    pub async fn get_raw(&self, reference: &str) -> Result<Value> {
        let url = self.endpoints.resolve_article_url(reference)?;
        debug!("Fetching article {}", url);
        let mut response = self.fetch(&url).await?;
        match response.get_mut("root") {
            Some(root) if root.is_object() => Ok(root.take()),
            _ => Err(Error::MalformedResponse(format!("no root object in {}", url))),
        }
    }

    pub async fn get(&self, reference: &str) -> Result<Article> {
        let payload = self.get_raw(reference).await?;
        Article::from_payload(&payload, self.endpoints.origin())
    }

    /// Like [`Client::get`], plus one request for the article's reaction
    /// counts.
    pub async fn get_with_reactions(&self, reference: &str) -> Result<Article> {
        let article = self.get(reference).await?;
        self.attach_reactions(article).await
    }

    /// Article fetch used by listings; honours `fetch_reactions`.
    pub(crate) async fn materialize(&self, reference: &str) -> Result<Article> {
        if self.config.fetch_reactions {
            self.get_with_reactions(reference).await
        } else {
            self.get(reference).await
        }
    }

    pub(crate) async fn attach_reactions(&self, article: Article) -> Result<Article> {
        // The social endpoint is keyed by the site-relative URL.
        let key = article
            .url
            .strip_prefix(self.endpoints.origin())
            .unwrap_or(article.url.as_str())
            .trim_start_matches('/')
            .to_string();
        let mut reactions = self.reactions_for(&[key.as_str()]).await?;
        let counts = reactions.remove(&key).unwrap_or_default();
        Ok(article.with_reactions(counts))
    }

    pub async fn stocks(&self) -> Result<StocksSnapshot> {
        let response = self.fetch(&self.endpoints.stocks_url()).await?;
        serde_json::from_value(response)
            .map_err(|e| Error::MalformedResponse(format!("stocks: {}", e)))
    }

    pub async fn stock(&self, key: &str) -> Result<StockQuote> {
        self.stocks()
            .await?
            .remove(key)
            .ok_or_else(|| Error::MissingField(format!("stock '{}'", key)))
    }

    /// Reaction counts for a batch of article URLs, in a single request.
    ///
    /// Every input URL gets an entry; URLs the service leaves out count as
    /// zero.
    pub async fn reactions_for<S: AsRef<str>>(
        &self,
        urls: &[S],
    ) -> Result<HashMap<String, ReactionCount>> {
        let response = self.fetch(&self.endpoints.social_url(urls)?).await?;
        let entries = response
            .as_object()
            .ok_or_else(|| Error::MalformedResponse("social counters are not an object".to_string()))?;

        let mut reactions: HashMap<String, ReactionCount> = entries
            .iter()
            .map(|(url, entry)| {
                let stats = entry.get("stats").unwrap_or(entry);
                (url.clone(), ReactionCount::from_stats(stats))
            })
            .collect();

        for url in urls {
            let url = url.as_ref();
            if !reactions.contains_key(url) {
                warn!("No reaction counters returned for {}", url);
                reactions.insert(url.to_string(), ReactionCount::default());
            }
        }
        Ok(reactions)
    }

    pub async fn latest_push(&self) -> Result<PushNotification> {
        let mut response = self.fetch(&self.endpoints.latest_push_url()).await?;
        let notification = response
            .get_mut("notification")
            .map(Value::take)
            .ok_or_else(|| Error::MissingField("notification".to_string()))?;
        serde_json::from_value(notification)
            .map_err(|e| Error::MalformedResponse(format!("push notification: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StaticTransport {
        responses: HashMap<String, Value>,
        requests: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl JsonTransport for StaticTransport {
        async fn get_json(&self, url: &str) -> Result<Value> {
            self.requests.lock().unwrap().push(url.to_string());
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| Error::Status { url: url.to_string(), status: 404 })
        }
    }

    fn client(responses: Vec<(String, Value)>) -> (Client, Arc<StaticTransport>) {
        let transport = Arc::new(StaticTransport {
            responses: responses.into_iter().collect(),
            ..Default::default()
        });
        let client = Client::with_transport(ApiConfig::default(), transport.clone()).unwrap();
        (client, transport)
    }

    fn article_json(url: &str) -> Value {
        json!({
            "root": {
                "url": url,
                "title": "Title",
                "tag": {"name": "новости"},
                "content": {"body": "<p>text</p>"},
                "published_at": 1700000000
            }
        })
    }

    #[tokio::test]
    async fn test_get_resolves_reference() {
        let (client, transport) = client(vec![(
            "https://meduza.io/api/w5/news/2023/11/14/one".to_string(),
            article_json("news/2023/11/14/one"),
        )]);

        let article = client.get("/news/2023/11/14/one").await.unwrap();
        assert_eq!(article.url, "https://meduza.io/news/2023/11/14/one");
        assert!(article.reactions.is_none());

        let raw = client.get_raw("https://meduza.io/news/2023/11/14/one").await.unwrap();
        assert_eq!(raw["title"], "Title");
        assert_eq!(transport.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_root() {
        let (client, _) = client(vec![(
            "https://meduza.io/api/w5/news/1".to_string(),
            json!({"error": "gone"}),
        )]);
        assert!(matches!(client.get("news/1").await, Err(Error::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_get_with_reactions_is_one_extra_request() {
        let endpoints = Endpoints::new(&ApiConfig::default());
        let (client, transport) = client(vec![
            (
                "https://meduza.io/api/w5/news/1".to_string(),
                article_json("news/1"),
            ),
            (
                endpoints.social_url(&["news/1"]).unwrap(),
                json!({"news/1": {"stats": {"vk": 1, "fb": 2, "reactions": 3}}}),
            ),
        ]);

        let article = client.get_with_reactions("news/1").await.unwrap();
        assert_eq!(article.reactions.unwrap().total(), 6);
        assert_eq!(transport.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_stocks() {
        let (client, _) = client(vec![(
            "https://meduza.io/api/misc/stock/all".to_string(),
            json!({
                "usd": {"current": 91.5, "prev": 90.1, "state": "up"},
                "eur": {"current": 99.2, "prev": 99.9, "state": "down"}
            }),
        )]);

        let snapshot = client.stocks().await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(client.stock("usd").await.unwrap().current, 91.5);
        assert!(matches!(client.stock("btc").await, Err(Error::MissingField(_))));
    }

    #[tokio::test]
    async fn test_latest_push() {
        let (client, _) = client(vec![(
            "https://meduza.io/api/v3/push/chrome/latest".to_string(),
            json!({"notification": {"title": "Breaking", "body": "Something happened", "url": "/news/1", "id": 7}}),
        )]);

        let push = client.latest_push().await.unwrap();
        assert_eq!(push.title, "Breaking");
        assert_eq!(push.url, "/news/1");
    }

    #[tokio::test]
    async fn test_transport_errors_surface() {
        let (client, _) = client(vec![]);
        let err = client.latest_push().await.unwrap_err();
        assert!(err.is_transport());
    }
}
