//! Client for the JSON API behind meduza.io.
//!
//! [`Client`] covers every endpoint. The free functions below build a client
//! with the default [`ApiConfig`] for one-off calls.

pub mod client;
pub mod logging;
pub mod paginate;
pub mod tags;
pub mod transport;
pub mod urls;

use std::collections::HashMap;

pub use client::Client;
pub use logging::init_logging;
pub use mz_core::{
    ApiConfig, Article, ArticleImage, Content, Error, JsonTransport, Language, PushNotification,
    ReactionCount, Result, StockQuote, StocksSnapshot, EN_SECTIONS, EN_TAGS, LANGUAGES,
    RU_SECTIONS, RU_TAGS,
};
pub use paginate::{ArticleStream, RawArticleStream, RequestKind, REQUEST_KINDS};
pub use transport::HttpTransport;
pub use urls::Endpoints;

pub mod prelude {
    pub use super::paginate::{ArticleStream, RequestKind};
    pub use super::Client;
    pub use futures::{StreamExt, TryStreamExt};
    pub use mz_core::{ApiConfig, Article, Error, Language, Result};
}

fn default_client() -> Result<Client> {
    Client::new(ApiConfig::default())
}

pub async fn stocks() -> Result<StocksSnapshot> {
    default_client()?.stocks().await
}

pub async fn get(url: &str) -> Result<Article> {
    default_client()?.get(url).await
}

pub fn section(section: &str, count: usize, language: Language) -> Result<ArticleStream> {
    Ok(default_client()?.section(section, count, language, 0))
}

pub fn search(term: &str, count: usize, language: Language) -> Result<ArticleStream> {
    Ok(default_client()?.search(term, count, language, 0))
}

pub fn tag(tag: &str, count: usize, language: Language) -> Result<ArticleStream> {
    default_client()?.tag(tag, count, language)
}

pub async fn reactions_for<S: AsRef<str>>(urls: &[S]) -> Result<HashMap<String, ReactionCount>> {
    default_client()?.reactions_for(urls).await
}

pub async fn latest_push() -> Result<PushNotification> {
    default_client()?.latest_push().await
}

/// True when `article` was published on the current local date.
pub fn is_today(article: &Article) -> bool {
    article.is_today()
}
