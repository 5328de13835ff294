pub mod catalog;
pub mod config;
pub mod error;
pub mod transport;
pub mod types;

pub use catalog::{Language, EN_SECTIONS, EN_TAGS, LANGUAGES, RU_SECTIONS, RU_TAGS};
pub use config::ApiConfig;
pub use error::{Error, Result};
pub use transport::JsonTransport;
pub use types::{
    Article, ArticleImage, Content, PushNotification, ReactionCount, StockQuote, StocksSnapshot,
};
