use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Absolute public URL of the article.
    pub url: String,
    pub title: String,
    pub second_title: Option<String>,
    pub description: Option<String>,
    pub source: Option<String>,
    pub tag: Option<String>,
    pub document_type: Option<String>,
    pub footer: Option<String>,
    pub image: Option<ArticleImage>,
    pub content: Option<Content>,
    pub published_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    pub reactions: Option<ReactionCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleImage {
    pub url: String,
    pub caption: Option<String>,
    pub credit: Option<String>,
}

/// Body of an article. Block and slide documents carry structured items,
/// everything else a single HTML string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Content {
    Blocks(Vec<Value>),
    Slides(Vec<Value>),
    Body(String),
}

impl Content {
    pub fn blocks(&self) -> Option<&[Value]> {
        match self {
            Content::Blocks(items) | Content::Slides(items) => Some(items),
            Content::Body(_) => None,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            Content::Body(html) => Some(html),
            _ => None,
        }
    }
}

/// Reaction counters of one article, keyed by channel (`vk`, `fb`, `ok`,
/// `reactions`...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCount {
    pub channels: BTreeMap<String, u64>,
}

impl ReactionCount {
    /// Reads every numeric field of a stats object. Non-numeric fields are
    /// ignored.
    pub fn from_stats(stats: &Value) -> Self {
        let channels = stats
            .as_object()
            .map(|obj| {
                obj.iter()
                    .filter_map(|(name, value)| {
                        let count = value
                            .as_u64()
                            .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))?;
                        Some((name.clone(), count))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { channels }
    }

    pub fn get(&self, channel: &str) -> u64 {
        self.channels.get(channel).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.channels.values().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockQuote {
    pub current: f64,
    /// Change fields (`prev`, `state`...) as the service reports them.
    #[serde(flatten)]
    pub changes: BTreeMap<String, Value>,
}

pub type StocksSnapshot = BTreeMap<String, StockQuote>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
    pub url: String,
}

impl Article {
    /// Builds an article from the `root` object of an article response.
    ///
    /// `base_url` is used to absolutize the article and image URLs, which the
    /// service reports relative to the site origin.
    pub fn from_payload(payload: &Value, base_url: &str) -> Result<Self> {
        let obj = payload
            .as_object()
            .ok_or_else(|| Error::MalformedArticle("payload is not an object".to_string()))?;

        let url = required_str(payload, "url")?;
        let title = required_str(payload, "title")?;
        let published_at = payload
            .get("published_at")
            .and_then(epoch_to_utc)
            .ok_or_else(|| Error::MalformedArticle(format!("missing published_at for {}", url)))?;

        let source = match obj.get("source") {
            Some(Value::String(name)) => Some(name.clone()),
            Some(other) => other.get("name").and_then(Value::as_str).map(str::to_string),
            None => None,
        };

        Ok(Self {
            url: absolutize(base_url, url)?,
            title: title.to_string(),
            second_title: optional_str(payload, "second_title"),
            description: optional_str(payload, "description"),
            source,
            tag: payload.pointer("/tag/name").and_then(Value::as_str).map(str::to_string),
            document_type: optional_str(payload, "document_type"),
            footer: optional_str(payload, "footer"),
            image: parse_image(obj.get("image"), base_url)?,
            content: parse_content(obj.get("content"), url)?,
            published_at,
            modified_at: payload.get("modified_at").and_then(epoch_to_utc),
            reactions: None,
        })
    }

    pub fn with_reactions(mut self, reactions: ReactionCount) -> Self {
        self.reactions = Some(reactions);
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag.as_deref() == Some(tag)
    }

    /// True when the article was published on `date` in the local calendar.
    pub fn published_on(&self, date: NaiveDate) -> bool {
        self.published_at.with_timezone(&Local).date_naive() == date
    }

    /// True when the article was published on the current local date.
    pub fn is_today(&self) -> bool {
        self.published_on(Local::now().date_naive())
    }
}

fn required_str<'a>(payload: &'a Value, key: &str) -> Result<&'a str> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::MalformedArticle(format!("missing {}", key)))
}

fn optional_str(payload: &Value, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn epoch_to_utc(value: &Value) -> Option<DateTime<Utc>> {
    if let Some(secs) = value.as_i64() {
        return Utc.timestamp_opt(secs, 0).single();
    }
    let secs = value.as_f64()?;
    if !secs.is_finite() {
        return None;
    }
    // Nanoseconds count forward from the floored second, also before 1970.
    let whole = secs.floor();
    let nanos = (((secs - whole) * 1e9).round() as u32).min(999_999_999);
    Utc.timestamp_opt(whole as i64, nanos).single()
}

fn absolutize(base_url: &str, url: &str) -> Result<String> {
    if url.starts_with("http://") || url.starts_with("https://") {
        return Ok(url.to_string());
    }
    Ok(Url::parse(base_url)?.join(url)?.to_string())
}

fn parse_image(image: Option<&Value>, base_url: &str) -> Result<Option<ArticleImage>> {
    let image = match image {
        Some(image) if image.is_object() => image,
        _ => return Ok(None),
    };
    let url = image
        .get("large_url")
        .and_then(Value::as_str)
        .or_else(|| image.get("small_url").and_then(Value::as_str));
    let url = match url {
        Some(url) => absolutize(base_url, url)?,
        None => return Ok(None),
    };
    Ok(Some(ArticleImage {
        url,
        caption: optional_str(image, "caption"),
        credit: optional_str(image, "credit"),
    }))
}

fn parse_content(content: Option<&Value>, url: &str) -> Result<Option<Content>> {
    let content = match content {
        Some(Value::Null) | None => return Ok(None),
        Some(content) => content,
    };
    if let Some(blocks) = content.get("blocks").and_then(Value::as_array) {
        return Ok(Some(Content::Blocks(blocks.clone())));
    }
    if let Some(slides) = content.get("slides").and_then(Value::as_array) {
        return Ok(Some(Content::Slides(slides.clone())));
    }
    if let Some(body) = content.get("body").and_then(Value::as_str) {
        return Ok(Some(Content::Body(body.to_string())));
    }
    Err(Error::MalformedArticle(format!(
        "content of {} has neither blocks, slides nor body",
        url
    )))
}
