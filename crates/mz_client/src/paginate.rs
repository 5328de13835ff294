use std::collections::VecDeque;
use std::fmt;

use futures::stream::{self, BoxStream, StreamExt};
use mz_core::{Article, Error, Language, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::Span;

use crate::client::Client;
use crate::logging::listing_span;

/// Key of the search query: a section listing or a full-text search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Chrono,
    Term,
}

pub const REQUEST_KINDS: [RequestKind; 2] = [RequestKind::Term, RequestKind::Chrono];

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Chrono => "chrono",
            RequestKind::Term => "term",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type ArticleStream = BoxStream<'static, Result<Article>>;
pub type RawArticleStream = BoxStream<'static, Result<Value>>;

/// Key the service uses for documents that must be read through their own
/// `root.url`.
const INDIRECT_KEY: &str = "nil";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    documents: Map<String, Value>,
    #[serde(default)]
    has_next: Option<bool>,
}

#[derive(Debug, PartialEq)]
pub(crate) struct SearchPage {
    pub references: Vec<String>,
    pub has_next: bool,
}

pub(crate) fn parse_search_page(response: Value) -> Result<SearchPage> {
    let response: SearchResponse = serde_json::from_value(response)
        .map_err(|e| Error::MalformedResponse(format!("search page: {}", e)))?;

    let references = response
        .documents
        .iter()
        .map(|(key, document)| {
            if key != INDIRECT_KEY {
                return Ok(key.clone());
            }
            document
                .pointer("/root/url")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    Error::MalformedResponse("indirect document without root.url".to_string())
                })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SearchPage {
        has_next: response.has_next.unwrap_or(true) && !references.is_empty(),
        references,
    })
}

/// Walks the search pages of one query and hands out references one by one.
///
/// A page is only requested once every reference of the previous one has
/// been handed out.
pub(crate) struct PageCursor {
    pub(crate) client: Client,
    kind: RequestKind,
    value: String,
    language: Language,
    next_page: u32,
    pages_fetched: u32,
    buffer: VecDeque<String>,
    exhausted: bool,
    pub(crate) span: Span,
}

impl PageCursor {
    pub(crate) fn new(
        client: Client,
        kind: RequestKind,
        value: &str,
        language: Language,
        start_page: u32,
    ) -> Self {
        let span = listing_span(kind, value, language);
        Self {
            client,
            kind,
            value: value.to_string(),
            language,
            next_page: start_page,
            pages_fetched: 0,
            buffer: VecDeque::new(),
            exhausted: false,
            span,
        }
    }

    pub(crate) async fn next_reference(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(reference) = self.buffer.pop_front() {
                return Ok(Some(reference));
            }
            if self.exhausted {
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }

    /// Drops what is left of the current page so the next reference comes
    /// from the following one. Returns the number of references dropped.
    pub(crate) fn start_next_page(&mut self) -> usize {
        let dropped = self.buffer.len();
        self.buffer.clear();
        dropped
    }

    async fn fetch_page(&mut self) -> Result<()> {
        let config = self.client.config();
        if let Some(max_pages) = config.max_pages {
            if self.pages_fetched >= max_pages {
                tracing::warn!(
                    parent: &self.span,
                    "stopping after {} pages (max_pages)",
                    self.pages_fetched
                );
                self.exhausted = true;
                return Ok(());
            }
        }

        let url = self.client.endpoints().search_url(
            self.kind,
            &self.value,
            self.language,
            self.next_page,
            config.page_size,
        )?;
        tracing::debug!(parent: &self.span, "fetching page {}", self.next_page);
        let response = self.client.fetch(&url).await?;
        self.pages_fetched += 1;
        self.next_page += 1;

        let page = parse_search_page(response)?;
        tracing::debug!(
            parent: &self.span,
            "page {} returned {} references",
            self.next_page - 1,
            page.references.len()
        );
        if !page.has_next {
            self.exhausted = true;
        }
        self.buffer.extend(page.references);
        Ok(())
    }
}

type Step<T> = Option<(T, (PageCursor, usize))>;

async fn next_article(mut cursor: PageCursor, remaining: usize) -> Result<Step<Article>> {
    if remaining == 0 {
        return Ok(None);
    }
    let reference = match cursor.next_reference().await? {
        Some(reference) => reference,
        None => return Ok(None),
    };
    let article = cursor.client.materialize(&reference).await?;
    Ok(Some((article, (cursor, remaining - 1))))
}

async fn next_payload(mut cursor: PageCursor, remaining: usize) -> Result<Step<Value>> {
    if remaining == 0 {
        return Ok(None);
    }
    let reference = match cursor.next_reference().await? {
        Some(reference) => reference,
        None => return Ok(None),
    };
    let payload = cursor.client.get_raw(&reference).await?;
    Ok(Some((payload, (cursor, remaining - 1))))
}

impl Client {
    /// Lazily materializes up to `count` articles of a search query.
    ///
    /// Nothing is requested until the stream is polled. The stream ends after
    /// `count` articles, when the service runs out of pages, or at the first
    /// error.
    pub fn paginate(
        &self,
        kind: RequestKind,
        value: &str,
        count: usize,
        language: Language,
        start_page: u32,
    ) -> ArticleStream {
        let cursor = PageCursor::new(self.clone(), kind, value, language, start_page);
        stream::try_unfold((cursor, count), |(cursor, remaining)| next_article(cursor, remaining))
            .boxed()
    }

    /// Same walk as [`Client::paginate`], yielding raw `root` payloads.
    pub fn paginate_raw(
        &self,
        kind: RequestKind,
        value: &str,
        count: usize,
        language: Language,
        start_page: u32,
    ) -> RawArticleStream {
        let cursor = PageCursor::new(self.clone(), kind, value, language, start_page);
        stream::try_unfold((cursor, count), |(cursor, remaining)| next_payload(cursor, remaining))
            .boxed()
    }

    /// Articles of a section, newest first.
    pub fn section(
        &self,
        section: &str,
        count: usize,
        language: Language,
        start_page: u32,
    ) -> ArticleStream {
        if !language.sections().contains(&section) {
            tracing::warn!("Section '{}' is not a known {} section", section, language);
        }
        self.paginate(RequestKind::Chrono, section, count, language, start_page)
    }

    /// Full-text search results.
    pub fn search(
        &self,
        term: &str,
        count: usize,
        language: Language,
        start_page: u32,
    ) -> ArticleStream {
        self.paginate(RequestKind::Term, term, count, language, start_page)
    }
}
