use futures::stream::{self, StreamExt};
use mz_core::{Article, Language, Result};

use crate::client::Client;
use crate::paginate::{ArticleStream, PageCursor, RequestKind};

/// State of a tag listing: the section walk plus what is left to find.
struct TagScan {
    cursor: PageCursor,
    tag: String,
    wanted: usize,
    batch: usize,
    budget: usize,
}

impl TagScan {
    async fn next_match(mut self) -> Result<Option<(Article, TagScan)>> {
        while self.wanted > 0 {
            if self.budget == 0 {
                // A batch that ran dry resumes on the following page.
                let dropped = self.cursor.start_next_page();
                tracing::debug!(
                    parent: &self.cursor.span,
                    "batch of {} ran dry with {} matches missing, skipping {} references",
                    self.batch,
                    self.wanted,
                    dropped
                );
                self.budget = self.batch;
            }

            let reference = match self.cursor.next_reference().await? {
                Some(reference) => reference,
                None => {
                    tracing::debug!(
                        parent: &self.cursor.span,
                        "section exhausted with {} matches missing",
                        self.wanted
                    );
                    return Ok(None);
                }
            };
            self.budget -= 1;

            let client = &self.cursor.client;
            let article = client.get(&reference).await?;
            if !article.has_tag(&self.tag) {
                continue;
            }
            let article = if client.config().fetch_reactions {
                client.attach_reactions(article).await?
            } else {
                article
            };
            self.wanted -= 1;
            return Ok(Some((article, self)));
        }
        Ok(None)
    }
}

impl Client {
    /// Lazily yields up to `count` articles carrying `tag`.
    ///
    /// The owning section is looked up first, so an unknown tag fails before
    /// any request is made. The section is read in batches of
    /// `count * tag_scan_factor` articles. When a batch ends short of `count`
    /// matches, the rest of its last page is skipped and a new batch starts on
    /// the next page. The listing ends once `count` matches are found or the
    /// section runs out.
    pub fn tag(&self, tag: &str, count: usize, language: Language) -> Result<ArticleStream> {
        let section = language.require_section_for_tag(tag)?;
        let batch = count.saturating_mul(self.config().tag_scan_factor).max(1);
        let cursor = PageCursor::new(self.clone(), RequestKind::Chrono, section, language, 0);
        tracing::debug!(
            parent: &cursor.span,
            "tag '{}' lives in section '{}', batches of {}",
            tag,
            section,
            batch
        );

        let scan = TagScan {
            cursor,
            tag: tag.to_string(),
            wanted: count,
            batch,
            budget: batch,
        };
        Ok(stream::try_unfold(scan, TagScan::next_match).boxed())
    }
}
