use std::sync::Once;

use mz_core::Language;
use tracing::{Level, Span};

use crate::paginate::RequestKind;

static INIT: Once = Once::new();

/// Installs a `fmt` subscriber at INFO unless the application already set one.
pub fn init_logging() {
    if !tracing::dispatcher::has_been_set() {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_max_level(Level::INFO)
                .try_init();
        });
    }
}

/// Span that tags every line of one listing with its query, e.g.
/// `listing{kind=chrono value=news language=ru}`.
pub(crate) fn listing_span(kind: RequestKind, value: &str, language: Language) -> Span {
    tracing::info_span!("listing", kind = %kind, value = %value, language = %language)
}
