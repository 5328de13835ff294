use mz_core::{ApiConfig, Error, Language, Result};
use url::Url;

use crate::paginate::RequestKind;

/// Builds every service URL from an [`ApiConfig`].
#[derive(Debug, Clone)]
pub struct Endpoints {
    origin: String,
    article_prefix: String,
    search_prefix: String,
    misc_prefix: String,
    push_prefix: String,
    legacy_prefixes: Vec<String>,
}

fn trim_segment(segment: &str) -> String {
    segment.trim_matches('/').to_string()
}

impl Endpoints {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            origin: config.origin().to_string(),
            article_prefix: trim_segment(&config.article_prefix),
            search_prefix: trim_segment(&config.search_prefix),
            misc_prefix: trim_segment(&config.misc_prefix),
            push_prefix: trim_segment(&config.push_prefix),
            legacy_prefixes: config
                .legacy_prefixes
                .iter()
                .map(|p| trim_segment(p))
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Turns a relative or public article URL into its API URL.
    ///
    /// Relative input is joined to the origin, a legacy version segment is
    /// swapped for the current one, and the current segment is inserted
    /// right after the origin when the path does not start with it yet.
    /// Input that lands on another host, scheme-relative `//host/...`
    /// included, fails with `Error::InvalidUrl`.
    pub fn resolve_article_url(&self, input: &str) -> Result<String> {
        let input = input.trim();
        let joined = if self.strip_origin(input).is_some() {
            input.to_string()
        } else {
            Url::parse(&format!("{}/", self.origin))?.join(input)?.to_string()
        };

        let rest = match self.strip_origin(&joined) {
            Some(rest) => rest,
            None => {
                return Err(Error::InvalidUrl(format!(
                    "{} is not an article of {}",
                    joined, self.origin
                )))
            }
        };
        let path = rest.trim_start_matches('/');

        if starts_with_segment(path, &self.article_prefix) {
            return Ok(joined);
        }
        for legacy in &self.legacy_prefixes {
            if starts_with_segment(path, legacy) {
                let tail = &path[legacy.len()..];
                return Ok(format!("{}/{}{}", self.origin, self.article_prefix, tail));
            }
        }
        Ok(format!("{}/{}/{}", self.origin, self.article_prefix, path))
    }

    fn strip_origin<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.origin.as_str())
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    pub fn search_url(
        &self,
        kind: RequestKind,
        value: &str,
        language: Language,
        page: u32,
        per_page: u32,
    ) -> Result<String> {
        let mut url = Url::parse(&format!("{}/{}/search", self.origin, self.search_prefix))?;
        url.query_pairs_mut()
            .append_pair(kind.as_str(), value)
            .append_pair("locale", language.as_str())
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &per_page.to_string());
        Ok(url.to_string())
    }

    /// One request carrying every link as a JSON array.
    pub fn social_url<S: AsRef<str>>(&self, links: &[S]) -> Result<String> {
        let links: Vec<&str> = links.iter().map(|l| l.as_ref()).collect();
        let mut url = Url::parse(&format!("{}/{}/social", self.origin, self.misc_prefix))?;
        url.query_pairs_mut()
            .append_pair("links", &serde_json::to_string(&links)?);
        Ok(url.to_string())
    }

    pub fn stocks_url(&self) -> String {
        format!("{}/{}/stock/all", self.origin, self.misc_prefix)
    }

    pub fn latest_push_url(&self) -> String {
        format!("{}/{}/push/chrome/latest", self.origin, self.push_prefix)
    }
}

fn starts_with_segment(path: &str, segment: &str) -> bool {
    path.strip_prefix(segment)
        .map(|tail| tail.is_empty() || tail.starts_with('/'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLUG: &str = "feature/2018/07/03/astronomam-udalos-zafiksirovat-rozhdenie-novoy-planety";

    fn endpoints() -> Endpoints {
        Endpoints::new(&ApiConfig::default())
    }

    #[test]
    fn test_resolve_relative() {
        let expected = format!("https://meduza.io/api/w5/{}", SLUG);
        assert_eq!(endpoints().resolve_article_url(SLUG).unwrap(), expected);
        assert_eq!(endpoints().resolve_article_url(&format!("/{}", SLUG)).unwrap(), expected);
    }

    #[test]
    fn test_resolve_absolute() {
        let expected = format!("https://meduza.io/api/w5/{}", SLUG);
        let public = format!("https://meduza.io/{}", SLUG);
        assert_eq!(endpoints().resolve_article_url(&public).unwrap(), expected);
        assert_eq!(endpoints().resolve_article_url(&expected).unwrap(), expected);
    }

    #[test]
    fn test_resolve_legacy_segment() {
        let legacy = format!("https://meduza.io/api/v3/{}", SLUG);
        assert_eq!(
            endpoints().resolve_article_url(&legacy).unwrap(),
            format!("https://meduza.io/api/w5/{}", SLUG)
        );
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let inputs = [
            SLUG.to_string(),
            format!("/{}", SLUG),
            format!("https://meduza.io/{}", SLUG),
            format!("https://meduza.io/api/w5/{}", SLUG),
            format!("https://meduza.io/api/v3/{}", SLUG),
            "/news/2024/01/01/apiw5-is-not-a-prefix".to_string(),
        ];
        let endpoints = endpoints();
        for input in inputs {
            let once = endpoints.resolve_article_url(&input).unwrap();
            let twice = endpoints.resolve_article_url(&once).unwrap();
            assert_eq!(once, twice, "not idempotent for {}", input);
        }
    }

    #[test]
    fn test_resolve_uses_configured_segment() {
        let config = ApiConfig {
            article_prefix: "/api/w6/".to_string(),
            legacy_prefixes: vec!["api/v3".to_string(), "api/w5".to_string()],
            ..ApiConfig::default()
        };
        let endpoints = Endpoints::new(&config);
        assert_eq!(
            endpoints.resolve_article_url("https://meduza.io/api/w5/news/1").unwrap(),
            "https://meduza.io/api/w6/news/1"
        );
        assert_eq!(
            endpoints.resolve_article_url("news/1").unwrap(),
            "https://meduza.io/api/w6/news/1"
        );
    }

    #[test]
    fn test_foreign_host_is_rejected() {
        for input in [
            "https://example.com/news/1",
            "//evil.example/x",
            "https://meduza.io.evil.example/news/1",
            "http://meduza.io/news/1",
        ] {
            assert!(
                matches!(endpoints().resolve_article_url(input), Err(Error::InvalidUrl(_))),
                "accepted {}",
                input
            );
        }
    }

    #[test]
    fn test_search_url() {
        let url = endpoints()
            .search_url(RequestKind::Chrono, "news", Language::En, 2, 24)
            .unwrap();
        assert_eq!(
            url,
            "https://meduza.io/api/w5/search?chrono=news&locale=en&page=2&per_page=24"
        );

        let url = endpoints()
            .search_url(RequestKind::Term, "собака", Language::Ru, 0, 24)
            .unwrap();
        let parsed = Url::parse(&url).unwrap();
        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("term".to_string(), "собака".to_string()));
    }

    #[test]
    fn test_social_url() {
        let url = endpoints().social_url(&["/news/1", "/news/2"]).unwrap();
        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.path(), "/api/misc/social");
        let (key, links) = parsed.query_pairs().next().unwrap();
        assert_eq!(key, "links");
        assert_eq!(links, r#"["/news/1","/news/2"]"#);
    }

    #[test]
    fn test_fixed_endpoints() {
        assert_eq!(endpoints().stocks_url(), "https://meduza.io/api/misc/stock/all");
        assert_eq!(endpoints().latest_push_url(), "https://meduza.io/api/v3/push/chrome/latest");
    }
}
