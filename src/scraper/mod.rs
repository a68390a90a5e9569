pub mod cleaner;
pub mod http_client;
pub mod parsers;

use crate::error::FetchError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use url::Url;

pub use self::http_client::HttpClient;
pub use self::parsers::extract_books;

// ── Source trait ──────────────────────────────────────────────────────────────

/// Where listing pages come from. `HttpClient` in production.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError>;
}

// ── Catalogue layout ──────────────────────────────────────────────────────────

/// A catalogue addressed as `{base}page-{n}.html` for `n` in `1..=page_count`.
#[derive(Debug, Clone)]
pub struct Catalogue {
    base: Url,
    page_count: u32,
}

impl Catalogue {
    pub fn new(base_url: &str, page_count: u32) -> Result<Self> {
        // Without the trailing slash `join` would replace the last segment.
        let normalised = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base = Url::parse(&normalised)
            .with_context(|| format!("Invalid catalogue base URL {:?}", base_url))?;
        Ok(Self { base, page_count })
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// URL for listing page `page` (1-based).
    pub fn page_url(&self, page: u32) -> Result<Url> {
        self.base
            .join(&format!("page-{page}.html"))
            .with_context(|| format!("Cannot build URL for page {page}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_url_appends_to_base() {
        let cat = Catalogue::new("http://books.toscrape.com/catalogue/", 50).unwrap();
        assert_eq!(
            cat.page_url(1).unwrap().as_str(),
            "http://books.toscrape.com/catalogue/page-1.html"
        );
        assert_eq!(
            cat.page_url(50).unwrap().as_str(),
            "http://books.toscrape.com/catalogue/page-50.html"
        );
    }

    #[test]
    fn missing_trailing_slash_is_added() {
        let cat = Catalogue::new("http://127.0.0.1:8080/catalogue", 2).unwrap();
        assert_eq!(
            cat.page_url(2).unwrap().as_str(),
            "http://127.0.0.1:8080/catalogue/page-2.html"
        );
    }

    #[test]
    fn rejects_relative_base() {
        assert!(Catalogue::new("catalogue/", 1).is_err());
    }
}
