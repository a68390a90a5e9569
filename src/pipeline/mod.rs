//! Pipeline orchestrator: ties page source → extractor together.
//!
//! Pages `1..=page_count` are fetched strictly one after another with a
//! politeness pause after each one, failed or not. A failed page contributes
//! no records and never stops the run; there are no retries.

use crate::config::ScraperConfig;
use crate::models::{BookRecord, Field};
use crate::scraper::{Catalogue, PageSource, extract_books};
use anyhow::Result;
use chrono::{DateTime, Local};
use rand::Rng;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

// ── Pacing ────────────────────────────────────────────────────────────────────

/// Fixed delay between requests plus optional random jitter.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    delay: Duration,
    jitter_ms: u64,
}

impl Pacing {
    pub fn new(delay_ms: u64, jitter_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            jitter_ms,
        }
    }

    pub fn next_delay(&self) -> Duration {
        if self.jitter_ms == 0 {
            return self.delay;
        }
        let jitter = rand::rng().random_range(0..=self.jitter_ms);
        self.delay + Duration::from_millis(jitter)
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

pub struct Pipeline {
    catalogue: Catalogue,
    pacing: Pacing,
}

impl Pipeline {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            catalogue: Catalogue::new(&config.base_url, config.page_count)?,
            pacing: Pacing::new(config.request_delay_ms, config.jitter_ms),
        })
    }

    /// Walk every page once and return the records in catalogue order.
    pub async fn run<S>(&self, source: &S) -> Result<RunOutcome>
    where
        S: PageSource + ?Sized,
    {
        let total = self.catalogue.page_count();
        let mut stats = RunStats::new(Local::now());
        let mut records: Vec<BookRecord> = Vec::new();

        info!(
            "Starting to scrape {} pages from {}",
            total,
            self.catalogue.base()
        );

        for page in 1..=total {
            let url = self.catalogue.page_url(page)?;
            info!("Scraping page {}/{}: {}", page, total, url);
            stats.pages_attempted += 1;

            match source.fetch_page(&url).await {
                Ok(body) => {
                    let books = extract_books(&body);
                    info!("  Page {}: {} books", page, books.len());
                    stats.tally(&books);
                    records.extend(books);
                }
                Err(e) => {
                    warn!("Error fetching {}: {}", url, e);
                    stats.failed_pages.push(page);
                }
            }

            sleep(self.pacing.next_delay()).await;
        }

        stats.finished_at = Local::now();
        info!(
            "Finished scraping. Total books found: {} ({} of {} pages failed)",
            records.len(),
            stats.failed_pages.len(),
            total
        );
        if !stats.unrecognised_ratings.is_empty() {
            warn!(
                "Unrecognised rating tokens stored as missing: {:?}",
                stats.unrecognised_ratings
            );
        }

        Ok(RunOutcome { records, stats })
    }
}

// ── Outcome ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct RunOutcome {
    pub records: Vec<BookRecord>,
    pub stats: RunStats,
}

#[derive(Debug)]
pub struct RunStats {
    pub pages_attempted: u32,
    pub failed_pages: Vec<u32>,
    pub records: usize,
    pub titles_missing: usize,
    pub prices_missing: usize,
    pub prices_unparseable: usize,
    pub ratings_missing: usize,
    /// Class tokens that were present but not One..Five, with counts.
    pub unrecognised_ratings: BTreeMap<String, usize>,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl RunStats {
    fn new(now: DateTime<Local>) -> Self {
        Self {
            pages_attempted: 0,
            failed_pages: Vec::new(),
            records: 0,
            titles_missing: 0,
            prices_missing: 0,
            prices_unparseable: 0,
            ratings_missing: 0,
            unrecognised_ratings: BTreeMap::new(),
            started_at: now,
            finished_at: now,
        }
    }

    fn tally(&mut self, books: &[BookRecord]) {
        self.records += books.len();
        for book in books {
            if !book.title.is_value() {
                self.titles_missing += 1;
            }
            match &book.price {
                Field::Value(_) => {}
                Field::Missing => self.prices_missing += 1,
                Field::Unparseable(_) => self.prices_unparseable += 1,
            }
            match &book.rating {
                Field::Value(_) => {}
                Field::Missing => self.ratings_missing += 1,
                Field::Unparseable(token) => {
                    *self.unrecognised_ratings.entry(token.clone()).or_default() += 1;
                }
            }
        }
    }

    pub fn pages_succeeded(&self) -> u32 {
        self.pages_attempted - self.failed_pages.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::models::Rating;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Instant;
    use url::Url;

    /// Serves canned bodies by page URL; any URL without a body fails with 503.
    struct ScriptedSource {
        pages: HashMap<String, String>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn new(pages: &[(u32, String)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(n, body)| (format!("http://shop.test/catalogue/page-{n}.html"), body.clone()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            self.pages
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    url: url.to_string(),
                    status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                })
        }
    }

    fn listing(books: &[(&str, &str, &str)]) -> String {
        books
            .iter()
            .map(|(title, price, rating)| {
                format!(
                    r#"<article class="product_pod"><h3><a title="{title}">{title}</a></h3>
                       <p class="price_color">{price}</p><p class="star-rating {rating}"></p></article>"#
                )
            })
            .collect()
    }

    fn pipeline(pages: u32, delay_ms: u64) -> Pipeline {
        Pipeline::new(&ScraperConfig {
            base_url: "http://shop.test/catalogue/".into(),
            page_count: pages,
            request_delay_ms: delay_ms,
            ..ScraperConfig::default()
        })
        .unwrap()
    }

    fn titles(records: &[BookRecord]) -> Vec<String> {
        records
            .iter()
            .map(|r| r.title.value().cloned().unwrap_or_default())
            .collect()
    }

    #[tokio::test]
    async fn failed_page_is_skipped_and_run_completes() {
        let source = ScriptedSource::new(&[
            (1, listing(&[("A", "£1.00", "One"), ("B", "£2.00", "Two")])),
            (3, listing(&[("C", "£3.00", "Three")])),
        ]);

        let outcome = pipeline(3, 0).run(&source).await.unwrap();

        assert_eq!(titles(&outcome.records), ["A", "B", "C"]);
        assert_eq!(source.calls().len(), 3);
        assert_eq!(outcome.stats.pages_attempted, 3);
        assert_eq!(outcome.stats.failed_pages, vec![2]);
        assert_eq!(outcome.stats.pages_succeeded(), 2);
        assert_eq!(outcome.stats.records, 3);
    }

    #[test]
    fn every_page_failing_yields_empty_dataset() {
        let source = ScriptedSource::new(&[]);
        let outcome = tokio_test::block_on(pipeline(4, 0).run(&source)).unwrap();

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.stats.failed_pages, vec![1, 2, 3, 4]);
        assert_eq!(
            source.calls(),
            (1..=4)
                .map(|n| format!("http://shop.test/catalogue/page-{n}.html"))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn stats_count_degraded_fields() {
        let source = ScriptedSource::new(&[(
            1,
            listing(&[
                ("Good", "£5.00", "Five"),
                ("Odd", "n/a price", "Eleven"),
                ("Odd2", "£4.00", "Eleven"),
            ]),
        )]);
        let outcome = tokio_test::block_on(pipeline(1, 0).run(&source)).unwrap();

        assert_eq!(outcome.records[0].rating, Field::Value(Rating::Five));
        assert_eq!(outcome.stats.prices_unparseable, 1);
        assert_eq!(outcome.stats.unrecognised_ratings.get("Eleven"), Some(&2));
        assert_eq!(outcome.stats.ratings_missing, 0);
    }

    #[tokio::test]
    async fn politeness_delay_follows_every_page() {
        let source = ScriptedSource::new(&[(2, listing(&[("Only", "£1.00", "One")]))]);
        let started = Instant::now();

        pipeline(3, 20).run(&source).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let pacing = Pacing::new(100, 10);
        for _ in 0..50 {
            let d = pacing.next_delay();
            assert!(d >= Duration::from_millis(100) && d <= Duration::from_millis(110));
        }
        assert_eq!(Pacing::new(7, 0).next_delay(), Duration::from_millis(7));
    }

    #[test]
    fn invalid_base_url_is_rejected_up_front() {
        let config = ScraperConfig {
            base_url: "not a url".into(),
            ..ScraperConfig::default()
        };
        assert!(Pipeline::new(&config).is_err());
    }
}
