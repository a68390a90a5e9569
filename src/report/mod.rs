//! Descriptive statistics over the persisted dataset.
//!
//! Rows missing a price or a rating are dropped before anything is computed.
//! Ratings are treated as the ordered categories 1..=5; empty categories are
//! kept so charts always show all five.

use crate::models::{BookRow, Rating};
use crate::utils::{bar, fmt_price};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub total_rows: usize,
    /// Rows without a usable price or rating.
    pub dropped_rows: usize,
    pub price: PriceSummary,
    pub price_histogram: Vec<HistogramBin>,
    pub rating_counts: Vec<RatingCount>,
    pub avg_price_by_rating: Vec<RatingPrice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1).
    pub std_dev: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingCount {
    pub rating: u8,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingPrice {
    pub rating: u8,
    pub mean_price: Option<f64>,
}

impl Report {
    /// `None` when no row has both a price and a rating.
    pub fn from_rows(rows: &[BookRow], bins: usize) -> Option<Report> {
        let complete: Vec<(f64, Rating)> = rows
            .iter()
            .filter_map(|r| Some((r.price?, Rating::from_stars(r.rating?)?)))
            .collect();

        if complete.is_empty() {
            return None;
        }

        let prices: Vec<f64> = complete.iter().map(|(p, _)| *p).collect();

        let rating_counts = Rating::ALL
            .iter()
            .map(|rating| RatingCount {
                rating: rating.stars(),
                count: complete.iter().filter(|(_, r)| r == rating).count(),
            })
            .collect();

        let avg_price_by_rating = Rating::ALL
            .iter()
            .map(|rating| {
                let in_category: Vec<f64> = complete
                    .iter()
                    .filter(|(_, r)| r == rating)
                    .map(|(p, _)| *p)
                    .collect();
                RatingPrice {
                    rating: rating.stars(),
                    mean_price: (!in_category.is_empty()).then(|| mean(&in_category)),
                }
            })
            .collect();

        Some(Report {
            generated_at: Utc::now(),
            total_rows: rows.len(),
            dropped_rows: rows.len() - complete.len(),
            price: summarize(&prices),
            price_histogram: histogram(&prices, bins.max(1)),
            rating_counts,
            avg_price_by_rating,
        })
    }

    pub fn render_text(&self, width: usize) -> String {
        let mut out = String::new();
        let p = &self.price;

        let _ = writeln!(out, "Books analysed: {} ({} incomplete rows dropped)", p.count, self.dropped_rows);
        let _ = writeln!(
            out,
            "Price: min {}  max {}  mean {}  median {}  std {:.2}",
            fmt_price(p.min),
            fmt_price(p.max),
            fmt_price(p.mean),
            fmt_price(p.median),
            p.std_dev
        );

        let _ = writeln!(out, "\nDistribution of Book Prices");
        let max_bin = self.price_histogram.iter().map(|b| b.count).max().unwrap_or(0);
        for b in &self.price_histogram {
            let _ = writeln!(
                out,
                "  {:>8} - {:<8} | {} {}",
                fmt_price(b.lower),
                fmt_price(b.upper),
                bar(b.count as f64, max_bin as f64, width),
                b.count
            );
        }

        let _ = writeln!(out, "\nDistribution of Book Ratings");
        let max_count = self.rating_counts.iter().map(|c| c.count).max().unwrap_or(0);
        for c in &self.rating_counts {
            let _ = writeln!(
                out,
                "  {} star{} | {} {}",
                c.rating,
                if c.rating == 1 { " " } else { "s" },
                bar(c.count as f64, max_count as f64, width),
                c.count
            );
        }

        let _ = writeln!(out, "\nAverage Book Price by Rating");
        let max_avg = self
            .avg_price_by_rating
            .iter()
            .filter_map(|r| r.mean_price)
            .fold(0.0, f64::max);
        for r in &self.avg_price_by_rating {
            let (chart, label) = match r.mean_price {
                Some(m) => (bar(m, max_avg, width), fmt_price(m)),
                None => (String::new(), "-".to_string()),
            };
            let _ = writeln!(
                out,
                "  {} star{} | {} {}",
                r.rating,
                if r.rating == 1 { " " } else { "s" },
                chart,
                label
            );
        }

        out
    }

    pub fn write_text(&self, path: &Path, width: usize) -> Result<()> {
        std::fs::write(path, self.render_text(width))
            .with_context(|| format!("Failed to write report to {:?}", path))
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .with_context(|| format!("Failed to write JSON report to {:?}", path))?;
        writer.flush()?;
        Ok(())
    }
}

// ── Statistics ────────────────────────────────────────────────────────────────

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// `values` must be non-empty.
fn summarize(values: &[f64]) -> PriceSummary {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };
    let avg = mean(&sorted);
    let std_dev = if n > 1 {
        (sorted.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
    } else {
        0.0
    };

    PriceSummary {
        count: n,
        min: sorted[0],
        max: sorted[n - 1],
        mean: avg,
        median,
        std_dev,
    }
}

/// Equal-width bins spanning [min, max]; the maximum lands in the last bin.
fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / bins as f64;

    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = if width > 0.0 {
            (((v - min) / width) as usize).min(bins - 1)
        } else {
            0
        };
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: min + width * (i + 1) as f64,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(price: Option<f64>, rating: Option<u8>) -> BookRow {
        BookRow {
            title: "t".into(),
            price,
            rating,
        }
    }

    fn sample() -> Vec<BookRow> {
        vec![
            row(Some(10.0), Some(1)),
            row(Some(20.0), Some(1)),
            row(Some(30.0), Some(3)),
            row(Some(40.0), Some(5)),
            row(None, Some(2)),
            row(Some(50.0), None),
        ]
    }

    #[test]
    fn drops_incomplete_rows() {
        let report = Report::from_rows(&sample(), 4).unwrap();
        assert_eq!(report.total_rows, 6);
        assert_eq!(report.dropped_rows, 2);
        assert_eq!(report.price.count, 4);
    }

    #[test]
    fn price_summary_matches_hand_computation() {
        let report = Report::from_rows(&sample(), 4).unwrap();
        let p = &report.price;
        assert_eq!((p.min, p.max), (10.0, 40.0));
        assert_eq!(p.mean, 25.0);
        assert_eq!(p.median, 25.0);
        // sample variance of 10,20,30,40 is 166.67
        assert!((p.std_dev - 12.9099).abs() < 1e-3);
    }

    #[test]
    fn ratings_are_ordered_and_complete() {
        let report = Report::from_rows(&sample(), 4).unwrap();
        let counts: Vec<(u8, usize)> = report
            .rating_counts
            .iter()
            .map(|c| (c.rating, c.count))
            .collect();
        assert_eq!(counts, vec![(1, 2), (2, 0), (3, 1), (4, 0), (5, 1)]);

        let avg: Vec<Option<f64>> = report
            .avg_price_by_rating
            .iter()
            .map(|r| r.mean_price)
            .collect();
        assert_eq!(avg, vec![Some(15.0), None, Some(30.0), None, Some(40.0)]);
    }

    #[test]
    fn histogram_covers_every_value() {
        let report = Report::from_rows(&sample(), 3).unwrap();
        assert_eq!(report.price_histogram.len(), 3);
        assert_eq!(
            report.price_histogram.iter().map(|b| b.count).sum::<usize>(),
            4
        );
        assert_eq!(report.price_histogram[2].count, 2);
        assert_eq!(report.price_histogram[0].lower, 10.0);
        assert_eq!(report.price_histogram[2].upper, 40.0);
    }

    #[test]
    fn identical_prices_share_one_bin() {
        let rows = vec![row(Some(5.0), Some(2)), row(Some(5.0), Some(4))];
        let report = Report::from_rows(&rows, 5).unwrap();
        assert_eq!(report.price_histogram[0].count, 2);
        assert_eq!(report.price.std_dev, 0.0);
    }

    #[test]
    fn nothing_complete_means_no_report() {
        assert!(Report::from_rows(&[row(None, Some(1)), row(Some(1.0), None)], 5).is_none());
        assert!(Report::from_rows(&[], 5).is_none());
    }

    #[test]
    fn text_rendering_has_all_charts() {
        let text = Report::from_rows(&sample(), 4).unwrap().render_text(10);
        assert!(text.contains("Distribution of Book Prices"));
        assert!(text.contains("Distribution of Book Ratings"));
        assert!(text.contains("Average Book Price by Rating"));
        assert!(text.contains("£15.00"));
    }

    #[test]
    fn json_summary_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        Report::from_rows(&sample(), 4)
            .unwrap()
            .write_json(&path)
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(value["price"]["count"], 4);
        assert_eq!(value["rating_counts"][0]["rating"], 1);
        assert!(value["avg_price_by_rating"][1]["mean_price"].is_null());
    }
}
