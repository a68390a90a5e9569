use std::path::PathBuf;

use thiserror::Error;

/// Why a single page could not be fetched. Always recoverable: the pipeline
/// logs it and treats the page as empty.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("could not read body of {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Failures of the reporting stage. These halt the stage.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("input file {0:?} not found; run `books scrape` first to produce it")]
    InputMissing(PathBuf),

    #[error("dataset has no {0:?} column")]
    MissingColumn(String),

    #[error("no complete rows (price and rating both present) in {0:?}")]
    Empty(PathBuf),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),
}
