//! Reader for the persisted dataset (`Title,Price,Rating`).
//!
//! Cells are re-coerced on the way in: prices must be plain non-negative
//! numbers, ratings whole numbers in 1..=5. Anything else becomes `None`.

use crate::error::ReportError;
use crate::models::BookRow;
use crate::scraper::cleaner::{parse_price_cell, parse_rating_cell};
use csv::StringRecord;
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

const COLUMNS: [&str; 3] = ["Title", "Price", "Rating"];

fn column(headers: &StringRecord, name: &str) -> Result<usize, ReportError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| ReportError::MissingColumn(name.to_string()))
}

pub fn load_dataset(path: &Path) -> Result<Vec<BookRow>, ReportError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ReportError::InputMissing(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    debug!("Loading dataset from {:?}", path);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    let [title_idx, price_idx, rating_idx] = [
        column(&headers, COLUMNS[0])?,
        column(&headers, COLUMNS[1])?,
        column(&headers, COLUMNS[2])?,
    ];

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Row {} in {:?}: {}", i + 1, path, e);
                continue;
            }
        };

        rows.push(BookRow {
            title: record.get(title_idx).unwrap_or_default().to_string(),
            price: record.get(price_idx).and_then(parse_price_cell),
            rating: record
                .get(rating_idx)
                .and_then(parse_rating_cell)
                .map(|r| r.stars()),
        });
    }

    info!("Loaded {} rows from {:?}", rows.len(), path);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn absent_file_asks_for_scrape_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books_data.csv");

        let err = load_dataset(&path).unwrap_err();

        assert!(matches!(err, ReportError::InputMissing(_)));
        assert!(err.to_string().contains("books scrape"));
    }

    #[test]
    fn recoerces_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.csv");
        fs::write(
            &path,
            "Title,Price,Rating\n\
             Plain,51.77,3\n\
             Currency,£10.00,5.0\n\
             Exponent,1e-7,2\n\
             Glued,12abc34,1\n\
             Broken,abc,seven\n\
             Out of range,-1,9\n\
             Empty,,\n",
        )
        .unwrap();

        let rows = load_dataset(&path).unwrap();
        let cells: Vec<(Option<f64>, Option<u8>)> =
            rows.iter().map(|r| (r.price, r.rating)).collect();

        assert_eq!(
            cells,
            vec![
                (Some(51.77), Some(3)),
                (None, Some(5)),
                (Some(1e-7), Some(2)),
                (None, Some(1)),
                (None, None),
                (None, None),
                (None, None),
            ]
        );
        assert_eq!(rows[6].title, "Empty");
    }

    #[test]
    fn column_order_is_taken_from_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.csv");
        fs::write(&path, "Rating,Title,Price\n2,Swapped,3.50\n").unwrap();

        let rows = load_dataset(&path).unwrap();

        assert_eq!(
            rows,
            vec![BookRow {
                title: "Swapped".into(),
                price: Some(3.5),
                rating: Some(2),
            }]
        );
    }

    #[test]
    fn unreadable_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("plain.txt");
        fs::write(&not_a_dir, "x").unwrap();

        let err = load_dataset(&not_a_dir.join("books.csv")).unwrap_err();

        assert!(matches!(err, ReportError::Io(_)), "{err:?}");
    }

    #[test]
    fn missing_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.csv");
        fs::write(&path, "Title,Price\nX,1.0\n").unwrap();

        assert!(matches!(
            load_dataset(&path),
            Err(ReportError::MissingColumn(c)) if c == "Rating"
        ));
    }
}
