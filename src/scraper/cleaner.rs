use crate::models::{BookRecord, Field, Rating, RawBookRow};
use tracing::debug;

// ── Parsers ───────────────────────────────────────────────────────────────────

fn is_blank_marker(s: &str) -> bool {
    s.is_empty() || s == "N/A" || s == "-" || s == "—"
}

/// Parse price: drop the currency prefix, then the rest must be a number.
/// "£51.77" → 51.77 | "Â£51.77" → 51.77 | "£5 for 2" → unparseable
pub fn parse_price(s: &str) -> Field<f64> {
    let s = s.trim();
    if is_blank_marker(s) {
        return Field::Missing;
    }
    let number = s
        .trim_start_matches(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .trim_start();
    match number.parse::<f64>() {
        Ok(p) if p.is_finite() && p >= 0.0 => Field::Value(p),
        _ => Field::Unparseable(s.to_string()),
    }
}

/// Price cell of the persisted CSV: a plain number, finite and non-negative.
/// "51.77" → 51.77 | "1e-7" → 0.0000001 | "£5" → None
pub fn parse_price_cell(s: &str) -> Option<f64> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
}

/// Map the star-rating class token to a rating.
pub fn parse_rating_token(token: &str) -> Field<Rating> {
    let token = token.trim();
    if token.is_empty() {
        return Field::Missing;
    }
    match Rating::from_token(token) {
        Some(r) => Field::Value(r),
        None => {
            debug!("Unrecognised rating token {:?}", token);
            Field::Unparseable(token.to_string())
        }
    }
}

/// Rating cell of the persisted CSV: "3" → Three. Anything outside 1..=5 is None.
pub fn parse_rating_cell(s: &str) -> Option<Rating> {
    let s = s.trim();
    let stars: u8 = s
        .parse()
        .ok()
        .or_else(|| s.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as u8))?;
    Rating::from_stars(stars)
}

/// Collapse runs of whitespace; "  A   Light \n in the Attic " → "A Light in the Attic"
pub fn clean_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── RawBookRow → BookRecord ───────────────────────────────────────────────────

pub fn clean_book_row(raw: RawBookRow) -> BookRecord {
    let title = match raw.title.as_deref().map(clean_text) {
        Some(t) if !t.is_empty() => Field::Value(t),
        _ => Field::Missing,
    };

    BookRecord {
        title,
        price: raw.price.as_deref().map_or(Field::Missing, parse_price),
        rating: raw.rating.as_deref().map_or(Field::Missing, parse_rating_token),
    }
}

pub fn clean_book_rows(rows: Vec<RawBookRow>) -> Vec<BookRecord> {
    rows.into_iter().map(clean_book_row).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
