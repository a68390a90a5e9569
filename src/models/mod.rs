use serde::{Deserialize, Serialize};
use std::fmt;

/// Title written to the CSV when a product node carried no title.
pub const TITLE_UNAVAILABLE: &str = "N/A";

// ── Field ─────────────────────────────────────────────────────────────────────

/// One extracted field: either a usable value, absent from the markup, or
/// present but not coercible (raw text kept for diagnostics).
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    Value(T),
    Missing,
    Unparseable(String),
}

impl<T> Field<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Field::Value(_))
    }

    #[cfg(test)]
    pub fn is_unparseable(&self) -> bool {
        matches!(self, Field::Unparseable(_))
    }
}

impl<T: fmt::Display> fmt::Display for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Value(v) => write!(f, "{v}"),
            Field::Missing => f.write_str("<missing>"),
            Field::Unparseable(raw) => write!(f, "<unparseable {raw:?}>"),
        }
    }
}

// ── Rating ────────────────────────────────────────────────────────────────────

/// Star rating, encoded on the site as a class token (`star-rating Three`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rating {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
}

impl Rating {
    pub const ALL: [Rating; 5] = [
        Rating::One,
        Rating::Two,
        Rating::Three,
        Rating::Four,
        Rating::Five,
    ];

    const TOKENS: [(&'static str, Rating); 5] = [
        ("One", Rating::One),
        ("Two", Rating::Two),
        ("Three", Rating::Three),
        ("Four", Rating::Four),
        ("Five", Rating::Five),
    ];

    /// Case-sensitive lookup of the class token.
    pub fn from_token(token: &str) -> Option<Rating> {
        Self::TOKENS
            .iter()
            .find(|(t, _)| *t == token)
            .map(|(_, r)| *r)
    }

    pub fn from_stars(n: u8) -> Option<Rating> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    pub fn stars(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stars())
    }
}

// ── Book record ───────────────────────────────────────────────────────────────

/// One catalogue entry after coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct BookRecord {
    pub title: Field<String>,
    pub price: Field<f64>,
    pub rating: Field<Rating>,
}

impl fmt::Display for BookRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "title={} price={} rating={}",
            self.title, self.price, self.rating
        )
    }
}

// ── Persisted row ─────────────────────────────────────────────────────────────

/// Row of the persisted dataset: `Title,Price,Rating`. `None` is an empty cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRow {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Price")]
    pub price: Option<f64>,
    #[serde(rename = "Rating")]
    pub rating: Option<u8>,
}

impl From<&BookRecord> for BookRow {
    fn from(record: &BookRecord) -> Self {
        Self {
            title: record
                .title
                .value()
                .cloned()
                .unwrap_or_else(|| TITLE_UNAVAILABLE.to_string()),
            price: record.price.value().copied(),
            rating: record.rating.value().map(|r| r.stars()),
        }
    }
}

// ── Raw parser output ─────────────────────────────────────────────────────────

/// Text pulled out of one `article.product_pod`, before cleaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBookRow {
    pub title: Option<String>,
    pub price: Option<String>,
    /// Second token of the star-rating node's class list.
    pub rating: Option<String>,
}
