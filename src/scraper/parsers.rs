use crate::models::{BookRecord, RawBookRow};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use super::cleaner::clean_book_rows;

// ── Selectors ─────────────────────────────────────────────────────────────────

struct ListingSelectors {
    product: Selector,
    title: Selector,
    price: Selector,
    rating: Selector,
}

static SELECTORS: LazyLock<ListingSelectors> = LazyLock::new(|| ListingSelectors {
    product: selector("article.product_pod"),
    title: selector("h3 a"),
    price: selector("p.price_color"),
    rating: selector("p.star-rating"),
});

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css:?}: {e:?}"))
}

// ── Listing page ──────────────────────────────────────────────────────────────

/// Raw text of every product entry, in document order. One row per
/// `article.product_pod`, whatever is missing inside it.
pub fn parse_listing_page(html: &str) -> Vec<RawBookRow> {
    let doc = Html::parse_document(html);
    let sel = &*SELECTORS;

    doc.select(&sel.product)
        .map(|pod| RawBookRow {
            title: pod.select(&sel.title).next().and_then(title_of),
            price: pod
                .select(&sel.price)
                .next()
                .map(|p| p.text().collect::<String>().trim().to_string()),
            rating: pod.select(&sel.rating).next().and_then(rating_token_of),
        })
        .collect()
}

/// Full title lives in the anchor's `title` attribute; the link text is
/// truncated on the listing, so it is only a fallback.
fn title_of(anchor: ElementRef<'_>) -> Option<String> {
    if let Some(t) = anchor.value().attr("title") {
        return Some(t.to_string());
    }
    let text = anchor.text().collect::<String>();
    let text = text.trim();
    if text.is_empty() { None } else { Some(text.to_string()) }
}

/// `class="star-rating Three"` → "Three"
fn rating_token_of(node: ElementRef<'_>) -> Option<String> {
    node.value()
        .attr("class")?
        .split_whitespace()
        .nth(1)
        .map(str::to_string)
}

/// Parse and clean one listing page.
pub fn extract_books(html: &str) -> Vec<BookRecord> {
    clean_book_rows(parse_listing_page(html))
}
