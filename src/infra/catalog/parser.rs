//! Extracts [`BookRecord`]s from the catalog listing markup.
//!
//! Best-effort per entry: a missing title, price or availability element yields an
//! empty string for that field and the entry is still returned.

use crate::domain::book::BookRecord;
use crate::infra::catalog::selectors;
use scraper::{ElementRef, Html};

/// Returns one record per catalog entry, in document order. No dedup, no sorting.
pub fn parse_catalog(markup: &str) -> Vec<BookRecord> {
    let document = Html::parse_document(markup);
    document
        .select(&selectors::ITEM)
        .map(|item| BookRecord {
            title: title_of(item),
            price: price_of(item),
            availability: availability_of(item),
        })
        .collect()
}

fn title_of(item: ElementRef<'_>) -> String {
    item.select(&selectors::TITLE_LINK)
        .find_map(|a| a.value().attr(selectors::TITLE_ATTR))
        .unwrap_or_default()
        .to_string()
}

fn price_of(item: ElementRef<'_>) -> String {
    item.select(&selectors::PRICE)
        .next()
        .and_then(|p| direct_text(p).next())
        .unwrap_or_default()
        .to_string()
}

/// Direct text of every matching `<p>` in the entry, concatenated in document order.
fn availability_of(item: ElementRef<'_>) -> String {
    item.select(&selectors::AVAILABILITY)
        .flat_map(direct_text)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Text nodes that are immediate children of `el` (nested elements such as icons are skipped).
fn direct_text<'a>(el: ElementRef<'a>) -> impl Iterator<Item = &'a str> + 'a {
    el.children().filter_map(|node| node.value().as_text().map(|t| &**t))
}
