//! CSS selectors for the books.toscrape.com listing page.
//!
//! The site's markup is an external contract: when the layout changes, this file
//! (and the fixture under `tests/fixtures/`) is the only thing that should need edits.

use scraper::Selector;
use std::sync::LazyLock;

/// One catalog entry: an `<article>` whose class attribute is exactly `product_pod`.
/// Cards with additional classes (`product_pod featured`) are not listing entries.
pub static ITEM: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("article[class='product_pod']").expect("static selector must parse")
});

/// Anchor whose `title` attribute carries the full (untruncated) book title.
pub static TITLE_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h3 a").expect("static selector must parse"));

pub const TITLE_ATTR: &str = "title";

pub static PRICE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.price_color").expect("static selector must parse"));

/// Any `<p>` whose class attribute contains `availability` (the site uses `instock availability`).
pub static AVAILABILITY: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("p[class*='availability']").expect("static selector must parse")
});
