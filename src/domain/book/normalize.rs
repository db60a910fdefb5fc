//! Text cleanup applied to scraped records before they are written.
//!
//! Runs before the upsert, so the capitalization rule here decides which stored
//! document a scraped title maps to.

use crate::domain::book::BookRecord;

/// `£` encoded as UTF-8 and decoded as Latin-1 comes out as `Â£`.
///
/// Only this literal prefix byte is removed; no other encoding repair is attempted.
pub const PRICE_MOJIBAKE: &str = "Â";

/// Normalizes every record in place, preserving order.
pub fn normalize(mut records: Vec<BookRecord>) -> Vec<BookRecord> {
    for record in records.iter_mut() {
        normalize_record(record);
    }
    records
}

/// Price: strip [`PRICE_MOJIBAKE`] and surrounding whitespace.
/// Title: [`capitalize_first`]. Availability is left untouched.
pub fn normalize_record(record: &mut BookRecord) {
    record.price = record.price.replace(PRICE_MOJIBAKE, "").trim().to_string();
    record.title = capitalize_first(&record.title);
}

/// First character uppercased, every following character lowercased.
///
/// `"tipping the VELVET"` -> `"Tipping the velvet"`. Not per-word title case.
/// Uses the Unicode uppercase mapping, not titlecase, so one character may expand:
/// `"ßeta"` -> `"SSeta"`.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
