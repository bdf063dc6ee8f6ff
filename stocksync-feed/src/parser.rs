//! Delimited feed → [`StockFeedMap`].
//!
//! Header row required. The SKU and quantity columns are located by alias;
//! each alias list is checked in order and the first alias present wins.

use std::fmt;

use csv::{ReaderBuilder, Trim};
use stocksync_core::{FeedDelimiter, Quantity, Sku, StockFeedEntry, StockFeedMap};

use crate::error::FeedError;

/// Accepted SKU column names, in priority order.
pub const SKU_COLUMNS: &[&str] = &["sku", "SKU"];

/// Accepted quantity column names, in priority order.
pub const QUANTITY_COLUMNS: &[&str] = &["stock", "quantity", "qty", "available_stock"];

const BOM: char = '\u{feff}';

/// Why a feed row was left out of the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingSku,
    MissingQuantity,
    InvalidQuantity(String),
    NegativeQuantity(String),
    Malformed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingSku => write!(f, "missing sku"),
            SkipReason::MissingQuantity => write!(f, "missing quantity"),
            SkipReason::InvalidQuantity(raw) => write!(f, "invalid quantity '{raw}'"),
            SkipReason::NegativeQuantity(raw) => write!(f, "negative quantity '{raw}'"),
            SkipReason::Malformed(msg) => write!(f, "malformed row: {msg}"),
        }
    }
}

/// A dropped row and the 1-based line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSkip {
    pub line: u64,
    pub reason: SkipReason,
}

/// Parsed feed plus the diagnostics for rows that were dropped.
#[derive(Debug, Clone, Default)]
pub struct FeedParse {
    pub map: StockFeedMap,
    /// Data rows seen (excluding the header).
    pub rows: usize,
    pub skipped: Vec<RowSkip>,
}

/// Pick `;` when the header line has more semicolons than commas, else `,`.
/// Separators inside double-quoted fields are not counted.
pub fn detect_delimiter(header_line: &str) -> u8 {
    let mut quoted = false;
    let (mut semicolons, mut commas) = (0usize, 0usize);
    for c in header_line.chars() {
        match c {
            '"' => quoted = !quoted,
            ';' if !quoted => semicolons += 1,
            ',' if !quoted => commas += 1,
            _ => {}
        }
    }
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

/// Coerce a raw quantity cell.
///
/// Accepts integers and decimal-looking values (`"12.0"`, `"3,5"`), truncating
/// toward zero.
pub fn parse_quantity(raw: &str) -> Result<Quantity, SkipReason> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SkipReason::MissingQuantity);
    }

    let normalized = trimmed.replace(',', ".");
    let value: f64 = normalized
        .parse()
        .map_err(|_| SkipReason::InvalidQuantity(trimmed.to_string()))?;
    if !value.is_finite() {
        return Err(SkipReason::InvalidQuantity(trimmed.to_string()));
    }

    let truncated = value.trunc();
    if truncated < 0.0 {
        return Err(SkipReason::NegativeQuantity(trimmed.to_string()));
    }
    if truncated > f64::from(Quantity::MAX) {
        return Err(SkipReason::InvalidQuantity(trimmed.to_string()));
    }
    // In range and integral after the checks above.
    Ok(truncated as Quantity)
}

/// Parse a whole feed payload.
pub fn parse_feed(text: &str, delimiter: FeedDelimiter) -> Result<FeedParse, FeedError> {
    let text = text.trim_start_matches(BOM);
    let header_line = text.lines().next().unwrap_or_default();
    if header_line.trim().is_empty() {
        return Err(FeedError::Empty);
    }

    let delimiter = match delimiter {
        FeedDelimiter::Auto => detect_delimiter(header_line),
        FeedDelimiter::Comma => b',',
        FeedDelimiter::Semicolon => b';',
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let sku_idx = find_column(&headers, "SKU", SKU_COLUMNS)?;
    let qty_idx = find_column(&headers, "quantity", QUANTITY_COLUMNS)?;

    let mut entries = Vec::new();
    let mut skipped = Vec::new();
    let mut rows = 0usize;

    for (i, record) in reader.records().enumerate() {
        rows += 1;
        // Header is line 1; fall back to the record index when csv has no position.
        let fallback_line = i as u64 + 2;
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                let line = err
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(fallback_line);
                skipped.push(RowSkip {
                    line,
                    reason: SkipReason::Malformed(err.to_string()),
                });
                continue;
            }
        };
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(fallback_line);

        if record.iter().all(|field| field.is_empty()) {
            rows -= 1;
            continue;
        }

        let Some(sku) = record.get(sku_idx).and_then(Sku::parse) else {
            skipped.push(RowSkip {
                line,
                reason: SkipReason::MissingSku,
            });
            continue;
        };

        match parse_quantity(record.get(qty_idx).unwrap_or_default()) {
            Ok(quantity) => entries.push(StockFeedEntry { sku, quantity }),
            Err(reason) => {
                tracing::debug!(line, sku = %sku, %reason, "feed row skipped");
                skipped.push(RowSkip { line, reason });
            }
        }
    }

    Ok(FeedParse {
        map: StockFeedMap::from_entries(entries),
        rows,
        skipped,
    })
}

fn find_column(
    headers: &csv::StringRecord,
    column: &'static str,
    aliases: &[&str],
) -> Result<usize, FeedError> {
    aliases
        .iter()
        .find_map(|alias| headers.iter().position(|h| h == *alias))
        .ok_or_else(|| FeedError::MissingColumn {
            column,
            accepted: aliases.join(", "),
            found: headers.iter().collect::<Vec<_>>().join(", "),
        })
}
