//! Daily ratings table parser for tiak.com.tr.
//!
//! Columns: rank, program, channel, start, end, rating, share.
//! The table is read while the page is still re-rendering, so malformed
//! rows are dropped instead of failing the whole table.

use scraper::{ElementRef, Html, Selector};

use crate::types::{CategoryExtract, CategoryRecord};

/// Minimum number of cells in a data row
const MIN_CELLS: usize = 7;

/// Placeholder the site renders for missing values
const PLACEHOLDER: &str = "-";

/// Parser for the daily ratings table
pub struct RatingsTableParser;

impl RatingsTableParser {
    /// Parse table markup into a program name -> record map.
    ///
    /// A missing table yields an empty extract: the site renders no table
    /// until data for the date is published.
    pub fn parse(html: &str) -> CategoryExtract {
        let document = Html::parse_fragment(html);
        let mut extract = CategoryExtract::new();

        let table_selector = Selector::parse("table").unwrap();
        let Some(table) = document.select(&table_selector).next() else {
            return extract;
        };

        let row_selector = Selector::parse("tr").unwrap();
        let cell_selector = Selector::parse("td").unwrap();

        // Row 0 is the header
        for row in table.select(&row_selector).skip(1) {
            let cells: Vec<String> = row.select(&cell_selector).map(cell_text).collect();
            if cells.len() < MIN_CELLS {
                continue;
            }

            if let Some((name, record)) = Self::parse_row(&cells) {
                if extract.insert(name.clone(), record).is_some() {
                    tracing::debug!("Duplicate program row, keeping last: {}", name);
                }
            }
        }

        extract
    }

    /// Parse one row's cell texts; `None` skips the row.
    fn parse_row(cells: &[String]) -> Option<(String, CategoryRecord)> {
        let name = normalize_name(&cells[1]);
        if name.is_empty() || name == PLACEHOLDER {
            return None;
        }

        let measure = |field: &str, raw: &str| {
            parse_measure(raw)
                .map_err(|e| tracing::debug!("Skipping row {:?}: {} {}", name, field, e))
                .ok()
        };

        let record = CategoryRecord {
            rank: parse_rank(&cells[0]),
            channel: cells[2].clone(),
            start_time: cells[3].clone(),
            end_time: cells[4].clone(),
            rating: measure("rating", &cells[5])?,
            share: measure("share", &cells[6])?,
        };

        Some((name, record))
    }
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Trim and collapse internal whitespace
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Rank cell: "12" or "12." -> 12; anything else is unranked
pub fn parse_rank(raw: &str) -> Option<u32> {
    let digits = raw.trim().trim_end_matches('.');
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|&rank| rank > 0)
}

/// Rating/share cell with comma decimals: "5,2" -> 5.2, "-" -> absent.
///
/// Errors on text that is neither a placeholder nor a non-negative number.
pub fn parse_measure(raw: &str) -> Result<Option<f64>, String> {
    let text = raw.trim();
    if text.is_empty() || text == PLACEHOLDER {
        return Ok(None);
    }

    let value: f64 = text
        .replace(',', ".")
        .parse()
        .map_err(|_| format!("not a number: {:?}", text))?;

    if !value.is_finite() || value < 0.0 {
        return Err(format!("out of range: {}", value));
    }

    Ok(Some(value))
}
