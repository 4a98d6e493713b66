//! HTML and text parsers for tiak.com.tr charts.

pub mod displayed_date;
pub mod ratings_table;

pub use displayed_date::{format_for_input, parse_displayed_date};
pub use ratings_table::RatingsTableParser;
