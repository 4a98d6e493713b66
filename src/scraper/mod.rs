//! Web scraper module for tiak.com.tr
//!
//! Provides browser automation, category extraction and HTML parsing.

pub mod browser;
pub mod extractor;
pub mod pacing;
pub mod parsers;
