//! Parser for the date the charts page reports as currently displayed.

use chrono::NaiveDate;
use regex::Regex;

/// Format accepted by the site's date field
pub const INPUT_FORMAT: &str = "%d.%m.%Y";

/// Format the site's date field expects, e.g. `07.03.2025`
pub fn format_for_input(date: NaiveDate) -> String {
    date.format(INPUT_FORMAT).to_string()
}

/// Extract a calendar date from displayed text.
///
/// Accepts `DD.MM.YYYY`, `DD/MM/YYYY` and `YYYY-MM-DD` anywhere in the text
/// (the field may carry a label such as "Date: 07.03.2025").
pub fn parse_displayed_date(text: &str) -> Option<NaiveDate> {
    let iso_re = Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})").unwrap();
    if let Some(caps) = iso_re.captures(text) {
        return ymd(&caps[1], &caps[2], &caps[3]);
    }

    let dmy_re = Regex::new(r"(\d{1,2})[./](\d{1,2})[./](\d{4})").unwrap();
    if let Some(caps) = dmy_re.captures(text) {
        return ymd(&caps[3], &caps[2], &caps[1]);
    }

    None
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}
