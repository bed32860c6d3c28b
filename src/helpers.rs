//! Display formatting used by the home feed.

use chrono::{Datelike, NaiveDateTime};

/// `2020-03-20 16:12:03` -> `3/20/2020`
pub fn format_date(date: NaiveDateTime) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}

/// Drops the scheme, a leading `www.`, the path and the query string.
pub fn format_url(url: &str) -> String {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    rest.split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .to_string()
}

pub fn format_plural(word: &str, amount: i64) -> String {
    if amount == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}
