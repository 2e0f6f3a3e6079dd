//! Natural-language journal digest for the recommendation service.
//!
//! Produces text like
//! `Wednesday 15 January 2025 I ate: Oatmeal at 8:30 AM, Salad at 1:00 PM.`
//! with one sentence per day, days in the order they first appear.

use chrono::NaiveDate;

use crate::clock::canonicalize;
use crate::day::DayZone;
use crate::entry::Entry;

/// Formats the whole journal as day-grouped sentences.
///
/// Days come from each entry's timestamp in `zone`. Times are re-encoded
/// canonically when they decode and passed through verbatim otherwise.
pub fn journal_text(entries: &[Entry], zone: DayZone) -> String {
    let mut days: Vec<(NaiveDate, Vec<String>)> = Vec::new();

    for entry in entries {
        let day = zone.calendar_day(entry.timestamp).unwrap_or(entry.date);
        let time = canonicalize(&entry.time).unwrap_or_else(|_| entry.time.clone());
        let item = format!("{} at {time}", entry.food.trim());

        match days.iter_mut().find(|(d, _)| *d == day) {
            Some((_, items)) => items.push(item),
            None => days.push((day, vec![item])),
        }
    }

    days.iter()
        .map(|(day, items)| format!("{} I ate: {}.", day.format("%A %-d %B %Y"), items.join(", ")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The digest followed by the user's own considerations, if any.
pub fn with_considerations(journal: &str, considerations: Option<&str>) -> String {
    match considerations.map(str::trim).filter(|c| !c.is_empty()) {
        Some(extra) => format!("{journal}\nAdditional considerations: {extra}"),
        None => journal.to_string(),
    }
}
