use chrono::{Datelike, NaiveDate, Utc};

/// The seed a run actually uses: `configured` when non-zero, otherwise
/// today's UTC date as `yyyymmdd`, so every session on the same day shares
/// terrain for daily leaderboards.
pub fn resolve_seed(configured: u64) -> u64 {
    if configured != 0 {
        return configured;
    }
    date_seed(Utc::now().date_naive())
}

/// `yyyymmdd` for a calendar date.
pub fn date_seed(date: NaiveDate) -> u64 {
    date.year() as u64 * 10_000 + date.month() as u64 * 100 + date.day() as u64
}
