//! Month text parsing.
//!
//! Month cells look like "Jan", "Jan-2023", "January 2023" or "Jan-23". Only
//! the first three characters identify the month; the year, when present, is
//! the last run of digits in the text.

/// Year assigned when the text carries no year (the strptime default).
pub const EPOCH_YEAR: i32 = 1900;

const ABBREVIATIONS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Calendar month number (1-12) named by the first three characters, if any.
pub fn parse_month_number(raw: &str) -> Option<u32> {
    let prefix: String = raw.trim().chars().take(3).collect();
    ABBREVIATIONS
        .iter()
        .position(|abbr| abbr.eq_ignore_ascii_case(&prefix))
        .map(|idx| idx as u32 + 1)
}

/// The year written after the month abbreviation, taken literally.
///
/// "Jan-2023" gives 2023, "Jan-23" gives 23, "Jan" gives None.
pub fn explicit_year(raw: &str) -> Option<i32> {
    let rest: String = raw.trim().chars().skip(3).collect();
    rest.split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .last()
        .and_then(|run| run.parse::<i32>().ok())
}

/// Year for a month cell before any correction.
pub fn derived_year(raw: &str) -> i32 {
    explicit_year(raw).unwrap_or(EPOCH_YEAR)
}

/// Year for a month cell once implausible years have been detected in the table.
///
/// Two-digit years pivot like POSIX `%y` (00-68 are 2000s, 69-99 are 1900s).
/// Anything else still before 1900 falls back to [`EPOCH_YEAR`].
pub fn corrected_year(raw: &str) -> i32 {
    match explicit_year(raw) {
        Some(y @ 0..=68) => 2000 + y,
        Some(y @ 69..=99) => 1900 + y,
        Some(y) if y >= EPOCH_YEAR => y,
        _ => EPOCH_YEAR,
    }
}
