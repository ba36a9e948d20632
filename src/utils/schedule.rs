use std::cmp::Ordering;

use chrono::NaiveDateTime;

/// Format produced by a `datetime-local` style input (minute precision).
pub const FORM_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
/// Seconds suffix appended to form input before it is sent to the API.
pub const SECONDS_SUFFIX: &str = ":00";

const WIRE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", FORM_DATETIME_FORMAT];

/// Parse a local date-time as the API returns it (`2024-01-01T09:00:00`,
/// optional fractional seconds) or as typed into the form (`2024-01-01T09:00`).
pub fn parse_local_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    WIRE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
}

/// Returns the wire representation of a form date-time, or `None` when the
/// input is not minute-precision `YYYY-MM-DDTHH:MM`.
pub fn normalize_form_datetime(value: &str) -> Option<String> {
    let trimmed = value.trim();
    NaiveDateTime::parse_from_str(trimmed, FORM_DATETIME_FORMAT).ok()?;
    Some(format!("{trimmed}{SECONDS_SUFFIX}"))
}

/// Ascending order; values that do not parse go after every parsed value.
pub fn compare_schedule(a: &str, b: &str) -> Ordering {
    match (parse_local_datetime(a), parse_local_datetime(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
