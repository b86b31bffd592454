//! RFC 3339 timestamp parsing and formatting.
//!
//! OSM stamps elements, changesets, notes and users with second-precision
//! UTC timestamps such as `2012-04-16T19:52:07Z`. Internally these are kept
//! as seconds since the Unix epoch.

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;

/// Error type for RFC 3339 parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeParseError {
    pub message: String,
}

impl DateTimeParseError {
    fn invalid(what: &str, input: &str) -> Self {
        Self {
            message: format!("invalid {} in timestamp: {}", what, input),
        }
    }
}

impl std::fmt::Display for DateTimeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DateTimeParseError {}

/// Parses a timezone offset (`Z`, `+HH:MM`, `-HH:MM`) into seconds east of UTC.
fn parse_timezone_offset(offset: &str, input: &str) -> Result<i64, DateTimeParseError> {
    if offset == "Z" || offset == "z" {
        return Ok(0);
    }

    let bytes = offset.as_bytes();
    if bytes.len() != 6 || bytes[3] != b':' {
        return Err(DateTimeParseError::invalid("timezone offset", input));
    }

    let sign = match bytes[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return Err(DateTimeParseError::invalid("timezone offset", input)),
    };

    let hours: i64 = parse_digits(&offset[1..3], "timezone offset", input)?;
    let minutes: i64 = parse_digits(&offset[4..6], "timezone offset", input)?;
    if hours > 23 || minutes > 59 {
        return Err(DateTimeParseError::invalid("timezone offset", input));
    }

    Ok(sign * (hours * SECONDS_PER_HOUR + minutes * SECONDS_PER_MINUTE))
}

fn parse_digits<T: std::str::FromStr>(
    digits: &str,
    what: &str,
    input: &str,
) -> Result<T, DateTimeParseError> {
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DateTimeParseError::invalid(what, input));
    }
    digits
        .parse()
        .map_err(|_| DateTimeParseError::invalid(what, input))
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// Returns the number of days in a given month (1-indexed).
fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Days since the Unix epoch for a civil date (Howard Hinnant's algorithm).
fn date_to_days(year: i32, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year } as i64;
    let m = if month <= 2 { month as i64 + 9 } else { month as i64 - 3 };

    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let doy = (153 * m + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;

    era * 146097 + doe - 719468
}

/// Converts days since the Unix epoch back to (year, month, day).
fn days_to_date(days: i64) -> (i64, u32, u32) {
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = z - era * 146097;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;

    (if m <= 2 { y + 1 } else { y }, m, d)
}

/// Parses an RFC 3339 timestamp into seconds since the Unix epoch.
///
/// Accepts `T` or a space as the date/time separator, optional fractional
/// seconds (truncated) and either `Z`, a numeric offset or the ` UTC` suffix
/// used by the notes API. A missing offset is read as UTC.
pub fn parse_timestamp(input: &str) -> Result<i64, DateTimeParseError> {
    let bytes = input.as_bytes();
    if bytes.len() < 19 || !input.is_ascii() {
        return Err(DateTimeParseError {
            message: format!("invalid RFC 3339 timestamp: {}", input),
        });
    }
    if bytes[4] != b'-' || bytes[7] != b'-' || bytes[13] != b':' || bytes[16] != b':' {
        return Err(DateTimeParseError {
            message: format!("invalid RFC 3339 timestamp: {}", input),
        });
    }
    if !matches!(bytes[10], b'T' | b't' | b' ') {
        return Err(DateTimeParseError::invalid("separator", input));
    }

    let year: i32 = parse_digits(&input[..4], "year", input)?;
    let month: u32 = parse_digits(&input[5..7], "month", input)?;
    let day: u32 = parse_digits(&input[8..10], "day", input)?;
    let hours: i64 = parse_digits(&input[11..13], "hours", input)?;
    let minutes: i64 = parse_digits(&input[14..16], "minutes", input)?;
    let seconds: i64 = parse_digits(&input[17..19], "seconds", input)?;

    if !(1..=12).contains(&month) {
        return Err(DateTimeParseError::invalid("month", input));
    }
    if day < 1 || day > days_in_month(year, month) {
        return Err(DateTimeParseError::invalid("day", input));
    }
    if hours > 23 {
        return Err(DateTimeParseError::invalid("hours", input));
    }
    if minutes > 59 {
        return Err(DateTimeParseError::invalid("minutes", input));
    }
    if seconds > 59 {
        return Err(DateTimeParseError::invalid("seconds", input));
    }

    let mut rest = &input[19..];
    if let Some(frac) = rest.strip_prefix('.') {
        let end = frac
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(frac.len());
        if end == 0 {
            return Err(DateTimeParseError::invalid("fractional seconds", input));
        }
        rest = &frac[end..];
    }

    let offset = if rest.is_empty() || rest == " UTC" {
        0
    } else {
        parse_timezone_offset(rest, input)?
    };

    let local = date_to_days(year, month, day) * SECONDS_PER_DAY
        + hours * SECONDS_PER_HOUR
        + minutes * SECONDS_PER_MINUTE
        + seconds;

    // local time = UTC + offset
    Ok(local - offset)
}

/// Formats seconds since the Unix epoch as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_timestamp(epoch_seconds: i64) -> String {
    let days = epoch_seconds.div_euclid(SECONDS_PER_DAY);
    let secs = epoch_seconds.rem_euclid(SECONDS_PER_DAY);
    let (year, month, day) = days_to_date(days);

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year,
        month,
        day,
        secs / SECONDS_PER_HOUR,
        (secs % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
        secs % SECONDS_PER_MINUTE
    )
}
