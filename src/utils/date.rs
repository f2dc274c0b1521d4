//! UTC datetime handling for resource dates.
//!
//! `DateTimeUtc` is the date every resource carries. It is read from file
//! modification times, overridden by header fields, written out as RFC 3339
//! in feeds and sitemaps, and converted back to a `SystemTime` when saved
//! files get their mtime restored.
//!
//! Accepted input forms:
//!
//! - `YYYY-MM-DD`
//! - `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS`
//! - `YYYY-MM-DDTHH:MM:SSZ`

use anyhow::{Result, bail};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// UTC datetime without timezone complexity.
///
/// Field order makes the derived `Ord` chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTimeUtc {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

const SECS_PER_DAY: i64 = 86_400;

impl DateTimeUtc {
    pub const fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    pub const fn from_ymd(year: u16, month: u8, day: u8) -> Self {
        Self::new(year, month, day, 0, 0, 0)
    }

    /// The Unix epoch, used when nothing better is known.
    pub const fn epoch() -> Self {
        Self::from_ymd(1970, 1, 1)
    }

    /// Parse any of the accepted header/meta date forms.
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.trim().as_bytes();
        if bytes.len() < 10 {
            return None;
        }

        let year = parse_u16(&bytes[0..4])?;
        if bytes[4] != b'-' || bytes[7] != b'-' {
            return None;
        }
        let month = parse_u8(&bytes[5..7])?;
        let day = parse_u8(&bytes[8..10])?;

        let (hour, minute, second) = match bytes.len() {
            10 => (0, 0, 0),
            19 | 20 if matches!(bytes[10], b'T' | b' ') => {
                if bytes[13] != b':' || bytes[16] != b':' {
                    return None;
                }
                if bytes.len() == 20 && bytes[19] != b'Z' {
                    return None;
                }
                (
                    parse_u8(&bytes[11..13])?,
                    parse_u8(&bytes[14..16])?,
                    parse_u8(&bytes[17..19])?,
                )
            }
            _ => return None,
        };

        let dt = Self::new(year, month, day, hour, minute, second);
        dt.validate().ok()?;
        Some(dt)
    }

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn validate(&self) -> Result<()> {
        let Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        } = *self;

        if !(1..=12).contains(&month) {
            bail!("month is invalid: {month}");
        }

        let max_days = Self::days_in_month(year, month);
        if day == 0 || day > max_days {
            bail!("day is invalid: {day}");
        }
        if hour > 23 {
            bail!("hour is invalid: {hour}");
        }
        if minute > 59 {
            bail!("minute is invalid: {minute}");
        }
        if second > 59 {
            bail!("second is invalid: {second}");
        }

        Ok(())
    }

    #[inline]
    #[allow(clippy::manual_is_multiple_of)]
    const fn is_leap_year(year: u16) -> bool {
        year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
    }

    #[inline]
    const fn days_in_month(year: u16, month: u8) -> u8 {
        match month {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            2 if Self::is_leap_year(year) => 29,
            2 => 28,
            _ => 0,
        }
    }

    /// Build from seconds since the Unix epoch.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_unix(secs: i64) -> Self {
        let days = secs.div_euclid(SECS_PER_DAY);
        let rem = secs.rem_euclid(SECS_PER_DAY);
        let (year, month, day) = civil_from_days(days);
        Self::new(
            year.clamp(0, i64::from(u16::MAX)) as u16,
            month as u8,
            day as u8,
            (rem / 3600) as u8,
            ((rem % 3600) / 60) as u8,
            (rem % 60) as u8,
        )
    }

    /// Seconds since the Unix epoch.
    pub fn to_unix(self) -> i64 {
        let days = days_from_civil(
            i64::from(self.year),
            i64::from(self.month),
            i64::from(self.day),
        );
        days * SECS_PER_DAY
            + i64::from(self.hour) * 3600
            + i64::from(self.minute) * 60
            + i64::from(self.second)
    }

    pub fn from_system_time(time: SystemTime) -> Self {
        let secs = match time.duration_since(UNIX_EPOCH) {
            Ok(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
            Err(e) => -i64::try_from(e.duration().as_secs()).unwrap_or(i64::MAX),
        };
        Self::from_unix(secs)
    }

    /// `None` for dates before the epoch, which cannot be set as an mtime portably.
    pub fn to_system_time(self) -> Option<SystemTime> {
        let secs = u64::try_from(self.to_unix()).ok()?;
        UNIX_EPOCH.checked_add(Duration::from_secs(secs))
    }

    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Format as RFC 3339 (ISO 8601) for Atom feeds and sitemaps.
    ///
    /// Returns: `YYYY-MM-DDTHH:MM:SSZ`
    pub fn to_rfc3339(self) -> String {
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

impl Default for DateTimeUtc {
    fn default() -> Self {
        Self::epoch()
    }
}

impl fmt::Display for DateTimeUtc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

// Howard Hinnant's civil calendar algorithms (proleptic Gregorian).

fn days_from_civil(y: i64, m: i64, d: i64) -> i64 {
    let y = if m <= 2 { y - 1 } else { y };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (m + 9) % 12;
    let doy = (153 * mp + 2) / 5 + d - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn civil_from_days(z: i64) -> (i64, i64, i64) {
    let z = z + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = yoe + era * 400 + i64::from(m <= 2);
    (y, m, d)
}

/// Parse 2-digit ASCII number
#[inline]
fn parse_u8(bytes: &[u8]) -> Option<u8> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = bytes[0].wrapping_sub(b'0');
    let d2 = bytes[1].wrapping_sub(b'0');
    if d1 > 9 || d2 > 9 {
        return None;
    }
    Some(d1 * 10 + d2)
}

/// Parse 4-digit ASCII number
#[inline]
fn parse_u16(bytes: &[u8]) -> Option<u16> {
    if bytes.len() != 4 {
        return None;
    }
    let mut result = 0u16;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        result = result * 10 + u16::from(d);
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_only() {
        let dt = DateTimeUtc::parse("2024-06-15").unwrap();
        assert_eq!(dt, DateTimeUtc::from_ymd(2024, 6, 15));
    }

    #[test]
    fn test_parse_with_time_variants() {
        let expected = DateTimeUtc::new(2024, 6, 15, 14, 30, 45);
        assert_eq!(DateTimeUtc::parse("2024-06-15T14:30:45Z"), Some(expected));
        assert_eq!(DateTimeUtc::parse("2024-06-15T14:30:45"), Some(expected));
        assert_eq!(DateTimeUtc::parse("2024-06-15 14:30:45"), Some(expected));
        assert_eq!(DateTimeUtc::parse("  2024-06-15 14:30:45 "), Some(expected));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(DateTimeUtc::parse("yesterday"), None);
        assert_eq!(DateTimeUtc::parse("2024-13-01"), None);
        assert_eq!(DateTimeUtc::parse("2023-02-29"), None);
        assert_eq!(DateTimeUtc::parse("2024-06-15X14:30:45"), None);
        assert_eq!(DateTimeUtc::parse("2024-06-15T14:30:45+02:00"), None);
    }

    #[test]
    fn test_leap_day() {
        assert!(DateTimeUtc::parse("2024-02-29").is_some());
        assert!(DateTimeUtc::parse("1900-02-29").is_none());
        assert!(DateTimeUtc::parse("2000-02-29").is_some());
    }

    #[test]
    fn test_unix_conversion() {
        assert_eq!(DateTimeUtc::from_unix(0), DateTimeUtc::epoch());
        let dt = DateTimeUtc::new(2024, 6, 15, 14, 30, 45);
        assert_eq!(dt.to_unix(), 1_718_461_845);
        assert_eq!(DateTimeUtc::from_unix(1_718_461_845), dt);
        let leap = DateTimeUtc::new(2000, 2, 29, 23, 59, 59);
        assert_eq!(DateTimeUtc::from_unix(leap.to_unix()), leap);
    }

    #[test]
    fn test_system_time_roundtrip() {
        let dt = DateTimeUtc::new(2021, 1, 2, 3, 4, 5);
        let time = dt.to_system_time().unwrap();
        assert_eq!(DateTimeUtc::from_system_time(time), dt);
        assert!(DateTimeUtc::from_ymd(1969, 12, 31).to_system_time().is_none());
    }

    #[test]
    fn test_ordering_is_chronological() {
        let a = DateTimeUtc::parse("2024-01-31 23:00:00").unwrap();
        let b = DateTimeUtc::parse("2024-02-01").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_to_rfc3339() {
        let dt = DateTimeUtc::new(2024, 1, 5, 9, 3, 0);
        assert_eq!(dt.to_rfc3339(), "2024-01-05T09:03:00Z");
        assert_eq!(dt.to_string(), "2024-01-05 09:03:00");
    }
}
