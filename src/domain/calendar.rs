//! Calendar systems and calendar-agnostic date-times.
//!
//! Every calendar maps a `DateTime` onto a count of seconds since its own
//! 1970-01-01 00:00:00. For `standard`, `proleptic_gregorian` and `julian`
//! those counts share one absolute scale (the Julian day numbering), so the
//! mixed `standard` calendar can switch at 1582-10-15 without a gap.

use crate::error::{CouplingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const SECONDS_PER_DAY: i64 = 86_400;

/// Calendar systems understood by a `TimeDomain`. Aliases collapse onto one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Calendar {
    #[serde(rename = "standard", alias = "gregorian")]
    Standard,
    #[serde(rename = "proleptic_gregorian")]
    ProlepticGregorian,
    #[serde(rename = "julian")]
    Julian,
    #[serde(rename = "noleap", alias = "365_day")]
    NoLeap,
    #[serde(rename = "all_leap", alias = "366_day")]
    AllLeap,
    #[serde(rename = "360_day")]
    Day360,
}

impl Calendar {
    pub fn as_str(&self) -> &'static str {
        match self {
            Calendar::Standard => "standard",
            Calendar::ProlepticGregorian => "proleptic_gregorian",
            Calendar::Julian => "julian",
            Calendar::NoLeap => "noleap",
            Calendar::AllLeap => "all_leap",
            Calendar::Day360 => "360_day",
        }
    }

    pub fn is_leap_year(&self, year: i32) -> bool {
        let y = year as i64;
        match self {
            Calendar::ProlepticGregorian => gregorian_leap(y),
            Calendar::Julian => y.rem_euclid(4) == 0,
            Calendar::Standard => {
                if y < 1582 { y.rem_euclid(4) == 0 } else { gregorian_leap(y) }
            }
            Calendar::NoLeap | Calendar::Day360 => false,
            Calendar::AllLeap => true,
        }
    }

    pub fn days_in_month(&self, year: i32, month: u32) -> u32 {
        if *self == Calendar::Day360 {
            return 30;
        }
        match month {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            2 if self.is_leap_year(year) => 29,
            2 => 28,
            _ => 0,
        }
    }

    /// Checks that `dt` names an existing instant in this calendar.
    pub fn validate(&self, dt: &DateTime) -> Result<()> {
        let invalid = || {
            CouplingError::Configuration(format!(
                "date-time {} does not exist in the '{}' calendar",
                dt, self
            ))
        };
        if dt.month == 0 || dt.month > 12 || dt.day == 0 {
            return Err(invalid());
        }
        if dt.day > self.days_in_month(dt.year, dt.month) {
            return Err(invalid());
        }
        if dt.hour > 23 || dt.minute > 59 || dt.second > 59 {
            return Err(invalid());
        }
        // Ten days dropped by the Gregorian reform.
        if *self == Calendar::Standard
            && (dt.year, dt.month) == (1582, 10)
            && (5..15).contains(&dt.day)
        {
            return Err(invalid());
        }
        Ok(())
    }

    /// Seconds elapsed since 1970-01-01 00:00:00 of this calendar.
    pub fn to_seconds(&self, dt: &DateTime) -> Result<i64> {
        self.validate(dt)?;
        let (y, m, d) = (dt.year as i64, dt.month as i64, dt.day as i64);
        let days = match self {
            Calendar::ProlepticGregorian => gregorian_days(y, m, d),
            Calendar::Julian => julian_days(y, m, d),
            Calendar::Standard => {
                if (dt.year, dt.month, dt.day) >= (1582, 10, 15) {
                    gregorian_days(y, m, d)
                } else {
                    julian_days(y, m, d)
                }
            }
            Calendar::NoLeap => fixed_year_days(y, m, d, 365, &NOLEAP_CUMULATIVE),
            Calendar::AllLeap => fixed_year_days(y, m, d, 366, &ALL_LEAP_CUMULATIVE),
            Calendar::Day360 => (y - 1970) * 360 + (m - 1) * 30 + (d - 1),
        };
        Ok(days * SECONDS_PER_DAY
            + dt.hour as i64 * 3600
            + dt.minute as i64 * 60
            + dt.second as i64)
    }

    /// Inverse of [`Calendar::to_seconds`].
    pub fn from_seconds(&self, seconds: i64) -> DateTime {
        let days = seconds.div_euclid(SECONDS_PER_DAY);
        let sod = seconds.rem_euclid(SECONDS_PER_DAY);
        let (year, month, day) = match self {
            Calendar::ProlepticGregorian => gregorian_date(days),
            Calendar::Julian => julian_date(days),
            Calendar::Standard => {
                if days >= GREGORIAN_REFORM_DAY { gregorian_date(days) } else { julian_date(days) }
            }
            Calendar::NoLeap => fixed_year_date(days, 365, &NOLEAP_CUMULATIVE),
            Calendar::AllLeap => fixed_year_date(days, 366, &ALL_LEAP_CUMULATIVE),
            Calendar::Day360 => {
                let year = days.div_euclid(360) + 1970;
                let doy = days.rem_euclid(360);
                (year, (doy / 30 + 1) as u32, (doy % 30 + 1) as u32)
            }
        };
        DateTime {
            year: year as i32,
            month,
            day,
            hour: (sod / 3600) as u32,
            minute: (sod % 3600 / 60) as u32,
            second: (sod % 60) as u32,
        }
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Calendar {
    type Err = CouplingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "gregorian" => Ok(Calendar::Standard),
            "proleptic_gregorian" => Ok(Calendar::ProlepticGregorian),
            "julian" => Ok(Calendar::Julian),
            "noleap" | "365_day" => Ok(Calendar::NoLeap),
            "all_leap" | "366_day" => Ok(Calendar::AllLeap),
            "360_day" => Ok(Calendar::Day360),
            other => Err(CouplingError::Configuration(format!(
                "calendar '{}' is not supported",
                other
            ))),
        }
    }
}

// --- Day-number arithmetic ---

const NOLEAP_CUMULATIVE: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];
const ALL_LEAP_CUMULATIVE: [i64; 12] = [0, 31, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335];

const fn gregorian_leap(y: i64) -> bool {
    y.rem_euclid(4) == 0 && (y.rem_euclid(100) != 0 || y.rem_euclid(400) == 0)
}

/// Days since 1970-01-01 in the proleptic Gregorian calendar.
const fn gregorian_days(y: i64, m: i64, d: i64) -> i64 {
    let y = if m <= 2 { y - 1 } else { y };
    let era = y.div_euclid(400);
    let yoe = y.rem_euclid(400);
    let mp = (m + 9) % 12;
    let doy = (153 * mp + 2) / 5 + d - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

const fn gregorian_date(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let (y, m, d) = month_day_from_march_doy(yoe + era * 400, doy);
    (y, m, d)
}

/// Julian-calendar day count before shifting onto the shared absolute scale.
const fn julian_raw(y: i64, m: i64, d: i64) -> i64 {
    let y = if m <= 2 { y - 1 } else { y };
    let era = y.div_euclid(4);
    let yoe = y.rem_euclid(4);
    let mp = (m + 9) % 12;
    let doy = (153 * mp + 2) / 5 + d - 1;
    era * 1461 + yoe * 365 + doy
}

/// Julian 1582-10-04 is followed by Gregorian 1582-10-15.
const JULIAN_SHIFT: i64 = julian_raw(1582, 10, 5) - gregorian_days(1582, 10, 15);
const GREGORIAN_REFORM_DAY: i64 = gregorian_days(1582, 10, 15);

const fn julian_days(y: i64, m: i64, d: i64) -> i64 {
    julian_raw(y, m, d) - JULIAN_SHIFT
}

const fn julian_date(days: i64) -> (i64, u32, u32) {
    let z = days + JULIAN_SHIFT;
    let era = z.div_euclid(1461);
    let doe = z.rem_euclid(1461);
    let yoe = if doe / 365 > 3 { 3 } else { doe / 365 };
    let doy = doe - 365 * yoe;
    month_day_from_march_doy(yoe + era * 4, doy)
}

/// Converts a day-of-year counted from March 1st back to a civil date.
const fn month_day_from_march_doy(march_year: i64, doy: i64) -> (i64, u32, u32) {
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { march_year + 1 } else { march_year };
    (y, m as u32, d as u32)
}

fn fixed_year_days(y: i64, m: i64, d: i64, year_len: i64, cumulative: &[i64; 12]) -> i64 {
    (y - 1970) * year_len + cumulative[(m - 1) as usize] + d - 1
}

fn fixed_year_date(days: i64, year_len: i64, cumulative: &[i64; 12]) -> (i64, u32, u32) {
    let year = days.div_euclid(year_len) + 1970;
    let doy = days.rem_euclid(year_len);
    let month = cumulative.iter().rposition(|&start| start <= doy).unwrap_or(0);
    (year, month as u32 + 1, (doy - cumulative[month] + 1) as u32)
}

// --- DateTime ---

/// A calendar-agnostic date-time. Whether it exists depends on the calendar
/// it is interpreted in (2020-02-30 is only valid in `360_day`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl DateTime {
    pub const fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        Self { year, month, day, hour, minute, second }
    }

    pub const fn ymd(year: i32, month: u32, day: u32) -> Self {
        Self::new(year, month, day, 0, 0, 0)
    }

    /// `YYYYMMDDhhmmss`, used in file names.
    pub fn compact(&self) -> String {
        format!(
            "{:04}{:02}{:02}{:02}{:02}{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

impl FromStr for DateTime {
    type Err = CouplingError;

    /// Accepts `YYYY-MM-DD`, optionally followed by `hh[:mm[:ss]]` separated
    /// by a space or `T`, and an optional trailing `Z`.
    fn from_str(s: &str) -> Result<Self> {
        let bad = || CouplingError::Configuration(format!("cannot parse date-time '{}'", s));
        let trimmed = s.trim();
        let trimmed = trimmed.strip_suffix('Z').unwrap_or(trimmed);
        let (date, time) = match trimmed.split_once(|c| c == ' ' || c == 'T') {
            Some((date, time)) => (date, time.trim()),
            None => (trimmed, ""),
        };

        let mut date_parts = date.splitn(3, '-');
        let year = date_parts.next().ok_or_else(bad)?.parse::<i32>().map_err(|_| bad())?;
        let month = date_parts.next().ok_or_else(bad)?.parse::<u32>().map_err(|_| bad())?;
        let day = date_parts.next().ok_or_else(bad)?.parse::<u32>().map_err(|_| bad())?;

        let mut hms = [0u32; 3];
        if !time.is_empty() {
            let pieces: Vec<&str> = time.split(':').collect();
            if pieces.len() > 3 {
                return Err(bad());
            }
            for (slot, piece) in hms.iter_mut().zip(&pieces) {
                // Fractional seconds are truncated; whole seconds are the resolution.
                let whole = piece.split('.').next().unwrap_or(piece);
                *slot = whole.parse::<u32>().map_err(|_| bad())?;
            }
        }
        Ok(DateTime::new(year, month, day, hms[0], hms[1], hms[2]))
    }
}

impl TryFrom<String> for DateTime {
    type Error = CouplingError;
    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<DateTime> for String {
    fn from(dt: DateTime) -> String {
        dt.to_string()
    }
}
