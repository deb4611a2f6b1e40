//! Regular time axes with calendar-aware equality.

use super::calendar::{Calendar, DateTime};
use crate::error::{CouplingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// The unit a `TimeUnits` string counts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    pub fn seconds(&self) -> i64 {
        match self {
            TimeUnit::Seconds => 1,
            TimeUnit::Minutes => 60,
            TimeUnit::Hours => 3_600,
            TimeUnit::Days => 86_400,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
        }
    }
}

/// A CF-style reference such as `days since 2019-01-01 09:00:00Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeUnits {
    pub unit: TimeUnit,
    pub epoch: DateTime,
}

impl FromStr for TimeUnits {
    type Err = CouplingError;

    fn from_str(s: &str) -> Result<Self> {
        let (unit, epoch) = s.trim().split_once(" since ").ok_or_else(|| {
            CouplingError::Configuration(format!("time units '{}' lack a 'since' reference", s))
        })?;
        let unit = match unit.trim().to_ascii_lowercase().as_str() {
            "seconds" | "second" | "secs" | "sec" | "s" => TimeUnit::Seconds,
            "minutes" | "minute" | "mins" | "min" => TimeUnit::Minutes,
            "hours" | "hour" | "hrs" | "hr" | "h" => TimeUnit::Hours,
            "days" | "day" | "d" => TimeUnit::Days,
            other => {
                return Err(CouplingError::Configuration(format!(
                    "time unit '{}' is not supported",
                    other
                )))
            }
        };
        Ok(TimeUnits { unit, epoch: epoch.parse()? })
    }
}

impl fmt::Display for TimeUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} since {}Z", self.unit.as_str(), self.epoch)
    }
}

impl TryFrom<String> for TimeUnits {
    type Error = CouplingError;
    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<TimeUnits> for String {
    fn from(units: TimeUnits) -> String {
        units.to_string()
    }
}

/// An ordered, uniformly spaced sequence of instants.
///
/// N timestamps describe N-1 steps: step `i` spans `[t_i, t_{i+1})`, which is
/// also the bound attached to it. Instants are held as whole seconds since the
/// units' epoch.
#[derive(Debug, Clone)]
pub struct TimeDomain {
    calendar: Calendar,
    units: TimeUnits,
    epoch: i64,
    offsets: Vec<i64>,
    bounds: Vec<[i64; 2]>,
    step: i64,
}

impl TimeDomain {
    /// Builds a domain from numeric timestamps expressed in `units`.
    pub fn new(timestamps: &[f64], units: &str, calendar: Calendar) -> Result<Self> {
        let units: TimeUnits = units.parse()?;
        let scale = units.unit.seconds() as f64;
        let offsets = timestamps
            .iter()
            .map(|&t| {
                let secs = t * scale;
                let rounded = secs.round();
                if !secs.is_finite() || (secs - rounded).abs() > 1e-6 * rounded.abs().max(1.0) {
                    return Err(CouplingError::Configuration(format!(
                        "timestamp {} {} does not fall on a whole second",
                        t,
                        units.unit.as_str()
                    )));
                }
                Ok(rounded as i64)
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_offsets(offsets, units, calendar)
    }

    /// Builds the sequence `start, start + step, ..., end`.
    ///
    /// `end == start` is rejected along with `end < start`: the last timestamp
    /// only closes the final step, so a single timestamp describes no step.
    pub fn from_start_end_step(
        start: DateTime,
        end: DateTime,
        step: Duration,
        calendar: Calendar,
        units: &str,
    ) -> Result<Self> {
        let units: TimeUnits = units.parse()?;
        let step_secs = whole_seconds(step)?;
        let first = calendar.to_seconds(&start)?;
        let last = calendar.to_seconds(&end)?;
        if last < first {
            return Err(CouplingError::Configuration(format!(
                "end {} precedes start {}",
                end, start
            )));
        }
        if (last - first) % step_secs != 0 {
            return Err(CouplingError::Configuration(format!(
                "step of {}s does not divide the period from {} to {}",
                step_secs, start, end
            )));
        }
        let epoch = calendar.to_seconds(&units.epoch)?;
        let count = (last - first) / step_secs + 1;
        let offsets = (0..count).map(|k| first - epoch + k * step_secs).collect();
        Self::from_offsets(offsets, units, calendar)
    }

    /// Builds a domain from explicit date-times, which must be regularly spaced.
    pub fn from_datetime_sequence(
        datetimes: &[DateTime],
        calendar: Calendar,
        units: &str,
    ) -> Result<Self> {
        let units: TimeUnits = units.parse()?;
        let epoch = calendar.to_seconds(&units.epoch)?;
        let offsets = datetimes
            .iter()
            .map(|dt| Ok(calendar.to_seconds(dt)? - epoch))
            .collect::<Result<Vec<_>>>()?;
        Self::from_offsets(offsets, units, calendar)
    }

    fn from_offsets(offsets: Vec<i64>, units: TimeUnits, calendar: Calendar) -> Result<Self> {
        let epoch = calendar.to_seconds(&units.epoch)?;
        if offsets.len() < 2 {
            return Err(CouplingError::Configuration(
                "a time domain needs at least two timestamps to define a step".into(),
            ));
        }
        let step = offsets[1] - offsets[0];
        if step <= 0 {
            return Err(CouplingError::Configuration(
                "timestamps must be strictly increasing".into(),
            ));
        }
        if let Some(w) = offsets.windows(2).position(|w| w[1] - w[0] != step) {
            return Err(CouplingError::Configuration(format!(
                "timestamps are not regularly spaced: gap of {}s after position {} where {}s was expected",
                offsets[w + 1] - offsets[w],
                w,
                step
            )));
        }
        let bounds = offsets.windows(2).map(|w| [w[0], w[1]]).collect();
        Ok(Self { calendar, units, epoch, offsets, bounds, step })
    }

    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    pub fn units(&self) -> &TimeUnits {
        &self.units
    }

    /// Number of timestamps.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Always false; a domain carries at least two timestamps.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Number of steps, one fewer than the number of timestamps.
    pub fn step_count(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn step(&self) -> Duration {
        Duration::from_secs(self.step as u64)
    }

    pub fn step_seconds(&self) -> i64 {
        self.step
    }

    /// Absolute instant of timestamp `i` on the calendar's scale.
    pub fn instant(&self, i: usize) -> i64 {
        self.epoch + self.offsets[i]
    }

    pub fn datetime(&self, i: usize) -> DateTime {
        self.calendar.from_seconds(self.instant(i))
    }

    pub fn first(&self) -> DateTime {
        self.datetime(0)
    }

    pub fn last(&self) -> DateTime {
        self.datetime(self.len() - 1)
    }

    pub fn datetimes(&self) -> impl Iterator<Item = DateTime> + '_ {
        (0..self.len()).map(move |i| self.datetime(i))
    }

    /// Offsets of each timestamp, expressed in the domain's units.
    pub fn timestamps(&self) -> Vec<f64> {
        let scale = self.units.unit.seconds() as f64;
        self.offsets.iter().map(|&o| o as f64 / scale).collect()
    }

    /// Per-step bounds, in seconds since the units' epoch.
    pub fn bounds(&self) -> &[[i64; 2]] {
        &self.bounds
    }

    /// The covered period `[first bound start, last bound end)` as absolute instants.
    pub fn period(&self) -> (i64, i64) {
        (self.epoch + self.bounds[0][0], self.epoch + self.bounds[self.bounds.len() - 1][1])
    }

    pub fn index_of_instant(&self, instant: i64) -> Option<usize> {
        let rel = instant - self.instant(0);
        if rel < 0 || rel % self.step != 0 {
            return None;
        }
        let index = (rel / self.step) as usize;
        (index < self.len()).then_some(index)
    }

    pub fn index_of(&self, dt: &DateTime) -> Option<usize> {
        let instant = self.calendar.to_seconds(dt).ok()?;
        self.index_of_instant(instant)
    }

    /// True if both domains hold the same instants under the same calendar.
    /// The epoch and unit they are expressed in do not matter.
    pub fn is_time_equal_to(&self, other: &TimeDomain) -> bool {
        self.calendar == other.calendar
            && self.len() == other.len()
            && self.step == other.step
            && (0..self.len()).all(|i| self.instant(i) == other.instant(i))
    }

    /// True if both domains cover the same period, regardless of their step.
    pub fn spans_same_period_as(&self, other: &TimeDomain) -> bool {
        self.calendar == other.calendar && self.period() == other.period()
    }

    /// True if `[start, end]` lies on this domain's timestamps and spans at least one step.
    pub fn contains_window(&self, start: &DateTime, end: &DateTime) -> bool {
        match (self.index_of(start), self.index_of(end)) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        }
    }

    /// The sub-domain running from `start` to `end` inclusive.
    pub fn window(&self, start: &DateTime, end: &DateTime) -> Result<TimeDomain> {
        let (a, b) = match (self.index_of(start), self.index_of(end)) {
            (Some(a), Some(b)) if a < b => (a, b),
            _ => {
                return Err(CouplingError::Configuration(format!(
                    "window [{}, {}] is not contained in the period [{}, {}] with step {}s",
                    start,
                    end,
                    self.first(),
                    self.last(),
                    self.step
                )))
            }
        };
        Self::from_offsets(self.offsets[a..=b].to_vec(), self.units, self.calendar)
    }
}

impl PartialEq for TimeDomain {
    fn eq(&self, other: &Self) -> bool {
        self.is_time_equal_to(other)
    }
}

impl fmt::Display for TimeDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TimeDomain(")?;
        writeln!(
            f,
            "    time ({},): [{}, ..., {}] {}",
            self.len(),
            self.first(),
            self.last(),
            self.units
        )?;
        writeln!(f, "    bounds ({}, 2)", self.bounds.len())?;
        writeln!(f, "    step: {}s", self.step)?;
        writeln!(f, "    calendar: {}", self.calendar)?;
        write!(f, ")")
    }
}

fn whole_seconds(step: Duration) -> Result<i64> {
    if step.subsec_nanos() != 0 || step.as_secs() == 0 {
        return Err(CouplingError::Configuration(format!(
            "step {:?} must be a positive whole number of seconds",
            step
        )));
    }
    Ok(step.as_secs() as i64)
}
