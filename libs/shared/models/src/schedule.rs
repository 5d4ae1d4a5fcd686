//! Wall-clock primitives shared by doctor availability and appointment logic.
//!
//! Availability windows are expressed in the clinic's local time of day while
//! appointments are stored as absolute UTC instants. [`ClinicClock`] is the one
//! place where the two meet.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParseError {
    #[error("time must be formatted as HH:mm or HH:mm:ss, got '{0}'")]
    Format(String),

    #[error("time '{0}' is out of range")]
    OutOfRange(String),

    #[error("time '{0}' has a seconds component, only whole minutes are supported")]
    Seconds(String),
}

/// The date cannot be placed on the UTC timeline at the clinic offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("date {0} is outside the supported calendar range")]
pub struct DateOutOfRange(pub NaiveDate);

/// A time of day with minute precision, stored as minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self((hour * 60 + minute) as u16))
        } else {
            None
        }
    }

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self(minutes as u16))
    }

    pub fn parse(raw: &str) -> Result<Self, TimeParseError> {
        let trimmed = raw.trim();
        let parts: Vec<&str> = trimmed.split(':').collect();
        if !(2..=3).contains(&parts.len()) || parts.iter().any(|p| p.len() != 2) {
            return Err(TimeParseError::Format(raw.to_string()));
        }

        let numbers = parts
            .iter()
            .map(|p| p.parse::<u32>())
            .collect::<Result<Vec<u32>, _>>()
            .map_err(|_| TimeParseError::Format(raw.to_string()))?;

        if numbers.get(2).is_some_and(|seconds| *seconds != 0) {
            return Err(TimeParseError::Seconds(raw.to_string()));
        }

        Self::from_hm(numbers[0], numbers[1]).ok_or_else(|| TimeParseError::OutOfRange(raw.to_string()))
    }

    pub fn minutes(self) -> u32 {
        u32::from(self.0)
    }

    pub fn hour(self) -> u32 {
        self.minutes() / 60
    }

    pub fn minute(self) -> u32 {
        self.minutes() % 60
    }

    pub fn checked_add_minutes(self, minutes: u32) -> Option<Self> {
        Self::from_minutes(self.minutes() + minutes)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

// Serialized in the `time` column format used by Postgres.
impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:02}:{:02}:00", self.hour(), self.minute()))
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TimeOfDay::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Weekday index with Sunday = 0 ... Saturday = 6.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Half-open interval overlap: `[s1, e1)` and `[s2, e2)` intersect.
pub fn intervals_overlap(
    start1: DateTime<Utc>,
    end1: DateTime<Utc>,
    start2: DateTime<Utc>,
    end2: DateTime<Utc>,
) -> bool {
    start1 < end2 && start2 < end1
}

/// Converts between the clinic's wall clock and UTC using a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClinicClock {
    offset_minutes: i32,
}

impl ClinicClock {
    pub fn new(offset_minutes: i32) -> Self {
        Self { offset_minutes }
    }

    pub fn utc() -> Self {
        Self::new(0)
    }

    pub fn offset_minutes(&self) -> i32 {
        self.offset_minutes
    }

    fn offset(&self) -> Duration {
        Duration::minutes(i64::from(self.offset_minutes))
    }

    /// Fails for dates at the edge of chrono's range, which clients can send
    /// as extended years such as `+262142-12-31`.
    pub fn to_utc(&self, date: NaiveDate, time: TimeOfDay) -> Result<DateTime<Utc>, DateOutOfRange> {
        date.and_time(NaiveTime::MIN)
            .checked_add_signed(Duration::minutes(i64::from(time.minutes())))
            .and_then(|local| local.checked_sub_signed(self.offset()))
            .map(|utc| utc.and_utc())
            .ok_or(DateOutOfRange(date))
    }

    pub fn local(&self, at: DateTime<Utc>) -> Option<NaiveDateTime> {
        at.naive_utc().checked_add_signed(self.offset())
    }

    pub fn local_date(&self, at: DateTime<Utc>) -> Option<NaiveDate> {
        self.local(at).map(|local| local.date())
    }

    /// Local time of day, truncated to the minute.
    pub fn local_time_of_day(&self, at: DateTime<Utc>) -> Option<TimeOfDay> {
        let time = self.local(at)?.time();
        Some(TimeOfDay((time.hour() * 60 + time.minute()) as u16))
    }

    /// `[start, end)` of a local calendar day in UTC.
    pub fn day_bounds(&self, date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>), DateOutOfRange> {
        let start = self.to_utc(date, TimeOfDay::MIDNIGHT)?;
        let end = start.checked_add_signed(Duration::days(1)).ok_or(DateOutOfRange(date))?;
        Ok((start, end))
    }

    pub fn today(&self) -> NaiveDate {
        let now = Utc::now();
        self.local_date(now).unwrap_or_else(|| now.date_naive())
    }
}

impl Default for ClinicClock {
    fn default() -> Self {
        Self::utc()
    }
}

/// A doctor's recurring weekly bookable range.
///
/// The weekday span may wrap around the end of the week (Friday to Monday),
/// `from_weekday == to_weekday` covers a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    #[serde(rename = "available_from_week_day")]
    pub from_weekday: u8,
    #[serde(rename = "available_to_week_day")]
    pub to_weekday: u8,
    #[serde(rename = "available_from_time")]
    pub from_time: TimeOfDay,
    #[serde(rename = "available_to_time")]
    pub to_time: TimeOfDay,
}

impl AvailabilityWindow {
    pub fn validate(&self) -> Result<(), String> {
        if self.from_weekday > 6 || self.to_weekday > 6 {
            return Err("Weekdays must be between 0 (Sunday) and 6 (Saturday)".to_string());
        }
        if self.from_time >= self.to_time {
            return Err("Available from time must be before available to time".to_string());
        }
        Ok(())
    }

    pub fn covers_weekday(&self, weekday: u8) -> bool {
        if self.from_weekday <= self.to_weekday {
            (self.from_weekday..=self.to_weekday).contains(&weekday)
        } else {
            weekday >= self.from_weekday || weekday <= self.to_weekday
        }
    }

    pub fn covers_date(&self, date: NaiveDate) -> bool {
        self.covers_weekday(weekday_index(date))
    }

    /// Whether `[start, end)` lies inside the window on the local date `start` falls on.
    pub fn contains(&self, clock: &ClinicClock, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        if start >= end {
            return false;
        }

        let Some(date) = clock.local_date(start) else {
            return false;
        };
        if !self.covers_date(date) {
            return false;
        }

        match (clock.to_utc(date, self.from_time), clock.to_utc(date, self.to_time)) {
            (Ok(window_start), Ok(window_end)) => window_start <= start && end <= window_end,
            _ => false,
        }
    }

    /// Slot starts stepping from `from_time`; a trailing partial slot is dropped.
    pub fn slot_starts(&self, slot_minutes: u32) -> Vec<TimeOfDay> {
        if slot_minutes == 0 {
            return Vec::new();
        }

        let mut starts = Vec::new();
        let mut current = self.from_time.minutes();
        while current + slot_minutes <= self.to_time.minutes() {
            if let Some(start) = TimeOfDay::from_minutes(current) {
                starts.push(start);
            }
            current += slot_minutes;
        }
        starts
    }
}
