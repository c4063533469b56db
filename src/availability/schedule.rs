//! Schedule inputs consumed by the availability calculator
use std::fmt;

use anyhow::{Result, anyhow};
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

/// Set of weekdays a merchant or employee works, indexed Sunday = 0
/// through Saturday = 6.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct WorkDays(u8);

impl WorkDays {
    const ALL: u8 = 0b0111_1111;

    pub fn from_weekdays<I: IntoIterator<Item = Weekday>>(days: I) -> Self {
        days.into_iter().fold(Self(0), |acc, day| {
            Self(acc.0 | 1 << day.num_days_from_sunday())
        })
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_sunday()) != 0
    }

    pub fn is_work_date(&self, date: NaiveDate) -> bool {
        self.contains(date.weekday())
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Day numbers in ascending order
    pub fn days(&self) -> Vec<u8> {
        (0..7).filter(|i| self.0 & (1 << i) != 0).collect()
    }

    pub fn bits(&self) -> u8 {
        self.0
    }
}

impl TryFrom<Vec<u8>> for WorkDays {
    type Error = String;

    fn try_from(days: Vec<u8>) -> Result<Self, Self::Error> {
        days.into_iter().try_fold(Self(0), |acc, day| {
            if day > 6 {
                Err(format!("work day {} is outside 0-6 (Sunday = 0)", day))
            } else {
                Ok(Self(acc.0 | 1 << day))
            }
        })
    }
}

impl From<WorkDays> for Vec<u8> {
    fn from(days: WorkDays) -> Self {
        days.days()
    }
}

impl ToSql for WorkDays {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(i64::from(self.0).into())
    }
}

impl FromSql for WorkDays {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let bits = value.as_i64()?;
        if !(0..=i64::from(Self::ALL)).contains(&bits) {
            return Err(FromSqlError::OutOfRange(bits));
        }
        Ok(Self(bits as u8))
    }
}

/// Serde adapter for `HH:MM` wall clock times
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub const FORMAT: &str = "%H:%M";

    pub fn parse(s: &str) -> Result<NaiveTime, chrono::ParseError> {
        NaiveTime::parse_from_str(s, FORMAT)
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(|e| D::Error::custom(format!("expected HH:MM, got {:?}: {}", s, e)))
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer, de::Error};

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(t) => super::serialize(t, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|s| {
                    super::parse(&s)
                        .map_err(|e| D::Error::custom(format!("expected HH:MM, got {:?}: {}", s, e)))
                })
                .transpose()
        }
    }
}

/// Minutes since midnight
pub fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Working hours shared by merchants and employees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkSchedule {
    pub work_days: WorkDays,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    #[serde(default, with = "hhmm::option")]
    pub break_start_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm::option")]
    pub break_end_time: Option<NaiveTime>,
}

impl WorkSchedule {
    /// Checks the schedule is well formed. The calculator tolerates bad
    /// schedules by offering nothing; this is for rejecting them on write.
    pub fn validate(&self) -> Result<()> {
        if self.start_time >= self.end_time {
            return Err(anyhow!(
                "start time {} must be before end time {}",
                self.start_time.format(hhmm::FORMAT),
                self.end_time.format(hhmm::FORMAT)
            ));
        }
        match (self.break_start_time, self.break_end_time) {
            (None, None) => Ok(()),
            (Some(start), Some(end)) => {
                if start >= end {
                    Err(anyhow!("break start must be before break end"))
                } else if start < self.start_time || end > self.end_time {
                    Err(anyhow!("break must lie within working hours"))
                } else {
                    Ok(())
                }
            }
            _ => Err(anyhow!("break needs both a start and an end time")),
        }
    }
}

/// A calendar date on which an employee is fully unavailable
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOff {
    pub employee_id: String,
    pub date: NaiveDate,
}

/// Occupied time derived from an existing, non-cancelled appointment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BookedInterval {
    pub start: NaiveTime,
    /// Real end of the appointment. Not used for occupancy, which is always
    /// a single block from `start`.
    pub end: NaiveTime,
}

impl BookedInterval {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Half open `[start, start + block)` span in minutes of day
    pub fn occupied_span(&self) -> (u32, u32) {
        let start = minute_of_day(self.start);
        (start, start + super::BOOKED_BLOCK_MINUTES)
    }
}

/// A bookable start time on the slot grid. Displays and serializes as `HH:MM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot(#[serde(with = "hhmm")] pub NaiveTime);

impl Slot {
    pub fn time(&self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(hhmm::FORMAT))
    }
}
