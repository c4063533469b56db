use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{Duration, NaiveDate, NaiveTime};
use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::availability::{WorkSchedule, hhmm};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Merchant {
    pub id: String,
    pub name: String,
    pub schedule: WorkSchedule,
    /// Last day the merchant may take bookings
    pub access_until: Option<NaiveDate>,
}

/// Most days of access a single grant may add
pub const MAX_ACCESS_DAYS: i64 = 3650;

impl Merchant {
    pub fn has_access(&self, today: NaiveDate) -> bool {
        self.access_until.is_some_and(|until| until >= today)
    }
}

/// `from` plus `days`, or `None` if that falls outside the calendar
pub fn access_expiry(from: NaiveDate, days: i64) -> Option<NaiveDate> {
    Duration::try_days(days).and_then(|delta| from.checked_add_signed(delta))
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub merchant_id: String,
    pub name: String,
    pub duration_minutes: u32,
    pub price_cents: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub merchant_id: String,
    pub name: String,
    /// Own working hours. Falls back to the merchant's when unset.
    pub schedule: Option<WorkSchedule>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            _ => Err(anyhow!("Unknown appointment status: {}", s)),
        }
    }
}

impl ToSql for AppointmentStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for AppointmentStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: anyhow::Error| FromSqlError::Other(e.into()))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub merchant_id: String,
    pub employee_id: Option<String>,
    pub service_id: String,
    pub client_name: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
}

#[derive(Clone, Debug)]
pub struct NewAppointment {
    pub merchant_id: String,
    pub employee_id: Option<String>,
    pub service_id: String,
    pub client_name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
}

/// Result of trying to book a slot
#[derive(Debug)]
pub enum BookingOutcome {
    Booked(Appointment),
    /// Slot is taken, in the past, or not an offered start time
    Unavailable,
    /// The requested employee has the day off
    EmployeeOnLeave,
    /// The merchant's access has lapsed
    AccessExpired,
    /// Referenced merchant, service or employee does not exist
    NotFound(&'static str),
}
