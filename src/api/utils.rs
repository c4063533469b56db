use chrono::{NaiveDate, NaiveTime};

use crate::api::public::ApiError;
use crate::availability::hhmm;
use crate::core::db::DATE_FORMAT;

pub fn parse_date(s: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| ApiError::bad_request(format!("Invalid date {:?}, expected YYYY-MM-DD", s)))
}

pub fn parse_time(s: &str) -> Result<NaiveTime, ApiError> {
    hhmm::parse(s)
        .map_err(|_| ApiError::bad_request(format!("Invalid time {:?}, expected HH:MM", s)))
}
