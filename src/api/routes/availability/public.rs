//! Public types for the availability API
use serde::{Deserialize, Serialize};

use crate::availability::Slot;

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub merchant_id: String,
    pub date: String,
    pub employee_id: Option<String>,
    /// Service whose duration to use. Takes precedence over `duration`.
    pub service_id: Option<String>,
    /// Duration in minutes when no service is given
    pub duration: Option<u32>,
}

#[derive(Deserialize)]
pub struct CheckQuery {
    pub merchant_id: String,
    pub date: String,
    pub time: String,
    pub employee_id: Option<String>,
    pub service_id: Option<String>,
    pub duration: Option<u32>,
}

#[derive(Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub date: String,
    pub slots: Vec<Slot>,
}

#[derive(Serialize, Deserialize)]
pub struct CheckResponse {
    pub available: bool,
}
