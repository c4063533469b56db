//! Public types for the employees API
use serde::{Deserialize, Serialize};

use crate::availability::WorkSchedule;
pub use crate::booking::Employee;

#[derive(Deserialize)]
pub struct CreateEmployeeRequest {
    pub name: String,
    /// Leave out to follow the merchant's hours
    pub schedule: Option<WorkSchedule>,
}

#[derive(Deserialize)]
pub struct DayOffRequest {
    pub date: String,
}

#[derive(Serialize, Deserialize)]
pub struct DaysOffResponse {
    pub employee_id: String,
    pub dates: Vec<String>,
}
