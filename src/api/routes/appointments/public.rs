//! Public types for the appointments API
use serde::Deserialize;

pub use crate::booking::{Appointment, AppointmentStatus};

#[derive(Deserialize)]
pub struct BookRequest {
    pub merchant_id: String,
    pub employee_id: Option<String>,
    pub service_id: String,
    /// Defaults to the signed in user
    pub client_name: Option<String>,
    pub date: String,
    pub time: String,
}

#[derive(Deserialize)]
pub struct AppointmentsQuery {
    pub merchant_id: String,
    pub date: Option<String>,
}
