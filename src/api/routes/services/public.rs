//! Public types for the services API
use serde::Deserialize;

pub use crate::booking::Service;

#[derive(Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub price_cents: i64,
}
