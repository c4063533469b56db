//! Public types for the admin API
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct GrantAccessRequest {
    /// Defaults to the configured grant length
    pub days: Option<i64>,
}

#[derive(Serialize, Deserialize)]
pub struct GrantAccessResponse {
    pub merchant_id: String,
    pub access_until: String,
}
