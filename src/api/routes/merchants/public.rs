//! Public types for the merchants API
use serde::Deserialize;

use crate::availability::WorkSchedule;
pub use crate::booking::Merchant;

#[derive(Deserialize)]
pub struct CreateMerchantRequest {
    pub name: String,
    pub schedule: WorkSchedule,
    /// Days of access to grant up front. Uses the configured default when
    /// not given.
    pub access_days: Option<i64>,
}
