//! API routes module

pub mod admin;
pub mod appointments;
pub mod availability;
pub mod employees;
pub mod merchants;
pub mod services;

use std::sync::{Arc, RwLock};

use axum::Router;

use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Merchant accounts and schedules
        .nest("/merchants", merchants::router())
        // Services and employees live under their merchant
        .merge(services::router())
        .merge(employees::router())
        // Public slot lookups
        .nest("/availability", availability::router())
        // Bookings
        .nest("/appointments", appointments::router())
        // Admin only
        .nest("/admin", admin::router())
}
