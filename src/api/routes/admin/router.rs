//! Router for the admin API

use std::sync::{Arc, RwLock};

use axum::{
    Json, Router,
    extract::{Path, State},
};

use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::booking::{self, MAX_ACCESS_DAYS};
use crate::core::db::format_date;
use crate::session::{Role, Session};

type SharedState = Arc<RwLock<AppState>>;

/// Extend how long a merchant may take bookings
async fn grant_access(
    State(state): State<SharedState>,
    session: Session,
    Path(merchant_id): Path<String>,
    Json(payload): Json<public::GrantAccessRequest>,
) -> Result<Json<public::GrantAccessResponse>, ApiError> {
    session.require_role(&[Role::Admin])?;

    let (db, default_days, today) = {
        let shared_state = state.read().expect("Unable to read share state");
        (
            shared_state.db.clone(),
            shared_state.config.default_access_days,
            shared_state.now().date(),
        )
    };
    let days = payload.days.unwrap_or(default_days);
    if !(1..=MAX_ACCESS_DAYS).contains(&days) {
        return Err(ApiError::bad_request(format!(
            "days must be between 1 and {}",
            MAX_ACCESS_DAYS
        )));
    }

    let until = booking::grant_access(&db, merchant_id.clone(), days, today)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Merchant {} not found", merchant_id)))?;
    tracing::info!(%merchant_id, %until, granted_by = %session.user_id, "Granted access");

    Ok(Json(public::GrantAccessResponse {
        merchant_id,
        access_until: format_date(until),
    }))
}

/// Create the admin router
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/merchants/{merchant_id}/access",
        axum::routing::post(grant_access),
    )
}
