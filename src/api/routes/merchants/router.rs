//! Router for the merchants API

use std::sync::{Arc, RwLock};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
};

use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::availability::WorkSchedule;
use crate::booking::{self, MAX_ACCESS_DAYS};
use crate::session::{Role, Session};

type SharedState = Arc<RwLock<AppState>>;

async fn create_merchant(
    State(state): State<SharedState>,
    session: Session,
    Json(payload): Json<public::CreateMerchantRequest>,
) -> Result<(StatusCode, Json<public::Merchant>), ApiError> {
    session.require_role(&[Role::Admin])?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::bad_request("Merchant name is required"));
    }
    payload.schedule.validate().map_err(ApiError::bad_request)?;

    let (db, default_days, today) = {
        let shared_state = state.read().expect("Unable to read share state");
        (
            shared_state.db.clone(),
            shared_state.config.default_access_days,
            shared_state.now().date(),
        )
    };
    let days = payload.access_days.unwrap_or(default_days);
    if !(0..=MAX_ACCESS_DAYS).contains(&days) {
        return Err(ApiError::bad_request(format!(
            "access_days must be between 0 and {}",
            MAX_ACCESS_DAYS
        )));
    }
    let access_until = booking::access_expiry(today, days)
        .ok_or_else(|| ApiError::bad_request("access_days is out of range"))?;

    let merchant = booking::insert_merchant(&db, name, payload.schedule, access_until).await?;
    tracing::info!(merchant_id = %merchant.id, "Created merchant");

    Ok((StatusCode::CREATED, Json(merchant)))
}

async fn get_merchant(
    State(state): State<SharedState>,
    Path(merchant_id): Path<String>,
) -> Result<Json<public::Merchant>, ApiError> {
    let db = state.read().unwrap().db.clone();
    booking::find_merchant(&db, merchant_id.clone())
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Merchant {} not found", merchant_id)))
}

async fn update_schedule(
    State(state): State<SharedState>,
    session: Session,
    Path(merchant_id): Path<String>,
    Json(schedule): Json<WorkSchedule>,
) -> Result<Json<WorkSchedule>, ApiError> {
    session.require_merchant(&merchant_id)?;
    session.require_role(&[Role::Admin, Role::Merchant])?;
    schedule.validate().map_err(ApiError::bad_request)?;

    let db = state.read().unwrap().db.clone();
    if !booking::update_merchant_schedule(&db, merchant_id.clone(), schedule.clone()).await? {
        return Err(ApiError::not_found(format!(
            "Merchant {} not found",
            merchant_id
        )));
    }
    tracing::info!(%merchant_id, "Updated merchant schedule");

    Ok(Json(schedule))
}

/// Create the merchants router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", axum::routing::post(create_merchant))
        .route("/{merchant_id}", axum::routing::get(get_merchant))
        .route("/{merchant_id}/schedule", axum::routing::put(update_schedule))
}
