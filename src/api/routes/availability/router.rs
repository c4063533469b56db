//! Router for the availability API

use std::sync::{Arc, RwLock};

use axum::{Router, extract::State, response::Json};
use axum_extra::extract::Query;
use tokio_rusqlite::Connection;

use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::api::utils::{parse_date, parse_time};
use crate::availability::MAX_DURATION_MINUTES;
use crate::booking;
use crate::core::db::format_date;

type SharedState = Arc<RwLock<AppState>>;

/// Minutes the requested slot lasts, from the service if one is named
async fn resolve_duration(
    db: &Connection,
    merchant_id: &str,
    service_id: Option<&str>,
    duration: Option<u32>,
) -> Result<u32, ApiError> {
    let duration = match (service_id, duration) {
        (Some(service_id), _) => {
            let service = booking::find_service(db, service_id.to_string())
                .await?
                .filter(|s| s.merchant_id == merchant_id)
                .ok_or_else(|| ApiError::not_found(format!("Service {} not found", service_id)))?;
            service.duration_minutes
        }
        (None, Some(duration)) => duration,
        (None, None) => {
            return Err(ApiError::bad_request(
                "Either service_id or duration is required",
            ));
        }
    };
    if duration == 0 {
        return Err(ApiError::bad_request("duration must be positive"));
    }
    if duration > MAX_DURATION_MINUTES {
        return Err(ApiError::bad_request(format!(
            "duration must be at most {} minutes",
            MAX_DURATION_MINUTES
        )));
    }
    Ok(duration)
}

fn not_found(merchant_id: &str, employee_id: Option<&str>) -> ApiError {
    match employee_id {
        Some(employee_id) => ApiError::not_found(format!(
            "Employee {} not found at merchant {}",
            employee_id, merchant_id
        )),
        None => ApiError::not_found(format!("Merchant {} not found", merchant_id)),
    }
}

async fn list_slots(
    State(state): State<SharedState>,
    Query(params): Query<public::AvailabilityQuery>,
) -> Result<Json<public::AvailabilityResponse>, ApiError> {
    let date = parse_date(&params.date)?;
    let (db, now) = {
        let shared_state = state.read().expect("Unable to read share state");
        (shared_state.db.clone(), shared_state.now())
    };
    let duration = resolve_duration(
        &db,
        &params.merchant_id,
        params.service_id.as_deref(),
        params.duration,
    )
    .await?;

    let slots = booking::find_available_slots(
        &db,
        params.merchant_id.clone(),
        params.employee_id.clone(),
        date,
        duration,
        now,
    )
    .await?
    .ok_or_else(|| not_found(&params.merchant_id, params.employee_id.as_deref()))?;

    Ok(Json(public::AvailabilityResponse {
        date: format_date(date),
        slots,
    }))
}

async fn check_slot(
    State(state): State<SharedState>,
    Query(params): Query<public::CheckQuery>,
) -> Result<Json<public::CheckResponse>, ApiError> {
    let date = parse_date(&params.date)?;
    let time = parse_time(&params.time)?;
    let (db, now) = {
        let shared_state = state.read().expect("Unable to read share state");
        (shared_state.db.clone(), shared_state.now())
    };
    let duration = resolve_duration(
        &db,
        &params.merchant_id,
        params.service_id.as_deref(),
        params.duration,
    )
    .await?;

    let available = booking::check_availability(
        &db,
        params.merchant_id.clone(),
        params.employee_id.clone(),
        date,
        time,
        duration,
        now,
    )
    .await?
    .ok_or_else(|| not_found(&params.merchant_id, params.employee_id.as_deref()))?;

    Ok(Json(public::CheckResponse { available }))
}

/// Create the availability router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", axum::routing::get(list_slots))
        .route("/check", axum::routing::get(check_slot))
}
