//! Router for the services API

use std::sync::{Arc, RwLock};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
};

use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::availability::MAX_DURATION_MINUTES;
use crate::booking;
use crate::session::{Role, Session};

type SharedState = Arc<RwLock<AppState>>;

async fn create_service(
    State(state): State<SharedState>,
    session: Session,
    Path(merchant_id): Path<String>,
    Json(payload): Json<public::CreateServiceRequest>,
) -> Result<(StatusCode, Json<public::Service>), ApiError> {
    session.require_merchant(&merchant_id)?;
    session.require_role(&[Role::Admin, Role::Merchant])?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::bad_request("Service name is required"));
    }
    if payload.duration_minutes == 0 {
        return Err(ApiError::bad_request("duration_minutes must be positive"));
    }
    if payload.duration_minutes > MAX_DURATION_MINUTES {
        return Err(ApiError::bad_request(format!(
            "duration_minutes must be at most {}",
            MAX_DURATION_MINUTES
        )));
    }
    if payload.price_cents < 0 {
        return Err(ApiError::bad_request("price_cents must not be negative"));
    }

    let db = state.read().unwrap().db.clone();
    if booking::find_merchant(&db, merchant_id.clone()).await?.is_none() {
        return Err(ApiError::not_found(format!("Merchant {} not found", merchant_id)));
    }

    let service = booking::insert_service(
        &db,
        merchant_id,
        name,
        payload.duration_minutes,
        payload.price_cents,
    )
    .await?;
    tracing::info!(service_id = %service.id, "Created service");

    Ok((StatusCode::CREATED, Json(service)))
}

async fn list_services(
    State(state): State<SharedState>,
    Path(merchant_id): Path<String>,
) -> Result<Json<Vec<public::Service>>, ApiError> {
    let db = state.read().unwrap().db.clone();
    let services = booking::find_services(&db, merchant_id).await?;
    Ok(Json(services))
}

/// Create the services router
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/merchants/{merchant_id}/services",
        axum::routing::post(create_service).get(list_services),
    )
}
