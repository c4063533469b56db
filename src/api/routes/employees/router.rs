//! Router for the employees and days off API

use std::sync::{Arc, RwLock};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
};
use tokio_rusqlite::Connection;

use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::api::utils::parse_date;
use crate::booking;
use crate::core::db::format_date;
use crate::session::{Role, Session};

type SharedState = Arc<RwLock<AppState>>;

async fn create_employee(
    State(state): State<SharedState>,
    session: Session,
    Path(merchant_id): Path<String>,
    Json(payload): Json<public::CreateEmployeeRequest>,
) -> Result<(StatusCode, Json<public::Employee>), ApiError> {
    session.require_merchant(&merchant_id)?;
    session.require_role(&[Role::Admin, Role::Merchant])?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::bad_request("Employee name is required"));
    }
    if let Some(schedule) = &payload.schedule {
        schedule.validate().map_err(ApiError::bad_request)?;
    }

    let db = state.read().unwrap().db.clone();
    if booking::find_merchant(&db, merchant_id.clone()).await?.is_none() {
        return Err(ApiError::not_found(format!("Merchant {} not found", merchant_id)));
    }

    let employee = booking::insert_employee(&db, merchant_id, name, payload.schedule).await?;
    tracing::info!(employee_id = %employee.id, "Created employee");

    Ok((StatusCode::CREATED, Json(employee)))
}

async fn list_employees(
    State(state): State<SharedState>,
    Path(merchant_id): Path<String>,
) -> Result<Json<Vec<public::Employee>>, ApiError> {
    let db = state.read().unwrap().db.clone();
    let employees = booking::find_employees(&db, merchant_id).await?;
    Ok(Json(employees))
}

/// Look up the employee and check the session may manage them
async fn authorize_employee(
    db: &Connection,
    session: &Session,
    employee_id: &str,
    roles: &[Role],
) -> Result<public::Employee, ApiError> {
    session.require_role(roles)?;
    let employee = booking::find_employee(db, employee_id.to_string())
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Employee {} not found", employee_id)))?;
    session.require_merchant(&employee.merchant_id)?;
    Ok(employee)
}

async fn add_day_off(
    State(state): State<SharedState>,
    session: Session,
    Path(employee_id): Path<String>,
    Json(payload): Json<public::DayOffRequest>,
) -> Result<StatusCode, ApiError> {
    let date = parse_date(&payload.date)?;
    let db = state.read().unwrap().db.clone();
    authorize_employee(&db, &session, &employee_id, &[Role::Admin, Role::Merchant]).await?;

    booking::insert_day_off(&db, employee_id.clone(), date).await?;
    tracing::info!(%employee_id, %date, "Added day off");

    Ok(StatusCode::CREATED)
}

async fn list_days_off(
    State(state): State<SharedState>,
    session: Session,
    Path(employee_id): Path<String>,
) -> Result<Json<public::DaysOffResponse>, ApiError> {
    let db = state.read().unwrap().db.clone();
    authorize_employee(
        &db,
        &session,
        &employee_id,
        &[Role::Admin, Role::Merchant, Role::Employee],
    )
    .await?;

    let dates = booking::find_days_off(&db, employee_id.clone())
        .await?
        .into_iter()
        .map(|day| format_date(day.date))
        .collect();

    Ok(Json(public::DaysOffResponse { employee_id, dates }))
}

async fn remove_day_off(
    State(state): State<SharedState>,
    session: Session,
    Path((employee_id, date)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let date = parse_date(&date)?;
    let db = state.read().unwrap().db.clone();
    authorize_employee(&db, &session, &employee_id, &[Role::Admin, Role::Merchant]).await?;

    if !booking::delete_day_off(&db, employee_id.clone(), date).await? {
        return Err(ApiError::not_found(format!(
            "No day off on {} for employee {}",
            date, employee_id
        )));
    }
    tracing::info!(%employee_id, %date, "Removed day off");

    Ok(StatusCode::NO_CONTENT)
}

/// Create the employees router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/merchants/{merchant_id}/employees",
            axum::routing::post(create_employee).get(list_employees),
        )
        .route(
            "/employees/{employee_id}/days-off",
            axum::routing::post(add_day_off).get(list_days_off),
        )
        .route(
            "/employees/{employee_id}/days-off/{date}",
            axum::routing::delete(remove_day_off),
        )
}
