//! Router for the appointments API

use std::sync::{Arc, RwLock};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::Query;

use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::api::utils::{parse_date, parse_time};
use crate::booking::{self, BookingOutcome, NewAppointment};
use crate::session::{Role, Session};

type SharedState = Arc<RwLock<AppState>>;

async fn book(
    State(state): State<SharedState>,
    session: Session,
    Json(payload): Json<public::BookRequest>,
) -> Result<(StatusCode, Json<public::Appointment>), ApiError> {
    let date = parse_date(&payload.date)?;
    let start_time = parse_time(&payload.time)?;
    let client_name = payload
        .client_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| session.user_id.clone());

    let (db, now) = {
        let shared_state = state.read().expect("Unable to read share state");
        (shared_state.db.clone(), shared_state.now())
    };

    let new = NewAppointment {
        merchant_id: payload.merchant_id,
        employee_id: payload.employee_id,
        service_id: payload.service_id,
        client_name,
        date,
        start_time,
    };
    match booking::book_appointment(&db, new, now).await? {
        BookingOutcome::Booked(appointment) => {
            tracing::info!(
                appointment_id = %appointment.id,
                merchant_id = %appointment.merchant_id,
                %date,
                %start_time,
                "Booked appointment"
            );
            Ok((StatusCode::CREATED, Json(appointment)))
        }
        BookingOutcome::Unavailable => Err(ApiError::conflict(format!(
            "The slot at {} on {} is not available",
            start_time.format("%H:%M"),
            date
        ))),
        BookingOutcome::EmployeeOnLeave => Err(ApiError::conflict(format!(
            "The employee is on leave on {}",
            date
        ))),
        BookingOutcome::AccessExpired => Err(ApiError::forbidden(
            "This merchant is not accepting bookings",
        )),
        BookingOutcome::NotFound(what) => Err(ApiError::not_found(format!("Unknown {}", what))),
    }
}

async fn list_appointments(
    State(state): State<SharedState>,
    session: Session,
    Query(params): Query<public::AppointmentsQuery>,
) -> Result<Json<Vec<public::Appointment>>, ApiError> {
    session.require_merchant(&params.merchant_id)?;
    let date = params.date.as_deref().map(parse_date).transpose()?;

    let db = state.read().unwrap().db.clone();
    let appointments = booking::find_appointments(&db, params.merchant_id, date).await?;
    Ok(Json(appointments))
}

async fn cancel(
    State(state): State<SharedState>,
    session: Session,
    Path(appointment_id): Path<String>,
) -> Result<Json<public::Appointment>, ApiError> {
    let db = state.read().unwrap().db.clone();
    let mut appointment = booking::find_appointment(&db, appointment_id.clone())
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Appointment {} not found", appointment_id)))?;

    // Clients may only cancel their own bookings
    if session.role == Role::Client {
        if appointment.client_name != session.user_id {
            return Err(ApiError::forbidden("Not your appointment"));
        }
    } else {
        session.require_merchant(&appointment.merchant_id)?;
    }

    booking::cancel_appointment(&db, appointment_id.clone()).await?;
    appointment.status = public::AppointmentStatus::Cancelled;
    tracing::info!(%appointment_id, "Cancelled appointment");

    Ok(Json(appointment))
}

/// Create the appointments router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", axum::routing::post(book).get(list_appointments))
        .route("/{appointment_id}/cancel", axum::routing::post(cancel))
}
