//! Queries feeding the availability calculator and the booking write path
use anyhow::{Error, Result, anyhow};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{ErrorCode, OptionalExtension};
use tokio_rusqlite::{Connection, params};
use uuid::Uuid;

use super::models::{
    Appointment, AppointmentStatus, BookingOutcome, Employee, Merchant, NewAppointment, Service,
    access_expiry,
};
use crate::availability::{self, BookedInterval, DayOff, Slot, WorkDays, WorkSchedule};
use crate::core::db::{date_column, format_date, format_time, optional_time_column, time_column};

fn merchant_from_row(row: &rusqlite::Row) -> rusqlite::Result<Merchant> {
    let access_until: Option<String> = row.get(7)?;
    let access_until = match access_until {
        Some(_) => Some(date_column(row, 7)?),
        None => None,
    };
    Ok(Merchant {
        id: row.get(0)?,
        name: row.get(1)?,
        schedule: WorkSchedule {
            work_days: row.get(2)?,
            start_time: time_column(row, 3)?,
            end_time: time_column(row, 4)?,
            break_start_time: optional_time_column(row, 5)?,
            break_end_time: optional_time_column(row, 6)?,
        },
        access_until,
    })
}

fn employee_from_row(row: &rusqlite::Row) -> rusqlite::Result<Employee> {
    let work_days: Option<WorkDays> = row.get(3)?;
    let start_time = optional_time_column(row, 4)?;
    let end_time = optional_time_column(row, 5)?;
    let schedule = match (work_days, start_time, end_time) {
        (Some(work_days), Some(start_time), Some(end_time)) => Some(WorkSchedule {
            work_days,
            start_time,
            end_time,
            break_start_time: optional_time_column(row, 6)?,
            break_end_time: optional_time_column(row, 7)?,
        }),
        _ => None,
    };
    Ok(Employee {
        id: row.get(0)?,
        merchant_id: row.get(1)?,
        name: row.get(2)?,
        schedule,
    })
}

fn service_from_row(row: &rusqlite::Row) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        merchant_id: row.get(1)?,
        name: row.get(2)?,
        duration_minutes: row.get(3)?,
        price_cents: row.get(4)?,
    })
}

fn appointment_from_row(row: &rusqlite::Row) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get(0)?,
        merchant_id: row.get(1)?,
        employee_id: row.get(2)?,
        service_id: row.get(3)?,
        client_name: row.get(4)?,
        date: date_column(row, 5)?,
        start_time: time_column(row, 6)?,
        end_time: time_column(row, 7)?,
        status: row.get(8)?,
    })
}

const MERCHANT_COLUMNS: &str = "id, name, work_days, start_time, end_time, break_start_time, break_end_time, access_until";
const EMPLOYEE_COLUMNS: &str = "id, merchant_id, name, work_days, start_time, end_time, break_start_time, break_end_time";
const APPOINTMENT_COLUMNS: &str = "id, merchant_id, employee_id, service_id, client_name, date, start_time, end_time, status";

fn query_merchant(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<Merchant>> {
    conn.query_row(
        &format!("SELECT {} FROM merchant WHERE id = ?", MERCHANT_COLUMNS),
        [id],
        merchant_from_row,
    )
    .optional()
}

fn query_employee(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<Employee>> {
    conn.query_row(
        &format!("SELECT {} FROM employee WHERE id = ?", EMPLOYEE_COLUMNS),
        [id],
        employee_from_row,
    )
    .optional()
}

fn query_service(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<Service>> {
    conn.query_row(
        "SELECT id, merchant_id, name, duration_minutes, price_cents FROM service WHERE id = ?",
        [id],
        service_from_row,
    )
    .optional()
}

fn query_days_off(conn: &rusqlite::Connection, employee_id: &str) -> rusqlite::Result<Vec<DayOff>> {
    let mut stmt =
        conn.prepare("SELECT employee_id, date FROM day_off WHERE employee_id = ? ORDER BY date")?;
    let rows = stmt.query_map([employee_id], |row| {
        Ok(DayOff {
            employee_id: row.get(0)?,
            date: date_column(row, 1)?,
        })
    })?;
    rows.collect()
}

/// Non-cancelled bookings on `date`. Scoped to one employee when given,
/// along with bookings nobody is assigned to. Otherwise every booking the
/// merchant has that day.
fn query_booked_intervals(
    conn: &rusqlite::Connection,
    merchant_id: &str,
    employee_id: Option<&str>,
    date: NaiveDate,
) -> rusqlite::Result<Vec<BookedInterval>> {
    let mut stmt = conn.prepare(
        r"
        SELECT start_time, end_time
        FROM appointment
        WHERE merchant_id = ?1
          AND date = ?2
          AND status != 'cancelled'
          AND (?3 IS NULL OR employee_id = ?3 OR employee_id IS NULL)
        ORDER BY start_time
        ",
    )?;
    let rows = stmt.query_map(params![merchant_id, format_date(date), employee_id], |row| {
        Ok(BookedInterval::new(time_column(row, 0)?, time_column(row, 1)?))
    })?;
    rows.collect()
}

/// Everything the calculator needs for one merchant, employee and date
struct Feeds {
    schedule: WorkSchedule,
    days_off: Vec<DayOff>,
    booked: Vec<BookedInterval>,
}

/// `None` when the merchant doesn't exist or the employee doesn't work there
fn query_feeds(
    conn: &rusqlite::Connection,
    merchant: &Merchant,
    employee_id: Option<&str>,
    date: NaiveDate,
) -> rusqlite::Result<Option<Feeds>> {
    let (schedule, days_off) = match employee_id {
        Some(employee_id) => {
            let Some(employee) = query_employee(conn, employee_id)? else {
                return Ok(None);
            };
            if employee.merchant_id != merchant.id {
                return Ok(None);
            }
            let schedule = employee.schedule.unwrap_or_else(|| merchant.schedule.clone());
            (schedule, query_days_off(conn, employee_id)?)
        }
        None => (merchant.schedule.clone(), vec![]),
    };
    let booked = query_booked_intervals(conn, &merchant.id, employee_id, date)?;
    Ok(Some(Feeds {
        schedule,
        days_off,
        booked,
    }))
}

pub async fn insert_merchant(
    db: &Connection,
    name: String,
    schedule: WorkSchedule,
    access_until: NaiveDate,
) -> Result<Merchant, Error> {
    let merchant = Merchant {
        id: Uuid::new_v4().to_string(),
        name,
        schedule,
        access_until: Some(access_until),
    };
    let row = merchant.clone();
    db.call(move |conn| {
        conn.execute(
            &format!(
                "INSERT INTO merchant ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                MERCHANT_COLUMNS
            ),
            params![
                row.id,
                row.name,
                row.schedule.work_days,
                format_time(row.schedule.start_time),
                format_time(row.schedule.end_time),
                row.schedule.break_start_time.map(format_time),
                row.schedule.break_end_time.map(format_time),
                row.access_until.map(format_date),
            ],
        )?;
        Ok(())
    })
    .await?;
    Ok(merchant)
}

pub async fn find_merchant(db: &Connection, id: String) -> Result<Option<Merchant>, Error> {
    Ok(db.call(move |conn| Ok(query_merchant(conn, &id)?)).await?)
}

/// Returns `false` when no such merchant exists
pub async fn update_merchant_schedule(
    db: &Connection,
    id: String,
    schedule: WorkSchedule,
) -> Result<bool, Error> {
    let updated = db
        .call(move |conn| {
            let n = conn.execute(
                r"
                UPDATE merchant
                SET work_days = ?, start_time = ?, end_time = ?,
                    break_start_time = ?, break_end_time = ?
                WHERE id = ?
                ",
                params![
                    schedule.work_days,
                    format_time(schedule.start_time),
                    format_time(schedule.end_time),
                    schedule.break_start_time.map(format_time),
                    schedule.break_end_time.map(format_time),
                    id,
                ],
            )?;
            Ok(n > 0)
        })
        .await?;
    Ok(updated)
}

/// Extend a merchant's access by `days`, counting from today or from the
/// current expiry if that is later. Returns the new expiry, or `None` if
/// the merchant does not exist. Fails without writing if the new expiry
/// is out of range.
pub async fn grant_access(
    db: &Connection,
    merchant_id: String,
    days: i64,
    today: NaiveDate,
) -> Result<Option<NaiveDate>, Error> {
    let until = db
        .call(move |conn| {
            let tx = conn.transaction()?;
            let Some(merchant) = query_merchant(&tx, &merchant_id)? else {
                return Ok(Ok(None));
            };
            let from = merchant
                .access_until
                .map_or(today, |until| until.max(today));
            let Some(until) = access_expiry(from, days) else {
                return Ok(Err(anyhow!(
                    "Access for merchant {} can't be extended by {} days",
                    merchant_id,
                    days
                )));
            };
            tx.execute(
                "UPDATE merchant SET access_until = ? WHERE id = ?",
                params![format_date(until), merchant_id],
            )?;
            tx.commit()?;
            Ok(Ok(Some(until)))
        })
        .await??;
    Ok(until)
}

pub async fn insert_service(
    db: &Connection,
    merchant_id: String,
    name: String,
    duration_minutes: u32,
    price_cents: i64,
) -> Result<Service, Error> {
    let service = Service {
        id: Uuid::new_v4().to_string(),
        merchant_id,
        name,
        duration_minutes,
        price_cents,
    };
    let row = service.clone();
    db.call(move |conn| {
        conn.execute(
            "INSERT INTO service (id, merchant_id, name, duration_minutes, price_cents) VALUES (?, ?, ?, ?, ?)",
            params![row.id, row.merchant_id, row.name, row.duration_minutes, row.price_cents],
        )?;
        Ok(())
    })
    .await?;
    Ok(service)
}

pub async fn find_services(db: &Connection, merchant_id: String) -> Result<Vec<Service>, Error> {
    let services = db
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, merchant_id, name, duration_minutes, price_cents FROM service WHERE merchant_id = ? ORDER BY name",
            )?;
            let rows = stmt
                .query_map([merchant_id], service_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await?;
    Ok(services)
}

pub async fn find_service(db: &Connection, id: String) -> Result<Option<Service>, Error> {
    Ok(db.call(move |conn| Ok(query_service(conn, &id)?)).await?)
}

pub async fn insert_employee(
    db: &Connection,
    merchant_id: String,
    name: String,
    schedule: Option<WorkSchedule>,
) -> Result<Employee, Error> {
    let employee = Employee {
        id: Uuid::new_v4().to_string(),
        merchant_id,
        name,
        schedule,
    };
    let row = employee.clone();
    db.call(move |conn| {
        let schedule = row.schedule.as_ref();
        conn.execute(
            &format!(
                "INSERT INTO employee ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                EMPLOYEE_COLUMNS
            ),
            params![
                row.id,
                row.merchant_id,
                row.name,
                schedule.map(|s| s.work_days),
                schedule.map(|s| format_time(s.start_time)),
                schedule.map(|s| format_time(s.end_time)),
                schedule.and_then(|s| s.break_start_time).map(format_time),
                schedule.and_then(|s| s.break_end_time).map(format_time),
            ],
        )?;
        Ok(())
    })
    .await?;
    Ok(employee)
}

pub async fn find_employees(db: &Connection, merchant_id: String) -> Result<Vec<Employee>, Error> {
    let employees = db
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM employee WHERE merchant_id = ? ORDER BY name",
                EMPLOYEE_COLUMNS
            ))?;
            let rows = stmt
                .query_map([merchant_id], employee_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await?;
    Ok(employees)
}

pub async fn find_employee(db: &Connection, id: String) -> Result<Option<Employee>, Error> {
    Ok(db.call(move |conn| Ok(query_employee(conn, &id)?)).await?)
}

/// Adding the same day twice is a no-op
pub async fn insert_day_off(db: &Connection, employee_id: String, date: NaiveDate) -> Result<(), Error> {
    db.call(move |conn| {
        conn.execute(
            "INSERT OR IGNORE INTO day_off (employee_id, date) VALUES (?, ?)",
            params![employee_id, format_date(date)],
        )?;
        Ok(())
    })
    .await?;
    Ok(())
}

pub async fn delete_day_off(db: &Connection, employee_id: String, date: NaiveDate) -> Result<bool, Error> {
    let deleted = db
        .call(move |conn| {
            let n = conn.execute(
                "DELETE FROM day_off WHERE employee_id = ? AND date = ?",
                params![employee_id, format_date(date)],
            )?;
            Ok(n > 0)
        })
        .await?;
    Ok(deleted)
}

pub async fn find_days_off(db: &Connection, employee_id: String) -> Result<Vec<DayOff>, Error> {
    Ok(db.call(move |conn| Ok(query_days_off(conn, &employee_id)?)).await?)
}

pub async fn find_booked_intervals(
    db: &Connection,
    merchant_id: String,
    employee_id: Option<String>,
    date: NaiveDate,
) -> Result<Vec<BookedInterval>, Error> {
    let intervals = db
        .call(move |conn| {
            Ok(query_booked_intervals(
                conn,
                &merchant_id,
                employee_id.as_deref(),
                date,
            )?)
        })
        .await?;
    Ok(intervals)
}

/// The schedule that applies to bookings with `employee_id`, or the
/// merchant's when no employee is given. `None` if either is unknown.
pub async fn effective_schedule(
    db: &Connection,
    merchant_id: String,
    employee_id: Option<String>,
) -> Result<Option<WorkSchedule>, Error> {
    let schedule = db
        .call(move |conn| {
            let Some(merchant) = query_merchant(conn, &merchant_id)? else {
                return Ok(None);
            };
            let schedule = match employee_id {
                Some(employee_id) => match query_employee(conn, &employee_id)? {
                    Some(employee) if employee.merchant_id == merchant.id => {
                        Some(employee.schedule.unwrap_or(merchant.schedule))
                    }
                    _ => None,
                },
                None => Some(merchant.schedule),
            };
            Ok(schedule)
        })
        .await?;
    Ok(schedule)
}

/// Free slots for a merchant (and optionally one employee) on `date`.
/// `None` when the merchant or employee is unknown. An employee's day off
/// yields no slots.
pub async fn find_available_slots(
    db: &Connection,
    merchant_id: String,
    employee_id: Option<String>,
    date: NaiveDate,
    duration_minutes: u32,
    now: NaiveDateTime,
) -> Result<Option<Vec<Slot>>, Error> {
    let slots = db
        .call(move |conn| {
            let Some(merchant) = query_merchant(conn, &merchant_id)? else {
                return Ok(None);
            };
            let Some(feeds) = query_feeds(conn, &merchant, employee_id.as_deref(), date)? else {
                return Ok(None);
            };
            if feeds.days_off.iter().any(|day| day.date == date) {
                return Ok(Some(vec![]));
            }
            Ok(Some(availability::available_slots(
                &feeds.schedule,
                date,
                &feeds.booked,
                duration_minutes,
                now,
            )))
        })
        .await?;
    Ok(slots)
}

/// Single slot check. `None` when the merchant or employee is unknown.
pub async fn check_availability(
    db: &Connection,
    merchant_id: String,
    employee_id: Option<String>,
    date: NaiveDate,
    time: NaiveTime,
    duration_minutes: u32,
    now: NaiveDateTime,
) -> Result<Option<bool>, Error> {
    let available = db
        .call(move |conn| {
            let Some(merchant) = query_merchant(conn, &merchant_id)? else {
                return Ok(None);
            };
            let Some(feeds) = query_feeds(conn, &merchant, employee_id.as_deref(), date)? else {
                return Ok(None);
            };
            Ok(Some(availability::is_available(
                employee_id.as_deref(),
                date,
                time,
                duration_minutes,
                &feeds.schedule,
                &feeds.days_off,
                &feeds.booked,
                now,
            )))
        })
        .await?;
    Ok(available)
}

fn book_in_tx(
    tx: &rusqlite::Transaction,
    new: &NewAppointment,
    now: NaiveDateTime,
) -> rusqlite::Result<BookingOutcome> {
    let Some(merchant) = query_merchant(tx, &new.merchant_id)? else {
        return Ok(BookingOutcome::NotFound("merchant"));
    };
    if !merchant.has_access(now.date()) {
        return Ok(BookingOutcome::AccessExpired);
    }
    let service = match query_service(tx, &new.service_id)? {
        Some(service) if service.merchant_id == merchant.id => service,
        _ => return Ok(BookingOutcome::NotFound("service")),
    };
    let employee_id = new.employee_id.as_deref();
    let Some(feeds) = query_feeds(tx, &merchant, employee_id, new.date)? else {
        return Ok(BookingOutcome::NotFound("employee"));
    };
    if feeds.days_off.iter().any(|day| day.date == new.date) {
        return Ok(BookingOutcome::EmployeeOnLeave);
    }
    if !availability::is_available(
        employee_id,
        new.date,
        new.start_time,
        service.duration_minutes,
        &feeds.schedule,
        &feeds.days_off,
        &feeds.booked,
        now,
    ) {
        return Ok(BookingOutcome::Unavailable);
    }
    // Only start times the schedule actually offers can be booked
    let offered = availability::generate_candidate_slots(&feeds.schedule, new.date, now)
        .iter()
        .any(|slot| slot.time() == new.start_time);
    if !offered {
        tracing::debug!(
            start_time = %new.start_time,
            "Slot unavailable: not an offered start time"
        );
        return Ok(BookingOutcome::Unavailable);
    }
    let (end_time, wrapped) = new
        .start_time
        .overflowing_add_signed(Duration::minutes(i64::from(service.duration_minutes)));
    if wrapped != 0 {
        tracing::debug!(start_time = %new.start_time, "Slot unavailable: runs past midnight");
        return Ok(BookingOutcome::Unavailable);
    }

    let appointment = Appointment {
        id: Uuid::new_v4().to_string(),
        merchant_id: merchant.id,
        employee_id: new.employee_id.clone(),
        service_id: service.id,
        client_name: new.client_name.clone(),
        date: new.date,
        start_time: new.start_time,
        end_time,
        status: AppointmentStatus::Pending,
    };
    let inserted = tx.execute(
        &format!(
            "INSERT INTO appointment ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            APPOINTMENT_COLUMNS
        ),
        params![
            appointment.id,
            appointment.merchant_id,
            appointment.employee_id,
            appointment.service_id,
            appointment.client_name,
            format_date(appointment.date),
            format_time(appointment.start_time),
            format_time(appointment.end_time),
            appointment.status,
        ],
    );
    match inserted {
        Ok(_) => Ok(BookingOutcome::Booked(appointment)),
        // Another booking for the same slot won the race
        Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
            Ok(BookingOutcome::Unavailable)
        }
        Err(err) => Err(err),
    }
}

/// Re-checks availability and inserts in one transaction. The unique slot
/// index backs this up if two writers get past the check together.
pub async fn book_appointment(
    db: &Connection,
    new: NewAppointment,
    now: NaiveDateTime,
) -> Result<BookingOutcome, Error> {
    let outcome = db
        .call(move |conn| {
            let tx = conn.transaction()?;
            let outcome = book_in_tx(&tx, &new, now)?;
            if matches!(outcome, BookingOutcome::Booked(_)) {
                tx.commit()?;
            }
            Ok(outcome)
        })
        .await?;
    Ok(outcome)
}

pub async fn find_appointments(
    db: &Connection,
    merchant_id: String,
    date: Option<NaiveDate>,
) -> Result<Vec<Appointment>, Error> {
    let appointments = db
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM appointment WHERE merchant_id = ?1 AND (?2 IS NULL OR date = ?2) ORDER BY date, start_time",
                APPOINTMENT_COLUMNS
            ))?;
            let rows = stmt
                .query_map(params![merchant_id, date.map(format_date)], appointment_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await?;
    Ok(appointments)
}

pub async fn find_appointment(db: &Connection, id: String) -> Result<Option<Appointment>, Error> {
    let appointment = db
        .call(move |conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {} FROM appointment WHERE id = ?", APPOINTMENT_COLUMNS),
                    [id],
                    appointment_from_row,
                )
                .optional()?)
        })
        .await?;
    Ok(appointment)
}

/// Marks the appointment cancelled, freeing its slot. Returns `false` when
/// there is no such appointment.
pub async fn cancel_appointment(db: &Connection, id: String) -> Result<bool, Error> {
    let cancelled = db
        .call(move |conn| {
            let n = conn.execute(
                "UPDATE appointment SET status = ? WHERE id = ?",
                params![AppointmentStatus::Cancelled, id],
            )?;
            Ok(n > 0)
        })
        .await?;
    Ok(cancelled)
}
