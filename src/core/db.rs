//! SQLite connection and schema management
use std::fs;
use std::path::Path;

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use rusqlite::types::Type;
use tokio_rusqlite::Connection;

use crate::availability::hhmm;

pub const DB_FILE_NAME: &str = "salon.sqlite3";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Each entry moves the schema forward by one `user_version`.
const MIGRATIONS: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS merchant (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        work_days INTEGER NOT NULL,
        start_time TEXT NOT NULL,
        end_time TEXT NOT NULL,
        break_start_time TEXT,
        break_end_time TEXT,
        access_until TEXT,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS service (
        id TEXT PRIMARY KEY,
        merchant_id TEXT NOT NULL REFERENCES merchant(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        duration_minutes INTEGER NOT NULL CHECK (duration_minutes > 0),
        price_cents INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS employee (
        id TEXT PRIMARY KEY,
        merchant_id TEXT NOT NULL REFERENCES merchant(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        work_days INTEGER,
        start_time TEXT,
        end_time TEXT,
        break_start_time TEXT,
        break_end_time TEXT
    );

    CREATE TABLE IF NOT EXISTS day_off (
        employee_id TEXT NOT NULL REFERENCES employee(id) ON DELETE CASCADE,
        date TEXT NOT NULL,
        PRIMARY KEY (employee_id, date)
    );

    CREATE TABLE IF NOT EXISTS appointment (
        id TEXT PRIMARY KEY,
        merchant_id TEXT NOT NULL REFERENCES merchant(id) ON DELETE CASCADE,
        employee_id TEXT REFERENCES employee(id) ON DELETE SET NULL,
        service_id TEXT NOT NULL REFERENCES service(id),
        client_name TEXT NOT NULL,
        date TEXT NOT NULL,
        start_time TEXT NOT NULL,
        end_time TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS appointment_merchant_date
        ON appointment(merchant_id, date);
    ",
    // At most one live booking per employee (or per merchant when no
    // employee is assigned) and start time
    r"
    CREATE UNIQUE INDEX IF NOT EXISTS appointment_slot_unique
        ON appointment(merchant_id, coalesce(employee_id, ''), date, start_time)
        WHERE status != 'cancelled';
    ",
];

pub async fn async_db(db_path: &str) -> Result<Connection> {
    fs::create_dir_all(db_path)?;
    let path = Path::new(db_path).join(DB_FILE_NAME);
    let db = Connection::open(path).await?;
    db.call(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(())
    })
    .await?;
    Ok(db)
}

/// Create the schema from scratch on a fresh database
pub fn initialize_db(conn: &mut rusqlite::Connection) -> Result<(), rusqlite::Error> {
    migrate_db(conn)
}

/// Apply any migrations newer than the database's `user_version`
pub fn migrate_db(conn: &mut rusqlite::Connection) -> Result<(), rusqlite::Error> {
    let version: usize = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    for (i, migration) in MIGRATIONS.iter().enumerate().skip(version) {
        let tx = conn.transaction()?;
        tx.execute_batch(migration)?;
        tx.pragma_update(None, "user_version", i + 1)?;
        tx.commit()?;
        tracing::info!("Applied migration {}", i + 1);
    }
    Ok(())
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(hhmm::FORMAT).to_string()
}

fn conversion_error(idx: usize, err: chrono::ParseError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Read a `YYYY-MM-DD` text column
pub fn date_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let s: String = row.get(idx)?;
    NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| conversion_error(idx, e))
}

/// Read an `HH:MM` text column
pub fn time_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveTime> {
    let s: String = row.get(idx)?;
    hhmm::parse(&s).map_err(|e| conversion_error(idx, e))
}

pub fn optional_time_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<NaiveTime>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| hhmm::parse(&s).map_err(|e| conversion_error(idx, e)))
        .transpose()
}
