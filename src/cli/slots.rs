use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate};

use crate::booking;
use crate::core::db::{DATE_FORMAT, async_db};

/// Print the free slots for a merchant on a date
pub async fn run(
    db_path: &str,
    merchant_id: String,
    date: String,
    employee_id: Option<String>,
    duration: u32,
) -> Result<()> {
    let date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
        .with_context(|| format!("Invalid date {:?}, expected YYYY-MM-DD", date))?;
    if duration == 0 {
        return Err(anyhow!("Duration must be positive"));
    }

    let db = async_db(db_path).await?;
    let now = Local::now().naive_local();
    let slots = booking::find_available_slots(&db, merchant_id.clone(), employee_id, date, duration, now)
        .await?
        .ok_or_else(|| anyhow!("Unknown merchant or employee for {}", merchant_id))?;

    if slots.is_empty() {
        println!("No available slots on {}", date);
    }
    for slot in slots {
        println!("{}", slot);
    }

    Ok(())
}
