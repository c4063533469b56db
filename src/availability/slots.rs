use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::schedule::{BookedInterval, DayOff, Slot, WorkSchedule, minute_of_day};
use super::SLOT_MINUTES;

fn time_from_minutes(minutes: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}

/// Every start time between opening (inclusive) and closing (exclusive)
/// on the 30 minute grid. On `now`'s date, times at or before the current
/// minute are left out.
///
/// Break windows are not carved out here.
pub fn generate_candidate_slots(
    schedule: &WorkSchedule,
    date: NaiveDate,
    now: NaiveDateTime,
) -> Vec<Slot> {
    let open = minute_of_day(schedule.start_time);
    let close = minute_of_day(schedule.end_time);
    let cutoff = (date == now.date()).then(|| minute_of_day(now.time()));

    (open..close)
        .step_by(SLOT_MINUTES as usize)
        .filter(|minute| cutoff.is_none_or(|cutoff| *minute > cutoff))
        .filter_map(time_from_minutes)
        .map(Slot)
        .collect()
}

/// Whether `[start, start + duration)` overlaps any booked interval.
pub fn is_slot_occupied(
    candidate_start: NaiveTime,
    duration_minutes: u32,
    booked: &[BookedInterval],
) -> bool {
    let start = minute_of_day(candidate_start);
    let end = start.saturating_add(duration_minutes);
    booked.iter().any(|interval| {
        let (booked_start, booked_end) = interval.occupied_span();
        start < booked_end && end > booked_start
    })
}

/// Free start times for `date`, in ascending order. Past dates and days
/// the schedule is closed yield nothing.
pub fn available_slots(
    schedule: &WorkSchedule,
    date: NaiveDate,
    booked: &[BookedInterval],
    duration_minutes: u32,
    now: NaiveDateTime,
) -> Vec<Slot> {
    if date < now.date() || !schedule.work_days.is_work_date(date) {
        return vec![];
    }
    generate_candidate_slots(schedule, date, now)
        .into_iter()
        .filter(|slot| !is_slot_occupied(slot.time(), duration_minutes, booked))
        .collect()
}

/// Single slot check made when an appointment is submitted. Fails closed.
#[allow(clippy::too_many_arguments)]
pub fn is_available(
    employee_id: Option<&str>,
    date: NaiveDate,
    time: NaiveTime,
    duration_minutes: u32,
    schedule: &WorkSchedule,
    days_off: &[DayOff],
    booked: &[BookedInterval],
    now: NaiveDateTime,
) -> bool {
    if date < now.date() {
        tracing::debug!(%date, "Slot unavailable: date has passed");
        return false;
    }
    if !schedule.work_days.is_work_date(date) {
        tracing::debug!(%date, "Slot unavailable: not a work day");
        return false;
    }
    if let Some(employee_id) = employee_id
        && days_off
            .iter()
            .any(|day| day.employee_id == employee_id && day.date == date)
    {
        tracing::debug!(%date, employee_id, "Slot unavailable: employee day off");
        return false;
    }
    if is_slot_occupied(time, duration_minutes, booked) {
        tracing::debug!(%date, %time, "Slot unavailable: already booked");
        return false;
    }
    true
}
