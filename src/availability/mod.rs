//! Availability calculator
//!
//! Pure functions answering "is this slot free?" and "which slots are free
//! on this date?" from caller supplied snapshots of schedules, days off and
//! existing bookings. Nothing here performs I/O or holds state, so two
//! concurrent callers can both see a slot as free. Enforcing one booking
//! per slot is the job of the write path (see `booking::db`).

pub mod schedule;
mod slots;

pub use schedule::{BookedInterval, DayOff, Slot, WorkDays, WorkSchedule, hhmm};
pub use slots::{available_slots, generate_candidate_slots, is_available, is_slot_occupied};

/// Spacing of candidate start times
pub const SLOT_MINUTES: u32 = 30;

/// Time an existing booking blocks, independent of the booked service's
/// real duration.
pub const BOOKED_BLOCK_MINUTES: u32 = 30;

/// Longest service duration accepted from callers
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;
