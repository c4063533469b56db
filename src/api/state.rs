use chrono::{Local, NaiveDateTime};
use tokio_rusqlite::Connection;

use crate::core::AppConfig;

/// Source of the wall clock used for hiding passed slots
pub type Clock = fn() -> NaiveDateTime;

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub struct AppState {
    pub db: Connection,
    pub config: AppConfig,
    pub clock: Clock,
}

impl AppState {
    pub fn new(db: Connection, config: AppConfig) -> Self {
        Self {
            db,
            config,
            clock: local_now,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }
}
