pub mod api;
pub mod availability;
pub mod booking;
pub mod cli;
pub mod core;
pub mod session;
