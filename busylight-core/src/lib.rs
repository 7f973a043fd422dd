//! Core types and logic for the busylight presence reconciler.
//!
//! Everything stateful lives here: the workday window, the calendar
//! occurrence queries, the per-day tracking state, and the reconciliation
//! engine that turns "what the calendar says" plus "what the light shows"
//! into commands. Network and filesystem entry points live in the CLI crate.

pub mod calendar;
pub mod config;
pub mod day_window;
pub mod engine;
pub mod error;
pub mod event;
pub mod ics;
pub mod light;
pub mod state;
pub mod validate;

pub use calendar::BusyCalendar;
pub use config::Config;
pub use day_window::{Regime, WorkdayWindow};
pub use error::{BusyLightError, BusyLightResult};
pub use event::{EventTime, Occurrence, VEvent};
pub use light::{LightColorState, LightCommand, LightStatus};
pub use state::{DayState, LoadedDayState, StateStore};
