//! Workday window classification.
//!
//! A run is classified against a fixed daily window before anything else
//! happens; outside the window the run either scrubs stale state, gets one
//! chance to switch the light off, or does nothing at all.

use chrono::{DateTime, Duration, NaiveTime, TimeZone};

/// Where "now" falls relative to the daily work window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// Before the window opens
    PreWorkday,
    /// Inside the window; full reconciliation runs
    Workday,
    /// Just past the window end; the run still gets one chance to turn the
    /// light off (the feed fetch is slow relative to the polling cadence)
    PostWorkdayGrace,
    /// Past the grace window; nothing left to do today
    PostWorkdayExpired,
}

/// The daily work window, with the grace period after its end.
#[derive(Debug, Clone, Copy)]
pub struct WorkdayWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub close_grace: Duration,
}

pub const DEFAULT_DAY_START: &str = "08:30";
pub const DEFAULT_DAY_END: &str = "18:00";
pub const DEFAULT_CLOSE_GRACE_SECONDS: u64 = 360;

impl Default for WorkdayWindow {
    fn default() -> Self {
        WorkdayWindow {
            start: NaiveTime::parse_from_str(DEFAULT_DAY_START, "%H:%M").unwrap(),
            end: NaiveTime::parse_from_str(DEFAULT_DAY_END, "%H:%M").unwrap(),
            close_grace: Duration::seconds(DEFAULT_CLOSE_GRACE_SECONDS as i64),
        }
    }
}

impl WorkdayWindow {
    /// Classify an instant against the window. The comparison happens on the
    /// local wall clock of `now`'s zone, so the window means the same thing
    /// year-round.
    pub fn classify<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Regime {
        let time = now.time();

        if time < self.start {
            return Regime::PreWorkday;
        }
        if time < self.end {
            return Regime::Workday;
        }

        let since_end = time - self.end;
        if since_end < self.close_grace {
            Regime::PostWorkdayGrace
        } else {
            Regime::PostWorkdayExpired
        }
    }
}
