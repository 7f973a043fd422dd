//! Calendar event types.
//!
//! `VEvent` is a parsed master event straight out of the feed (possibly
//! recurring); `Occurrence` is one concrete instance of it in time, which is
//! what the rest of the system works with.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// A DTSTART/DTEND value, preserving how the feed expressed it.
#[derive(Debug, Clone, PartialEq)]
pub enum EventTime {
    /// Date-only (all-day) value
    Date(NaiveDate),
    /// UTC datetime (`...Z`)
    DateTimeUtc(DateTime<Utc>),
    /// Floating datetime with no zone attached
    DateTimeFloating(NaiveDateTime),
    /// Datetime qualified with a TZID parameter
    DateTimeZoned { datetime: NaiveDateTime, tzid: String },
}

impl EventTime {
    pub fn is_date(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }

    /// Resolve to a UTC instant.
    ///
    /// Date-only values become midnight UTC and floating values are read as
    /// UTC, matching how they are rendered for RRULE expansion. Returns None
    /// when a TZID names a zone we don't know, or a local time that doesn't
    /// exist in its zone.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            EventTime::Date(d) => Some(d.and_hms_opt(0, 0, 0)?.and_utc()),
            EventTime::DateTimeUtc(dt) => Some(*dt),
            EventTime::DateTimeFloating(dt) => Some(dt.and_utc()),
            EventTime::DateTimeZoned { datetime, tzid } => {
                let tz: Tz = tzid.parse().ok()?;
                tz.from_local_datetime(datetime)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
            }
        }
    }
}

/// A master event parsed from the feed, before recurrence expansion.
#[derive(Debug, Clone)]
pub struct VEvent {
    pub uid: String,
    pub summary: String,
    pub start: EventTime,
    pub end: EventTime,
    /// True when the source marks the event as occupying time
    /// (`X-MICROSOFT-CDO-BUSYSTATUS: BUSY`).
    pub busy: bool,
    /// RRULE value for recurring masters
    pub rrule: Option<String>,
    /// EXDATE values excluded from the recurrence
    pub exdates: Vec<EventTime>,
}

impl VEvent {
    /// Whether this is a date-only (all-day) event. All-day events never
    /// count as live.
    pub fn is_all_day(&self) -> bool {
        self.start.is_date()
    }
}

/// One concrete instance of an event in time.
#[derive(Debug, Clone)]
pub struct Occurrence {
    pub uid: String,
    pub summary: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub busy: bool,
}

impl Occurrence {
    /// Whether this occurrence's interval contains the given instant.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}
