//! ICS feed parsing using the icalendar crate's parser.

use icalendar::{
    parser::{read_calendar, unfold, Component, Property},
    DatePerhapsTime,
};
use tracing::debug;

use crate::error::{BusyLightError, BusyLightResult};
use crate::event::{EventTime, VEvent};

const BUSY_STATUS_PROP: &str = "X-MICROSOFT-CDO-BUSYSTATUS";

/// Parse ICS content into master events.
///
/// Components without a UID or DTSTART are skipped rather than failing the
/// whole feed.
pub fn parse_feed(content: &str) -> BusyLightResult<Vec<VEvent>> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded)
        .map_err(|e| BusyLightError::IcsParse(format!("Failed to read calendar: {e}")))?;

    let mut events = Vec::new();
    for component in &calendar.components {
        if component.name != "VEVENT" {
            continue;
        }
        match parse_vevent(component) {
            Some(event) => events.push(event),
            None => debug!("skipping VEVENT without usable UID/DTSTART"),
        }
    }

    Ok(events)
}

fn parse_vevent(vevent: &Component<'_>) -> Option<VEvent> {
    let uid = vevent.find_prop("UID")?.val.to_string();
    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| p.val.to_string())
        .unwrap_or_else(|| "(No title)".to_string());

    let start = to_event_time(DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?);
    let end = match vevent.find_prop("DTEND") {
        Some(prop) => to_event_time(DatePerhapsTime::try_from(prop).ok()?),
        None => default_end(&start),
    };

    let busy = vevent
        .find_prop(BUSY_STATUS_PROP)
        .map(|p| p.val.as_ref() == "BUSY")
        .unwrap_or(false);

    let rrule = vevent.find_prop("RRULE").map(|p| p.val.to_string());
    let exdates: Vec<EventTime> = vevent
        .properties
        .iter()
        .filter(|p| p.name == "EXDATE")
        .flat_map(parse_exdate_property)
        .collect();

    Some(VEvent {
        uid,
        summary,
        start,
        end,
        busy,
        rrule,
        exdates,
    })
}

/// Convert icalendar's DatePerhapsTime to our EventTime, preserving timezone info
fn to_event_time(dpt: DatePerhapsTime) -> EventTime {
    match dpt {
        DatePerhapsTime::Date(d) => EventTime::Date(d),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            icalendar::CalendarDateTime::Utc(dt) => EventTime::DateTimeUtc(dt),
            icalendar::CalendarDateTime::Floating(naive) => EventTime::DateTimeFloating(naive),
            icalendar::CalendarDateTime::WithTimezone { date_time, tzid } => {
                EventTime::DateTimeZoned {
                    datetime: date_time,
                    tzid,
                }
            }
        },
    }
}

/// RFC 5545 defaults when DTEND is absent: all-day events span one day,
/// timed events have zero duration.
fn default_end(start: &EventTime) -> EventTime {
    match start {
        EventTime::Date(d) => EventTime::Date(*d + chrono::Duration::days(1)),
        other => other.clone(),
    }
}

/// Parse an EXDATE property into a list of EventTime values.
///
/// Handles TZID parameters, VALUE=DATE, UTC (`Z` suffix), floating values,
/// and comma-separated lists.
fn parse_exdate_property(prop: &Property<'_>) -> Vec<EventTime> {
    let tzid = prop
        .params
        .iter()
        .find(|p| p.key == "TZID")
        .and_then(|p| p.val.as_ref().map(|v| v.to_string()));

    let is_date = prop
        .params
        .iter()
        .any(|p| p.key == "VALUE" && p.val.as_ref().map(|v| v.as_ref()) == Some("DATE"));

    let val_str = prop.val.as_ref();
    val_str
        .split(',')
        .filter_map(|s| {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if is_date {
                chrono::NaiveDate::parse_from_str(s, "%Y%m%d")
                    .ok()
                    .map(EventTime::Date)
            } else if let Some(ref tz) = tzid {
                chrono::NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(|dt| EventTime::DateTimeZoned {
                        datetime: dt,
                        tzid: tz.clone(),
                    })
            } else if s.ends_with('Z') {
                let s = s.trim_end_matches('Z');
                chrono::NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(|dt| EventTime::DateTimeUtc(dt.and_utc()))
            } else {
                chrono::NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(EventTime::DateTimeFloating)
            }
        })
        .collect()
}
