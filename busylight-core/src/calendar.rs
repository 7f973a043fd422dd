//! Occurrence queries over a parsed feed.
//!
//! Expands recurring masters with the rrule crate and answers the two
//! questions the rest of the system asks: "what happens between these
//! instants" and "what is live right now". All-day events are never live.

use chrono::{DateTime, Duration, Utc};
use rrule::RRuleSet;

use crate::error::{BusyLightError, BusyLightResult};
use crate::event::{EventTime, Occurrence, VEvent};
use crate::ics;

/// Cap on expanded instances per master, as a runaway-RRULE guard.
const MAX_OCCURRENCES: u16 = 365;

/// A parsed calendar feed, queryable for occurrences.
pub struct BusyCalendar {
    events: Vec<VEvent>,
}

impl BusyCalendar {
    pub fn parse(content: &str) -> BusyLightResult<Self> {
        let events = ics::parse_feed(content)?;
        Ok(BusyCalendar { events })
    }

    /// All occurrences overlapping [range_start, range_end), sorted by start.
    pub fn occurrences_between(
        &self,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> BusyLightResult<Vec<Occurrence>> {
        let mut occurrences = Vec::new();
        for master in &self.events {
            occurrences.extend(expand_master(master, range_start, range_end)?);
        }
        occurrences.sort_by_key(|o| o.start);
        Ok(occurrences)
    }

    /// Occurrences whose interval contains `instant`.
    ///
    /// Date-only (all-day) masters are excluded before expansion; they are
    /// never candidates for live status.
    pub fn live_at(&self, instant: DateTime<Utc>) -> BusyLightResult<Vec<Occurrence>> {
        let mut live = Vec::new();
        for master in self.events.iter().filter(|m| !m.is_all_day()) {
            let expanded = expand_master(master, instant, instant + Duration::seconds(1))?;
            live.extend(expanded.into_iter().filter(|o| o.contains(instant)));
        }
        Ok(live)
    }
}

/// Expand one master into the occurrences overlapping [range_start, range_end).
fn expand_master(
    master: &VEvent,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> BusyLightResult<Vec<Occurrence>> {
    let Some(start_utc) = master.start.to_utc() else {
        return Ok(Vec::new());
    };
    let end_utc = master.end.to_utc().unwrap_or(start_utc);
    let duration = end_utc - start_utc;

    if master.rrule.is_none() {
        let overlaps = start_utc < range_end && end_utc > range_start;
        return Ok(if overlaps {
            vec![occurrence_of(master, start_utc, end_utc)]
        } else {
            Vec::new()
        });
    }

    let rrule_str = build_rrule_string(master);
    let rrule_set: RRuleSet = rrule_str.parse().map_err(|e| {
        BusyLightError::IcsParse(format!(
            "Failed to parse RRULE for event '{}': {}",
            master.uid, e
        ))
    })?;

    // Widen the query so instances that started before the range but still
    // overlap it are found; after/before are exclusive, hence the 1s margins.
    let tz: rrule::Tz = Utc.into();
    let after = (range_start - duration - Duration::seconds(1)).with_timezone(&tz);
    let before = (range_end + Duration::seconds(1)).with_timezone(&tz);
    let result = rrule_set.after(after).before(before).all(MAX_OCCURRENCES);

    let mut occurrences = Vec::new();
    for occ_dt in &result.dates {
        let occ_start = occ_dt.with_timezone(&Utc);
        let occ_end = occ_start + duration;
        if occ_start < range_end && occ_end > range_start {
            occurrences.push(occurrence_of(master, occ_start, occ_end));
        }
    }

    Ok(occurrences)
}

fn occurrence_of(master: &VEvent, start: DateTime<Utc>, end: DateTime<Utc>) -> Occurrence {
    Occurrence {
        uid: master.uid.clone(),
        summary: master.summary.clone(),
        start,
        end,
        all_day: master.is_all_day(),
        busy: master.busy,
    }
}

/// Build an iCalendar-format RRULE string for the rrule crate parser.
fn build_rrule_string(master: &VEvent) -> String {
    let mut lines = Vec::new();

    // DTSTART — the rrule crate needs a datetime, so all-day dates become midnight UTC
    let dtstart = match &master.start {
        EventTime::Date(d) => {
            format!("DTSTART:{}T000000Z", d.format("%Y%m%d"))
        }
        EventTime::DateTimeUtc(dt) => {
            format!("DTSTART:{}", dt.format("%Y%m%dT%H%M%SZ"))
        }
        EventTime::DateTimeFloating(dt) => {
            format!("DTSTART:{}Z", dt.format("%Y%m%dT%H%M%S"))
        }
        EventTime::DateTimeZoned { datetime, tzid } => {
            format!("DTSTART;TZID={}:{}", tzid, datetime.format("%Y%m%dT%H%M%S"))
        }
    };
    lines.push(dtstart);

    if let Some(rrule) = &master.rrule {
        lines.push(format!("RRULE:{rrule}"));
    }

    for exdate in &master.exdates {
        let exdate_str = match exdate {
            EventTime::Date(d) => format!("EXDATE:{}T000000Z", d.format("%Y%m%d")),
            EventTime::DateTimeUtc(dt) => {
                format!("EXDATE:{}", dt.format("%Y%m%dT%H%M%SZ"))
            }
            EventTime::DateTimeFloating(dt) => {
                format!("EXDATE:{}Z", dt.format("%Y%m%dT%H%M%S"))
            }
            EventTime::DateTimeZoned { datetime, tzid } => {
                format!("EXDATE;TZID={}:{}", tzid, datetime.format("%Y%m%dT%H%M%S"))
            }
        };
        lines.push(exdate_str);
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    const FEED: &str = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:oneoff-1
SUMMARY:Design review
DTSTART:20240103T140000Z
DTEND:20240103T150000Z
X-MICROSOFT-CDO-BUSYSTATUS:BUSY
END:VEVENT
BEGIN:VEVENT
UID:weekly-1
SUMMARY:Weekly sync
DTSTART:20240101T100000Z
DTEND:20240101T110000Z
RRULE:FREQ=WEEKLY;BYDAY=MO
EXDATE:20240115T100000Z
X-MICROSOFT-CDO-BUSYSTATUS:BUSY
END:VEVENT
BEGIN:VEVENT
UID:allday-1
SUMMARY:Public Holiday
DTSTART;VALUE=DATE:20240103
X-MICROSOFT-CDO-BUSYSTATUS:BUSY
END:VEVENT
END:VCALENDAR"#;

    #[test]
    fn test_live_at_contains_timed_event() {
        let calendar = BusyCalendar::parse(FEED).unwrap();
        let live = calendar.live_at(utc(2024, 1, 3, 14, 30)).unwrap();
        let uids: Vec<&str> = live.iter().map(|o| o.uid.as_str()).collect();
        assert_eq!(uids, vec!["oneoff-1"], "Only the in-progress meeting is live");
    }

    #[test]
    fn test_live_at_excludes_all_day_events() {
        let calendar = BusyCalendar::parse(FEED).unwrap();
        // Noon on the holiday: nothing timed is live
        let live = calendar.live_at(utc(2024, 1, 3, 12, 0)).unwrap();
        assert!(live.is_empty(), "All-day events must never be live");
    }

    #[test]
    fn test_live_at_expands_recurrence() {
        let calendar = BusyCalendar::parse(FEED).unwrap();
        // Monday Jan 8, 10:30 UTC is inside the weekly slot
        let live = calendar.live_at(utc(2024, 1, 8, 10, 30)).unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].uid, "weekly-1");
    }

    #[test]
    fn test_live_at_respects_exdate() {
        let calendar = BusyCalendar::parse(FEED).unwrap();
        // Monday Jan 15 is excluded via EXDATE
        let live = calendar.live_at(utc(2024, 1, 15, 10, 30)).unwrap();
        assert!(live.is_empty(), "EXDATE instance must not be live");
    }

    #[test]
    fn test_live_at_outside_any_interval() {
        let calendar = BusyCalendar::parse(FEED).unwrap();
        let live = calendar.live_at(utc(2024, 1, 3, 9, 0)).unwrap();
        assert!(live.is_empty());
    }

    #[test]
    fn test_occurrences_between_sorted_by_start() {
        let calendar = BusyCalendar::parse(FEED).unwrap();
        let occurrences = calendar
            .occurrences_between(utc(2024, 1, 1, 0, 0), utc(2024, 1, 9, 0, 0))
            .unwrap();

        let starts: Vec<DateTime<Utc>> = occurrences.iter().map(|o| o.start).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted, "Occurrences must be ordered by start");

        // Two weekly instances (Jan 1, Jan 8), the one-off, and the holiday
        let uids: Vec<&str> = occurrences.iter().map(|o| o.uid.as_str()).collect();
        assert_eq!(uids, vec!["weekly-1", "allday-1", "oneoff-1", "weekly-1"]);
    }

    #[test]
    fn test_occurrence_contains_is_half_open() {
        let calendar = BusyCalendar::parse(FEED).unwrap();
        let at_end = calendar.live_at(utc(2024, 1, 3, 15, 0)).unwrap();
        assert!(at_end.is_empty(), "Interval end is exclusive");
        let at_start = calendar.live_at(utc(2024, 1, 3, 14, 0)).unwrap();
        assert_eq!(at_start.len(), 1, "Interval start is inclusive");
    }
}
