//! Per-day tracking state and its on-disk store.
//!
//! One record at a time, scoped to a single calendar date. A record from
//! another day, or one we can't make sense of, is replaced with a fresh one
//! rather than reported as an error; the next run always starts from
//! something usable.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::BusyLightResult;

/// On-disk shape. Key names are kept byte-for-byte compatible with existing
/// state files.
#[derive(Debug, Serialize, Deserialize)]
struct DayStateRecord {
    #[serde(rename = "STATE_STARTED")]
    started: Vec<String>,

    #[serde(rename = "STATE_COMPLETED")]
    completed: Vec<String>,

    #[serde(rename = "STATE_DAYSTARTED", skip_serializing_if = "Option::is_none", default)]
    day_started: Option<u8>,

    #[serde(rename = "STATE_DAYDATE", skip_serializing_if = "Option::is_none", default)]
    day_of_month: Option<u32>,
}

/// What the engine tracks across runs within one calendar date.
///
/// `started` holds UIDs of busy intervals currently in progress; `completed`
/// holds UIDs whose interval has been resolved, naturally or by a manual
/// override. The two sets stay disjoint, and a UID only ever reaches
/// `completed` through `started`.
#[derive(Debug, Clone, PartialEq)]
pub struct DayState {
    pub date: NaiveDate,
    /// True once the first automatic "available" command went out today.
    pub day_started: bool,
    started: BTreeSet<String>,
    completed: BTreeSet<String>,
}

impl DayState {
    pub fn fresh(date: NaiveDate) -> Self {
        DayState {
            date,
            day_started: false,
            started: BTreeSet::new(),
            completed: BTreeSet::new(),
        }
    }

    pub fn started(&self) -> &BTreeSet<String> {
        &self.started
    }

    pub fn completed(&self) -> &BTreeSet<String> {
        &self.completed
    }

    pub fn is_tracking(&self, uid: &str) -> bool {
        self.started.contains(uid)
    }

    pub fn is_completed(&self, uid: &str) -> bool {
        self.completed.contains(uid)
    }

    /// Start tracking a busy interval. Callers check `is_completed` first;
    /// a resolved UID never re-enters tracking.
    pub fn begin_tracking(&mut self, uid: &str) {
        debug_assert!(!self.completed.contains(uid));
        self.started.insert(uid.to_string());
    }

    /// Resolve one tracked interval, moving it from started to completed.
    /// A UID that was never started is left untouched.
    pub fn resolve(&mut self, uid: &str) {
        if self.started.remove(uid) {
            self.completed.insert(uid.to_string());
        }
    }

    /// Resolve every tracked interval at once. Operates on a snapshot of the
    /// started set, so nothing is skipped while it drains.
    pub fn complete_all_started(&mut self) {
        let started = std::mem::take(&mut self.started);
        self.completed.extend(started);
    }

    fn from_record(record: DayStateRecord, today: NaiveDate) -> Option<DayState> {
        if record.day_of_month != Some(today.day()) {
            return None;
        }

        let started: BTreeSet<String> = record.started.into_iter().collect();
        let completed: BTreeSet<String> = record.completed.into_iter().collect();
        if !started.is_disjoint(&completed) {
            // A UID can't be both in progress and resolved; the record is
            // untrustworthy as a whole.
            return None;
        }

        Some(DayState {
            date: today,
            day_started: record.day_started.is_some(),
            started,
            completed,
        })
    }

    fn to_record(&self) -> DayStateRecord {
        DayStateRecord {
            started: self.started.iter().cloned().collect(),
            completed: self.completed.iter().cloned().collect(),
            day_started: if self.day_started { Some(1) } else { None },
            day_of_month: Some(self.date.day()),
        }
    }
}

/// A loaded day state, plus whether an unusable persisted record had to be
/// thrown away to produce it (the pre-window run rewrites the file in that
/// case, so yesterday's leftovers don't survive).
pub struct LoadedDayState {
    pub state: DayState,
    pub scrubbed: bool,
}

/// Reads and writes the single day-state file.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: PathBuf) -> Self {
        StateStore { path }
    }

    /// Load the state for `today`.
    ///
    /// A missing file, unreadable JSON, a record missing its required keys,
    /// or a record from a different day all yield a fresh state. `scrubbed`
    /// is set when the discarded record actually held tracking data (or was
    /// too broken to tell).
    pub fn load(&self, today: NaiveDate) -> LoadedDayState {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => {
                debug!(path = %self.path.display(), "no state file, starting fresh");
                return LoadedDayState {
                    state: DayState::fresh(today),
                    scrubbed: false,
                };
            }
        };

        let record: DayStateRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!("state file unreadable ({e}), starting fresh");
                return LoadedDayState {
                    state: DayState::fresh(today),
                    scrubbed: true,
                };
            }
        };

        let had_tracking = !record.started.is_empty() || !record.completed.is_empty();
        match DayState::from_record(record, today) {
            Some(state) => LoadedDayState {
                state,
                scrubbed: false,
            },
            None => {
                debug!("discarding day state that doesn't belong to today");
                LoadedDayState {
                    state: DayState::fresh(today),
                    scrubbed: had_tracking,
                }
            }
        }
    }

    /// Write the state atomically (temp file + rename).
    pub fn save(&self, state: &DayState) -> BusyLightResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string(&state.to_record())?;
        let temp = self.path.with_extension("json.tmp");
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}
