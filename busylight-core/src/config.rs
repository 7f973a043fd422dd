//! Configuration: a single JSON file with typed fields and defaults.
//!
//! Optional keys missing from the file are filled in with their defaults and
//! the completed config is written back, so the file on disk always shows
//! every knob that exists.

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::day_window::{
    WorkdayWindow, DEFAULT_CLOSE_GRACE_SECONDS, DEFAULT_DAY_END, DEFAULT_DAY_START,
};
use crate::error::{BusyLightError, BusyLightResult};

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_STATE_FILE: &str = "state.json";
pub const DEFAULT_CALENDAR_REFRESH_INTERVAL_SECONDS: u64 = 3600;
pub const DEFAULT_TIMEZONE: &str = "US/Eastern";
pub const DEFAULT_LOOKFORWARD_DAYS: i64 = 3;

fn default_state_file() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_FILE)
}

fn default_calendar_refresh_interval() -> u64 {
    DEFAULT_CALENDAR_REFRESH_INTERVAL_SECONDS
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_day_start() -> String {
    DEFAULT_DAY_START.to_string()
}

fn default_day_end() -> String {
    DEFAULT_DAY_END.to_string()
}

fn default_close_grace_seconds() -> u64 {
    DEFAULT_CLOSE_GRACE_SECONDS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the light's control API (required)
    pub api_endpoint: String,

    /// Calendar feed URL; required unless `useLocal` is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar: Option<String>,

    /// Read the feed from `localCalendar` on disk instead of fetching it
    #[serde(default)]
    pub use_local: bool,

    /// Path of the local feed file when `useLocal` is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_calendar: Option<PathBuf>,

    /// UIDs never treated as busy
    #[serde(rename = "excludeEventUIDs", default)]
    pub exclude_event_uids: Vec<String>,

    /// Where the per-day tracking state lives
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// How often the feed is worth re-fetching; informational for external
    /// schedulers, nothing in here acts on it
    #[serde(default = "default_calendar_refresh_interval")]
    pub calendar_refresh_interval_seconds: u64,

    /// IANA zone the workday window is expressed in
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Workday window open time, HH:MM
    #[serde(default = "default_day_start")]
    pub day_start: String,

    /// Workday window close time, HH:MM
    #[serde(default = "default_day_end")]
    pub day_end: String,

    /// Seconds after `dayEnd` during which a run still turns the light off
    #[serde(default = "default_close_grace_seconds")]
    pub close_grace_seconds: u64,
}

impl Config {
    /// Load the config, validate it, and write back any defaulted keys.
    pub fn load(path: &Path) -> BusyLightResult<Config> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            BusyLightError::Config(format!("Could not read config file {}: {e}", path.display()))
        })?;

        let file_value: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| BusyLightError::Config(format!("Config is not valid JSON: {e}")))?;

        let config: Config = serde_json::from_value(file_value.clone())
            .map_err(|e| BusyLightError::Config(e.to_string()))?;
        config.validate()?;

        if config.has_keys_missing_from(&file_value) {
            debug!("writing defaulted keys back to {}", path.display());
            config.save(path)?;
        }

        Ok(config)
    }

    pub fn save(&self, path: &Path) -> BusyLightResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> BusyLightResult<()> {
        if self.use_local {
            if self.local_calendar.is_none() {
                return Err(BusyLightError::Config(
                    "useLocal is set but localCalendar is missing".to_string(),
                ));
            }
        } else if self.calendar.is_none() {
            return Err(BusyLightError::Config(
                "Missing calendar feed URL (set calendar, or useLocal + localCalendar)"
                    .to_string(),
            ));
        }

        // Fail at load time, not halfway through a run
        self.tz()?;
        self.workday_window()?;
        Ok(())
    }

    /// The configured zone, parsed.
    pub fn tz(&self) -> BusyLightResult<Tz> {
        self.timezone
            .parse()
            .map_err(|_| BusyLightError::Timezone(self.timezone.clone()))
    }

    /// The workday window described by `dayStart`/`dayEnd`/`closeGraceSeconds`.
    pub fn workday_window(&self) -> BusyLightResult<WorkdayWindow> {
        let start = parse_day_time("dayStart", &self.day_start)?;
        let end = parse_day_time("dayEnd", &self.day_end)?;
        if end <= start {
            return Err(BusyLightError::Config(format!(
                "dayEnd ({}) must be after dayStart ({})",
                self.day_end, self.day_start
            )));
        }
        Ok(WorkdayWindow {
            start,
            end,
            close_grace: Duration::seconds(self.close_grace_seconds as i64),
        })
    }

    fn has_keys_missing_from(&self, file_value: &serde_json::Value) -> bool {
        let full = match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => return false,
        };
        match file_value.as_object() {
            Some(present) => full.keys().any(|key| !present.contains_key(key)),
            None => false,
        }
    }
}

fn parse_day_time(key: &str, value: &str) -> BusyLightResult<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| BusyLightError::Config(format!("{key} must be HH:MM, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"{"apiEndpoint": "http://light.local/", "calendar": "https://example.com/cal.ics"}"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.state_file, PathBuf::from("state.json"));
        assert_eq!(config.calendar_refresh_interval_seconds, 3600);
        assert_eq!(config.timezone, "US/Eastern");
        assert_eq!(config.close_grace_seconds, 360);
        assert!(!config.use_local);
        assert!(config.exclude_event_uids.is_empty());
    }

    #[test]
    fn test_defaulted_keys_are_written_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"{"apiEndpoint": "http://light.local/", "calendar": "https://example.com/cal.ics"}"#,
        );

        Config::load(&path).unwrap();

        let rewritten = std::fs::read_to_string(&path).unwrap();
        assert!(rewritten.contains("stateFile"));
        assert!(rewritten.contains("calendarRefreshIntervalSeconds"));
        assert!(rewritten.contains("dayStart"));
    }

    #[test]
    fn test_complete_config_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"{"apiEndpoint": "http://light.local/", "calendar": "https://example.com/cal.ics"}"#,
        );

        Config::load(&path).unwrap();
        let first = std::fs::read_to_string(&path).unwrap();
        Config::load(&path).unwrap();
        let second = std::fs::read_to_string(&path).unwrap();
        assert_eq!(first, second, "a complete file should load without being touched");
    }

    #[test]
    fn test_missing_api_endpoint_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"calendar": "https://example.com/cal.ics"}"#);
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_missing_calendar_is_fatal_without_use_local() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"apiEndpoint": "http://light.local/"}"#);
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_use_local_requires_local_calendar() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"{"apiEndpoint": "http://light.local/", "useLocal": true}"#,
        );
        assert!(Config::load(&path).is_err());

        let path = write_config(
            &dir,
            r#"{"apiEndpoint": "http://light.local/", "useLocal": true, "localCalendar": "cal.ics"}"#,
        );
        let config = Config::load(&path).unwrap();
        assert!(config.use_local);
    }

    #[test]
    fn test_exclusion_list_key_spelling() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"{"apiEndpoint": "http://light.local/", "calendar": "https://x/c.ics",
                "excludeEventUIDs": ["standing-lunch"]}"#,
        );
        let config = Config::load(&path).unwrap();
        assert_eq!(config.exclude_event_uids, vec!["standing-lunch".to_string()]);
    }

    #[test]
    fn test_unknown_timezone_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"{"apiEndpoint": "http://light.local/", "calendar": "https://x/c.ics",
                "timezone": "Mars/Olympus_Mons"}"#,
        );
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_custom_workday_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"{"apiEndpoint": "http://light.local/", "calendar": "https://x/c.ics",
                "dayStart": "07:00", "dayEnd": "15:30", "closeGraceSeconds": 120}"#,
        );
        let config = Config::load(&path).unwrap();
        let window = config.workday_window().unwrap();
        assert_eq!(window.start, NaiveTime::from_hms_opt(7, 0, 0).unwrap());
        assert_eq!(window.end, NaiveTime::from_hms_opt(15, 30, 0).unwrap());
        assert_eq!(window.close_grace, Duration::seconds(120));
    }

    #[test]
    fn test_inverted_window_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"{"apiEndpoint": "http://light.local/", "calendar": "https://x/c.ics",
                "dayStart": "18:00", "dayEnd": "08:30"}"#,
        );
        assert!(Config::load(&path).is_err());
    }
}
