//! Light device model: observed color state and the commands we can issue.

use serde::Deserialize;

/// The light's `status` endpoint response. Channel values may be absent
/// when the light is off.
#[derive(Debug, Deserialize)]
pub struct LightStatus {
    pub status: String,
    #[serde(default)]
    pub red: u32,
    #[serde(default)]
    pub green: u32,
    #[serde(default)]
    pub blue: u32,
}

/// Observed light color, reduced to what the engine cares about.
///
/// `Other` covers any reading outside the three recognized pure colors
/// (mixed colors, a manually chosen hue) and is treated as a non-red,
/// non-off state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightColorState {
    Off,
    Green,
    Red,
    Other,
}

impl From<&LightStatus> for LightColorState {
    fn from(status: &LightStatus) -> Self {
        if status.status == "off" {
            LightColorState::Off
        } else if status.blue == 0 && status.red == 0 && status.green > 0 {
            LightColorState::Green
        } else if status.blue == 0 && status.green == 0 && status.red > 0 {
            LightColorState::Red
        } else {
            LightColorState::Other
        }
    }
}

/// A command for the light, each mapping to one idempotent GET endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightCommand {
    SetAvailable,
    SetBusy,
    SetOff,
}

impl LightCommand {
    /// The URL suffix appended to the device's base endpoint.
    pub fn endpoint_suffix(&self) -> &'static str {
        match self {
            LightCommand::SetAvailable => "available",
            LightCommand::SetBusy => "busy",
            LightCommand::SetOff => "off",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: &str, red: u32, green: u32, blue: u32) -> LightStatus {
        LightStatus {
            status: status.to_string(),
            red,
            green,
            blue,
        }
    }

    #[test]
    fn test_off_status_wins_over_channels() {
        assert_eq!(
            LightColorState::from(&status("off", 255, 255, 255)),
            LightColorState::Off
        );
    }

    #[test]
    fn test_pure_green_maps_to_green() {
        assert_eq!(
            LightColorState::from(&status("on", 0, 128, 0)),
            LightColorState::Green
        );
    }

    #[test]
    fn test_pure_red_maps_to_red() {
        assert_eq!(
            LightColorState::from(&status("on", 255, 0, 0)),
            LightColorState::Red
        );
    }

    #[test]
    fn test_mixed_color_maps_to_other() {
        assert_eq!(
            LightColorState::from(&status("on", 120, 0, 200)),
            LightColorState::Other
        );
        assert_eq!(
            LightColorState::from(&status("on", 0, 0, 0)),
            LightColorState::Other
        );
    }

    #[test]
    fn test_command_endpoint_suffixes() {
        assert_eq!(LightCommand::SetAvailable.endpoint_suffix(), "available");
        assert_eq!(LightCommand::SetBusy.endpoint_suffix(), "busy");
        assert_eq!(LightCommand::SetOff.endpoint_suffix(), "off");
    }
}
