//! The reconciliation engine.
//!
//! Given the observed light color, the day's tracking state, and the set of
//! busy event UIDs live right now, decide which commands to send and how the
//! tracking state moves. Pure over its inputs: no clock reads, no I/O, no
//! retries. A failed run simply leaves the state file untouched for the
//! next invocation.
//!
//! Manual interference is treated as the user's call. A light switched off
//! after the daily auto-start stays off for the rest of the date; a light
//! moved away from red mid-meeting cedes that meeting's tracking instead of
//! fighting the override.

use std::collections::BTreeSet;

use tracing::debug;

use crate::light::{LightColorState, LightCommand};
use crate::state::DayState;

/// One reconciliation pass. Mutates `state` in place and returns the
/// commands to issue, in order. Commands are deduplicated: a single busy
/// command covers any number of newly started intervals.
pub fn reconcile(
    light: LightColorState,
    state: &mut DayState,
    live_busy: &BTreeSet<String>,
) -> Vec<LightCommand> {
    let mut commands = Vec::new();

    // Daily auto-start, once per date.
    if light == LightColorState::Off {
        if state.day_started {
            // The user turned the light off after we already started the
            // day; stay quiet until tomorrow.
            debug!("light manually off after day start, leaving it alone");
            return commands;
        }
        commands.push(LightCommand::SetAvailable);
        state.day_started = true;
    }

    if live_busy.is_empty() {
        if light == LightColorState::Red {
            if state.started().is_empty() {
                // Red without any tracked interval: a manual choice, not ours
                // to undo.
                debug!("light is red with nothing tracked, leaving it alone");
            } else {
                // Every tracked interval has ended on schedule.
                state.complete_all_started();
                commands.push(LightCommand::SetAvailable);
            }
        }
        return commands;
    }

    let mut newly_started = false;
    for uid in live_busy {
        if state.is_completed(uid) {
            debug!(%uid, "already resolved today");
        } else if !state.is_tracking(uid) {
            debug!(%uid, "new busy interval");
            state.begin_tracking(uid);
            newly_started = true;
        } else if light != LightColorState::Red {
            // Tracked interval, but the light was moved off red by hand;
            // cede it rather than re-asserting busy.
            debug!(%uid, "light moved off red mid-interval, ceding");
            state.resolve(uid);
        }
    }

    if newly_started {
        commands.push(LightCommand::SetBusy);
    }

    commands
}
