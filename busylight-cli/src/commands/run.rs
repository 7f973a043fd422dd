//! One reconciliation pass: classify the instant, read the world, decide,
//! act, persist.
//!
//! Any transport or parse failure aborts the run before the state file is
//! touched; the next scheduled invocation starts over from the last
//! successfully persisted state.

use anyhow::Result;
use busylight_core::config::DEFAULT_LOOKFORWARD_DAYS;
use busylight_core::{engine, validate, BusyCalendar, Config, LightCommand, Regime, StateStore};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::{debug, info};

use crate::light_client::LightClient;
use crate::source;

pub async fn run(config: &Config, now: DateTime<Tz>) -> Result<()> {
    let today = now.date_naive();
    let store = StateStore::new(config.state_file.clone());
    let loaded = store.load(today);
    let mut state = loaded.state;

    let window = config.workday_window()?;
    let light = LightClient::new(&config.api_endpoint)?;

    match window.classify(&now) {
        Regime::PreWorkday => {
            debug!("before workday start");
            if loaded.scrubbed {
                // Replace yesterday's leftovers on disk so they can't
                // resurface; no light action this early.
                store.save(&state)?;
            }
            return Ok(());
        }
        Regime::PostWorkdayGrace => {
            // The one run that straddles day end still turns the light off,
            // even if a slow feed fetch delayed it.
            info!("workday over, turning the light off");
            light.send(LightCommand::SetOff).await?;
            return Ok(());
        }
        Regime::PostWorkdayExpired => {
            debug!("workday long over, nothing to do");
            return Ok(());
        }
        Regime::Workday => {
            debug!("within workday");
        }
    }

    let feed = source::fetch_feed(config).await?;
    let calendar = BusyCalendar::parse(&feed)?;
    let now_utc = now.with_timezone(&Utc);

    let upcoming = calendar
        .occurrences_between(now_utc, now_utc + Duration::days(DEFAULT_LOOKFORWARD_DAYS))?;
    info!("calendar has {} occurrence(s) in the next {} days", upcoming.len(), DEFAULT_LOOKFORWARD_DAYS);

    let light_state = light.status().await?;
    let live = calendar.live_at(now_utc)?;
    let live_busy = validate::live_busy_uids(&live, &config.exclude_event_uids);
    debug!(live = live.len(), busy = live_busy.len(), "live occurrences");

    let commands = engine::reconcile(light_state, &mut state, &live_busy);
    for command in &commands {
        light.send(*command).await?;
    }
    store.save(&state)?;

    info!("run complete, {} command(s) issued", commands.len());
    Ok(())
}
