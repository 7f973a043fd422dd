//! Read-only diagnostic view: what the run would see, without acting.

use anyhow::Result;
use busylight_core::config::DEFAULT_LOOKFORWARD_DAYS;
use busylight_core::{validate, BusyCalendar, Config, StateStore};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use crate::light_client::LightClient;
use crate::source;

pub async fn run(config: &Config, now: DateTime<Tz>) -> Result<()> {
    let window = config.workday_window()?;
    let regime = window.classify(&now);

    let light = LightClient::new(&config.api_endpoint)?;
    let light_state = light.status().await?;

    let store = StateStore::new(config.state_file.clone());
    let state = store.load(now.date_naive()).state;

    let feed = source::fetch_feed(config).await?;
    let calendar = BusyCalendar::parse(&feed)?;
    let now_utc = now.with_timezone(&Utc);
    let live = calendar.live_at(now_utc)?;
    let live_busy = validate::live_busy_uids(&live, &config.exclude_event_uids);
    let upcoming = calendar
        .occurrences_between(now_utc, now_utc + Duration::days(DEFAULT_LOOKFORWARD_DAYS))?;

    println!("now:          {}", now.format("%Y-%m-%d %H:%M:%S %Z"));
    println!("regime:       {:?}", regime);
    println!("light:        {:?}", light_state);
    println!("day started:  {}", state.day_started);
    println!("tracking:     {}", format_uids(state.started()));
    println!("completed:    {}", format_uids(state.completed()));
    println!("live busy:    {}", format_uids(&live_busy));

    println!("\nNext {} days:", DEFAULT_LOOKFORWARD_DAYS);
    if upcoming.is_empty() {
        println!("  (no occurrences)");
    }
    for occurrence in &upcoming {
        let marker = if occurrence.busy { "busy" } else { "free" };
        let when = if occurrence.all_day {
            occurrence.start.format("%Y-%m-%d (all day)").to_string()
        } else {
            occurrence.start.format("%Y-%m-%d %H:%M").to_string()
        };
        println!("  {} [{}] {}", when, marker, occurrence.summary);
    }

    Ok(())
}

fn format_uids(uids: &std::collections::BTreeSet<String>) -> String {
    if uids.is_empty() {
        "(none)".to_string()
    } else {
        uids.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}
