//! Filtering live occurrences down to the ones that should drive the light.

use std::collections::BTreeSet;

use tracing::debug;

use crate::event::Occurrence;

/// Whether an occurrence should be treated as occupying time: its source
/// marks it busy and its UID is not on the exclusion list.
pub fn counts_as_busy(occurrence: &Occurrence, excluded_uids: &[String]) -> bool {
    occurrence.busy && !excluded_uids.iter().any(|uid| uid == &occurrence.uid)
}

/// Reduce the live occurrences to the set of UIDs that count as busy.
///
/// All-day occurrences are expected to have been dropped upstream; the feed
/// query never yields them as live.
pub fn live_busy_uids(live: &[Occurrence], excluded_uids: &[String]) -> BTreeSet<String> {
    let mut uids = BTreeSet::new();
    for occurrence in live {
        if counts_as_busy(occurrence, excluded_uids) {
            uids.insert(occurrence.uid.clone());
        } else {
            debug!(uid = %occurrence.uid, "live occurrence does not count as busy");
        }
    }
    uids
}
