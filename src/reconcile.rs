//! Combines the remote catalog and the local collection into one view.
//!
//! Every id appears once in the merged view. When both sources hold the
//! same id the local record shadows the remote one. Output is ordered by
//! ascending id so that the same inputs always produce the same listing.

use std::collections::BTreeMap;

use crate::error::{Result, SightingError};
use crate::record::{Sighting, SightingId};

pub fn merge(remote: &[Sighting], local: &[Sighting]) -> Vec<Sighting> {
    let mut by_id: BTreeMap<SightingId, &Sighting> = BTreeMap::new();

    // The remote catalog should not repeat ids; if it does, keep the first.
    for sighting in remote {
        by_id.entry(sighting.id).or_insert(sighting);
    }
    // Local records override remote ones, and a later local append
    // overrides an earlier one.
    for sighting in local {
        by_id.insert(sighting.id, sighting);
    }

    by_id.into_values().cloned().collect()
}

/// Looks in the local collection first, then in the remote one.
pub fn find_by_id<'a>(
    remote: &'a [Sighting],
    local: &'a [Sighting],
    id: SightingId,
) -> Result<&'a Sighting> {
    local
        .iter()
        .rev()
        .find(|s| s.id == id)
        .or_else(|| remote.iter().find(|s| s.id == id))
        .ok_or(SightingError::NotFound(id))
}
