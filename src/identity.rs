use crate::error::{Result, SightingError};
use crate::record::SightingId;

/// Id handed out when nothing is known yet.
pub const FIRST_ID: SightingId = 1;

/// Returns one past the largest known id, or [`FIRST_ID`] for an empty set.
///
/// `known_ids` must cover both the remote catalog and the local collection
/// as read immediately before allocation.
pub fn next_id<I>(known_ids: I) -> Result<SightingId>
where
    I: IntoIterator<Item = SightingId>,
{
    match known_ids.into_iter().max() {
        None => Ok(FIRST_ID),
        Some(max) => max.checked_add(1).ok_or(SightingError::IdSpaceExhausted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set_uses_floor() {
        assert_eq!(next_id(Vec::new()).unwrap(), FIRST_ID);
    }

    #[test]
    fn test_exceeds_every_known_id() {
        let known = vec![3, 1, 42, 7];
        let next = next_id(known.iter().copied()).unwrap();
        assert_eq!(next, 43);
        assert!(known.iter().all(|id| next > *id));
    }

    #[test]
    fn test_duplicates_and_order_do_not_matter() {
        assert_eq!(next_id([5, 5, 2, 5]).unwrap(), 6);
        assert_eq!(next_id([2, 5]).unwrap(), next_id([5, 2]).unwrap());
    }

    #[test]
    fn test_overflow_is_reported() {
        assert!(matches!(
            next_id([SightingId::MAX]),
            Err(SightingError::IdSpaceExhausted)
        ));
    }
}
