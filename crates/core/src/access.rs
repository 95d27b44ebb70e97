//! Tier-based content gating.
//!
//! The first item of every list is free; paid tiers see everything; an absent
//! or unrecognised tier sees nothing.

use crate::model::{UserProfile, UserTier};

/// Returns `true` when an item at `position` is locked for `tier`.
#[must_use]
pub fn is_locked(tier: UserTier, position: usize) -> bool {
    match tier {
        UserTier::Pro | UserTier::Plus => false,
        UserTier::Free => position > 0,
        UserTier::Unknown => true,
    }
}

/// Same as [`is_locked`], treating a missing profile as locked everywhere.
#[must_use]
pub fn is_locked_for(profile: Option<&UserProfile>, position: usize) -> bool {
    profile.is_none_or(|p| is_locked(p.tier, position))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paid_tiers_are_never_locked() {
        for tier in [UserTier::Plus, UserTier::Pro] {
            for position in [0, 1, 2, 9, 500, usize::MAX] {
                assert!(!is_locked(tier, position), "{tier} at {position}");
            }
        }
    }

    #[test]
    fn free_tier_unlocks_only_the_first_item() {
        assert!(!is_locked(UserTier::Free, 0));
        for position in 1..50 {
            assert!(is_locked(UserTier::Free, position));
        }
    }

    #[test]
    fn unknown_or_absent_tier_is_locked_everywhere() {
        for position in [0, 1, 7] {
            assert!(is_locked(UserTier::Unknown, position));
            assert!(is_locked(UserTier::parse("gold"), position));
            assert!(is_locked_for(None, position));
        }
    }

    #[test]
    fn profile_delegates_to_tier() {
        let free = UserProfile::new("u1", UserTier::Free);
        assert!(!is_locked_for(Some(&free), 0));
        assert!(is_locked_for(Some(&free), 3));
    }
}
