use crate::game::LevelId;
use serde::{Deserialize, Serialize};

/// Campaign progress: the highest unlocked level. Monotonically
/// non-decreasing within and across sessions; levels stay contiguous from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignProgress {
    highest_level_unlocked: LevelId,
}

impl CampaignProgress {
    /// Build from a stored value. Absent-or-zero means first launch, which
    /// unlocks level 1.
    pub fn from_stored(value: LevelId) -> Self {
        CampaignProgress {
            highest_level_unlocked: value.max(1),
        }
    }

    pub fn highest_level_unlocked(&self) -> LevelId {
        self.highest_level_unlocked
    }

    /// A level is playable iff it does not exceed the frontier.
    pub fn is_playable(&self, level: LevelId) -> bool {
        level >= 1 && level <= self.highest_level_unlocked
    }

    /// Advance the frontier by exactly one iff the completed level IS the
    /// frontier. Replaying an earlier level never advances progress.
    /// Returns whether anything changed.
    pub fn unlock_if_frontier(&mut self, completed: LevelId) -> bool {
        if completed == self.highest_level_unlocked {
            self.highest_level_unlocked += 1;
            true
        } else {
            false
        }
    }
}

impl Default for CampaignProgress {
    fn default() -> Self {
        Self::from_stored(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_launch_unlocks_level_one() {
        let progress = CampaignProgress::from_stored(0);
        assert_eq!(progress.highest_level_unlocked(), 1);
        assert!(progress.is_playable(1));
        assert!(!progress.is_playable(2));
    }

    #[test]
    fn completing_the_frontier_advances_by_one() {
        let mut progress = CampaignProgress::from_stored(3);
        assert!(progress.unlock_if_frontier(3));
        assert_eq!(progress.highest_level_unlocked(), 4);
    }

    #[test]
    fn replaying_below_the_frontier_changes_nothing() {
        let mut progress = CampaignProgress::from_stored(5);
        assert!(!progress.unlock_if_frontier(2));
        assert_eq!(progress.highest_level_unlocked(), 5);
    }

    #[test]
    fn levels_beyond_the_frontier_never_advance_it() {
        let mut progress = CampaignProgress::from_stored(3);
        assert!(!progress.unlock_if_frontier(7));
        assert_eq!(progress.highest_level_unlocked(), 3);
    }

    #[test]
    fn level_zero_is_never_playable() {
        let progress = CampaignProgress::from_stored(10);
        assert!(!progress.is_playable(0));
        assert!(progress.is_playable(10));
        assert!(!progress.is_playable(11));
    }

    #[test]
    fn repeated_frontier_wins_stay_contiguous() {
        let mut progress = CampaignProgress::from_stored(1);
        for level in 1..=4 {
            assert!(progress.unlock_if_frontier(level));
        }
        assert_eq!(progress.highest_level_unlocked(), 5);
    }
}
