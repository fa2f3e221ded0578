//! Badge score model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Points awarded for each posted spot.
pub const SCORE_PER_SPOT: u32 = 5;

/// Cumulative per-user score (document ID = username).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Badge {
    pub username: String,
    pub scores: u32,
}

impl Badge {
    /// Apply a spot award to an existing badge, or start one.
    pub fn award(existing: Option<Badge>, username: &str) -> Badge {
        match existing {
            Some(mut badge) => {
                badge.scores = badge.scores.saturating_add(SCORE_PER_SPOT);
                badge
            }
            None => Badge {
                username: username.to_string(),
                scores: SCORE_PER_SPOT,
            },
        }
    }
}

/// Sort badges by score, highest first (ties by username).
pub fn rank(mut badges: Vec<Badge>) -> Vec<Badge> {
    badges.sort_by(|a, b| b.scores.cmp(&a.scores).then_with(|| a.username.cmp(&b.username)));
    badges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_award_creates_badge() {
        let badge = Badge::award(None, "alice");
        assert_eq!(badge.scores, 5);
        assert_eq!(badge.username, "alice");
    }

    #[test]
    fn test_award_increments() {
        let existing = Badge {
            username: "alice".to_string(),
            scores: 10,
        };
        assert_eq!(Badge::award(Some(existing), "alice").scores, 15);
    }

    #[test]
    fn test_rank_orders_descending() {
        let ranked = rank(vec![
            Badge {
                username: "a".into(),
                scores: 5,
            },
            Badge {
                username: "c".into(),
                scores: 20,
            },
            Badge {
                username: "b".into(),
                scores: 20,
            },
        ]);
        let names: Vec<&str> = ranked.iter().map(|b| b.username.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }
}
