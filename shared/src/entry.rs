//! Player entries, level identifiers and sort comparators.
//!
//! Field order on `PlayerEntry` is part of the wire and file format: the
//! codec encodes fields in declaration order with no per-field tags.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One validated leaderboard record. The `Default` value (empty name, all
/// zeroes) doubles as the "empty slot" padding entry in wire replies.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct PlayerEntry {
    pub player_name: String,
    pub score: i32,
    pub accuracy: f32,
    pub longest_streak: i32,
    pub number_of_tricks: i32,
    pub number_of_combos: i32,
    pub shots_fired: i32,
    pub shots_hit: i32,
    pub completion_time: f32,
}

impl PlayerEntry {
    /// Returns true when every stat is in range. Used server-side as an
    /// anti-cheat filter: entries that fail are dropped without telling the
    /// submitting peer which rule tripped.
    pub fn is_valid(&self) -> bool {
        self.score >= 0
            && self.longest_streak >= 0
            && self.completion_time >= 0.0
            && self.shots_hit >= 0
            && self.shots_fired >= 0
            && self.shots_fired >= self.shots_hit
            && (0.0..=100.0).contains(&self.accuracy)
            && self.number_of_tricks >= 0
            && self.number_of_combos >= 0
    }
}

/// Game level a leaderboard belongs to. The wire carries the ordinal as an
/// `i32`; `from_i32` rejects anything out of range so a corrupt ordinal is a
/// decode error, never a panic.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelId {
    NoMotion,
    Beginner,
    Advanced,
    Practice,
}

impl LevelId {
    pub const COUNT: usize = 4;

    /// All levels, in ordinal order. Used instead of a `Count` sentinel
    /// variant for iteration bounds.
    pub const ALL: [LevelId; Self::COUNT] = [
        LevelId::NoMotion,
        LevelId::Beginner,
        LevelId::Advanced,
        LevelId::Practice,
    ];

    pub fn from_i32(value: i32) -> Option<LevelId> {
        if value < 0 {
            return None;
        }
        Self::ALL.get(value as usize).copied()
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Stable lowercase name, used to derive the per-level file identity.
    pub fn name(self) -> &'static str {
        match self {
            LevelId::NoMotion => "no_motion",
            LevelId::Beginner => "beginner",
            LevelId::Advanced => "advanced",
            LevelId::Practice => "practice",
        }
    }
}

/// Comparator selector for leaderboard ordering.
///
/// Every `Lowest*` variant is defined as its `Highest*` counterpart with the
/// operands swapped, so the two always produce exactly inverse orderings.
/// Each variant compares the field it is named after (the combo-count
/// variants included).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum SortMethod {
    AlphabeticalAscending,
    AlphabeticalDescending,
    HighestScore,
    LowestScore,
    HighestLongestStreak,
    LowestLongestStreak,
    HighestCompletionTime,
    LowestCompletionTime,
    HighestShotsFired,
    LowestShotsFired,
    HighestShotsHit,
    LowestShotsHit,
    HighestAccuracy,
    LowestAccuracy,
    HighestNumberOfTricks,
    LowestNumberOfTricks,
    HighestNumberOfCombos,
    LowestNumberOfCombos,
}

impl SortMethod {
    pub const COUNT: usize = 18;

    pub const ALL: [SortMethod; Self::COUNT] = [
        SortMethod::AlphabeticalAscending,
        SortMethod::AlphabeticalDescending,
        SortMethod::HighestScore,
        SortMethod::LowestScore,
        SortMethod::HighestLongestStreak,
        SortMethod::LowestLongestStreak,
        SortMethod::HighestCompletionTime,
        SortMethod::LowestCompletionTime,
        SortMethod::HighestShotsFired,
        SortMethod::LowestShotsFired,
        SortMethod::HighestShotsHit,
        SortMethod::LowestShotsHit,
        SortMethod::HighestAccuracy,
        SortMethod::LowestAccuracy,
        SortMethod::HighestNumberOfTricks,
        SortMethod::LowestNumberOfTricks,
        SortMethod::HighestNumberOfCombos,
        SortMethod::LowestNumberOfCombos,
    ];

    pub fn from_i32(value: i32) -> Option<SortMethod> {
        if value < 0 {
            return None;
        }
        Self::ALL.get(value as usize).copied()
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Compares two entries under this sort method. `Ordering::Less` means
    /// `a` ranks ahead of `b`.
    pub fn compare(self, a: &PlayerEntry, b: &PlayerEntry) -> Ordering {
        use SortMethod::*;
        match self {
            AlphabeticalAscending => a.player_name.cmp(&b.player_name),
            AlphabeticalDescending => AlphabeticalAscending.compare(b, a),
            HighestScore => b.score.cmp(&a.score),
            LowestScore => HighestScore.compare(b, a),
            HighestLongestStreak => b.longest_streak.cmp(&a.longest_streak),
            LowestLongestStreak => HighestLongestStreak.compare(b, a),
            HighestCompletionTime => compare_f32(b.completion_time, a.completion_time),
            LowestCompletionTime => HighestCompletionTime.compare(b, a),
            HighestShotsFired => b.shots_fired.cmp(&a.shots_fired),
            LowestShotsFired => HighestShotsFired.compare(b, a),
            HighestShotsHit => b.shots_hit.cmp(&a.shots_hit),
            LowestShotsHit => HighestShotsHit.compare(b, a),
            HighestAccuracy => compare_f32(b.accuracy, a.accuracy),
            LowestAccuracy => HighestAccuracy.compare(b, a),
            HighestNumberOfTricks => b.number_of_tricks.cmp(&a.number_of_tricks),
            LowestNumberOfTricks => HighestNumberOfTricks.compare(b, a),
            HighestNumberOfCombos => b.number_of_combos.cmp(&a.number_of_combos),
            LowestNumberOfCombos => HighestNumberOfCombos.compare(b, a),
        }
    }
}

// Validation keeps NaN out of stored entries, so incomparable values only
// show up when comparing against a zero-valued padding record.
fn compare_f32(a: f32, b: f32) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, score: i32) -> PlayerEntry {
        PlayerEntry {
            player_name: name.to_string(),
            score,
            accuracy: 50.0,
            longest_streak: 3,
            number_of_tricks: 2,
            number_of_combos: 1,
            shots_fired: 20,
            shots_hit: 10,
            completion_time: 60.0,
        }
    }

    #[test]
    fn default_entry_is_zeroed() {
        let e = PlayerEntry::default();
        assert_eq!(e.player_name, "");
        assert_eq!(e.score, 0);
        assert_eq!(e.accuracy, 0.0);
        assert_eq!(e.completion_time, 0.0);
    }

    #[test]
    fn valid_entry_passes_validation() {
        assert!(entry("alice", 100).is_valid());
        assert!(PlayerEntry::default().is_valid());
    }

    #[test]
    fn validation_rejects_out_of_range_stats() {
        let mut e = entry("bob", -1);
        assert!(!e.is_valid());

        e = entry("bob", 10);
        e.longest_streak = -1;
        assert!(!e.is_valid());

        e = entry("bob", 10);
        e.completion_time = -0.5;
        assert!(!e.is_valid());

        e = entry("bob", 10);
        e.shots_hit = 30;
        e.shots_fired = 20;
        assert!(!e.is_valid());

        e = entry("bob", 10);
        e.accuracy = 100.5;
        assert!(!e.is_valid());

        e = entry("bob", 10);
        e.accuracy = -0.1;
        assert!(!e.is_valid());

        e = entry("bob", 10);
        e.accuracy = f32::NAN;
        assert!(!e.is_valid());

        e = entry("bob", 10);
        e.number_of_tricks = -2;
        assert!(!e.is_valid());

        e = entry("bob", 10);
        e.number_of_combos = -2;
        assert!(!e.is_valid());
    }

    #[test]
    fn level_ordinal_roundtrip() {
        for level in LevelId::ALL {
            assert_eq!(LevelId::from_i32(level.as_i32()), Some(level));
        }
        assert_eq!(LevelId::from_i32(-1), None);
        assert_eq!(LevelId::from_i32(LevelId::COUNT as i32), None);
    }

    #[test]
    fn level_names_are_distinct() {
        for a in LevelId::ALL {
            for b in LevelId::ALL {
                if a != b {
                    assert_ne!(a.name(), b.name());
                }
            }
        }
    }

    #[test]
    fn sort_method_ordinal_roundtrip() {
        for method in SortMethod::ALL {
            assert_eq!(SortMethod::from_i32(method.as_i32()), Some(method));
        }
        assert_eq!(SortMethod::from_i32(-1), None);
        assert_eq!(SortMethod::from_i32(SortMethod::COUNT as i32), None);
    }

    #[test]
    fn highest_score_ranks_larger_first() {
        let high = entry("a", 200);
        let low = entry("b", 100);
        assert_eq!(SortMethod::HighestScore.compare(&high, &low), Ordering::Less);
        assert_eq!(SortMethod::LowestScore.compare(&low, &high), Ordering::Less);
    }

    #[test]
    fn alphabetical_orders_by_name() {
        let a = entry("anna", 1);
        let z = entry("zoe", 1);
        assert_eq!(
            SortMethod::AlphabeticalAscending.compare(&a, &z),
            Ordering::Less
        );
        assert_eq!(
            SortMethod::AlphabeticalDescending.compare(&z, &a),
            Ordering::Less
        );
    }

    #[test]
    fn combo_sort_compares_combo_count() {
        let mut many = entry("a", 0);
        many.number_of_combos = 9;
        let mut few = entry("b", 999);
        few.number_of_combos = 1;

        // Combos, not score or tricks, decide this pair.
        assert_eq!(
            SortMethod::HighestNumberOfCombos.compare(&many, &few),
            Ordering::Less
        );
        assert_eq!(
            SortMethod::LowestNumberOfCombos.compare(&few, &many),
            Ordering::Less
        );
    }

    #[test]
    fn lowest_sorts_are_exact_inverse_of_highest() {
        let entries = vec![
            entry("carol", 300),
            entry("alice", 100),
            entry("bob", 200),
            entry("dave", 50),
        ];

        let pairs = [
            (SortMethod::HighestScore, SortMethod::LowestScore),
            (
                SortMethod::HighestLongestStreak,
                SortMethod::LowestLongestStreak,
            ),
            (
                SortMethod::HighestCompletionTime,
                SortMethod::LowestCompletionTime,
            ),
            (SortMethod::HighestShotsFired, SortMethod::LowestShotsFired),
            (SortMethod::HighestShotsHit, SortMethod::LowestShotsHit),
            (SortMethod::HighestAccuracy, SortMethod::LowestAccuracy),
            (
                SortMethod::HighestNumberOfTricks,
                SortMethod::LowestNumberOfTricks,
            ),
            (
                SortMethod::HighestNumberOfCombos,
                SortMethod::LowestNumberOfCombos,
            ),
            (
                SortMethod::AlphabeticalAscending,
                SortMethod::AlphabeticalDescending,
            ),
        ];

        // Stats vary per entry so each comparator sees distinct values.
        let mut distinct = entries.clone();
        for (i, e) in distinct.iter_mut().enumerate() {
            e.longest_streak = i as i32;
            e.completion_time = 10.0 + i as f32;
            e.shots_fired = 40 + i as i32;
            e.shots_hit = 5 + i as i32;
            e.accuracy = 20.0 + i as f32;
            e.number_of_tricks = i as i32;
            e.number_of_combos = 10 - i as i32;
        }

        for (highest, lowest) in pairs {
            let mut forward = distinct.clone();
            forward.sort_by(|a, b| highest.compare(a, b));

            let mut backward = distinct.clone();
            backward.sort_by(|a, b| lowest.compare(a, b));

            let mut reversed = forward.clone();
            reversed.reverse();
            assert_eq!(backward, reversed, "pair {:?}/{:?}", highest, lowest);
        }
    }

    #[test]
    fn entry_serialization_roundtrip() {
        let e = entry("alice", 500);
        let bytes = bincode::serialize(&e).unwrap();
        let back: PlayerEntry = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, e);
    }
}
