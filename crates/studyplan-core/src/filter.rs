//! Proficiency-based filtering of candidate items.

use crate::model::{Difficulty, Item, ProficiencyLevel, ProficiencyMap};

/// Whether a learner at `level` should see an item of `difficulty`.
///
/// Beginners see everything. Intermediate and Expert currently filter
/// identically (Medium and Hard only); nothing distinguishes them yet.
pub fn admits(level: ProficiencyLevel, difficulty: Difficulty) -> bool {
    match level {
        ProficiencyLevel::Beginner => true,
        ProficiencyLevel::Intermediate | ProficiencyLevel::Expert => {
            matches!(difficulty, Difficulty::Medium | Difficulty::Hard)
        }
    }
}

/// Keep the items whose difficulty suits the learner's level in their topic.
///
/// Relative order is preserved.
pub fn filter_by_proficiency(items: Vec<Item>, proficiency: &ProficiencyMap) -> Vec<Item> {
    items
        .into_iter()
        .filter(|item| admits(proficiency.level_for(&item.topic), item.difficulty))
        .collect()
}
