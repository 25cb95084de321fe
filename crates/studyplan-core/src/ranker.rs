//! Priority ordering of filtered items.

use std::cmp::Reverse;

use crate::model::{DifficultyWeights, Item};

/// Order items by priority tier (highest first), then by difficulty weight
/// (lightest first).
///
/// The sort is stable: items with equal keys keep their incoming order.
pub fn rank(mut items: Vec<Item>, weights: &DifficultyWeights) -> Vec<Item> {
    items.sort_by_key(|item| (Reverse(item.priority), weights.weight(item.difficulty)));
    items
}
