//! Core data model types for studyplan.
//!
//! These are the types the allocation pipeline consumes and produces:
//! backlog items, proficiency levels, outstanding state, and plans.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Stable, opaque identifier of a backlog item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of a learner whose plan is stored.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LearnerId(pub String);

impl LearnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LearnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LearnerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// How hard a backlog item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// A learner's self-reported skill in a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProficiencyLevel {
    #[default]
    Beginner,
    Intermediate,
    Expert,
}

impl fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProficiencyLevel::Beginner => write!(f, "beginner"),
            ProficiencyLevel::Intermediate => write!(f, "intermediate"),
            ProficiencyLevel::Expert => write!(f, "expert"),
        }
    }
}

impl FromStr for ProficiencyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(ProficiencyLevel::Beginner),
            "intermediate" => Ok(ProficiencyLevel::Intermediate),
            "expert" => Ok(ProficiencyLevel::Expert),
            other => Err(format!("unknown proficiency level: {other}")),
        }
    }
}

/// Topic → proficiency level. Unmapped topics resolve to `Beginner`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProficiencyMap(BTreeMap<String, ProficiencyLevel>);

impl ProficiencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, topic: impl Into<String>, level: ProficiencyLevel) -> Self {
        self.0.insert(topic.into(), level);
        self
    }

    pub fn insert(&mut self, topic: impl Into<String>, level: ProficiencyLevel) {
        self.0.insert(topic.into(), level);
    }

    pub fn level_for(&self, topic: &str) -> ProficiencyLevel {
        self.0.get(topic).copied().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ProficiencyLevel)> for ProficiencyMap {
    fn from_iter<T: IntoIterator<Item = (String, ProficiencyLevel)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One backlog entry. Never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub topic: String,
    pub difficulty: Difficulty,
    /// Priority tier; higher values are scheduled first.
    #[serde(default = "default_priority")]
    pub priority: u32,
    /// Question text, for display only.
    #[serde(default)]
    pub title: Option<String>,
    /// Link to the exercise, for display only.
    #[serde(default)]
    pub link: Option<String>,
}

fn default_priority() -> u32 {
    1
}

impl Item {
    pub fn new(id: impl Into<String>, topic: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            id: ItemId::new(id),
            topic: topic.into(),
            difficulty,
            priority: default_priority(),
            title: None,
            link: None,
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }
}

/// Minutes budgeted for an item of each difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeTable {
    #[serde(default = "default_easy_minutes")]
    pub easy: u32,
    #[serde(default = "default_medium_minutes")]
    pub medium: u32,
    #[serde(default = "default_hard_minutes")]
    pub hard: u32,
}

fn default_easy_minutes() -> u32 {
    20
}
fn default_medium_minutes() -> u32 {
    30
}
fn default_hard_minutes() -> u32 {
    45
}

impl Default for TimeTable {
    fn default() -> Self {
        Self {
            easy: default_easy_minutes(),
            medium: default_medium_minutes(),
            hard: default_hard_minutes(),
        }
    }
}

impl TimeTable {
    pub fn minutes_for(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }
}

/// Ranking weight per difficulty; lower weights rank earlier within a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyWeights {
    #[serde(default = "default_easy_weight")]
    pub easy: u32,
    #[serde(default = "default_medium_weight")]
    pub medium: u32,
    #[serde(default = "default_hard_weight")]
    pub hard: u32,
}

fn default_easy_weight() -> u32 {
    1
}
fn default_medium_weight() -> u32 {
    2
}
fn default_hard_weight() -> u32 {
    3
}

impl Default for DifficultyWeights {
    fn default() -> Self {
        Self {
            easy: default_easy_weight(),
            medium: default_medium_weight(),
            hard: default_hard_weight(),
        }
    }
}

impl DifficultyWeights {
    pub fn weight(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }
}

/// Where a learner stands on a single item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Completed,
    Skipped,
    Attempted,
    Pending,
}

impl ItemStatus {
    /// Completed and skipped items are never planned again.
    pub fn is_resolved(self) -> bool {
        matches!(self, ItemStatus::Completed | ItemStatus::Skipped)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemStatus::Completed => write!(f, "completed"),
            ItemStatus::Skipped => write!(f, "skipped"),
            ItemStatus::Attempted => write!(f, "attempted"),
            ItemStatus::Pending => write!(f, "pending"),
        }
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "completed" => Ok(ItemStatus::Completed),
            "skipped" => Ok(ItemStatus::Skipped),
            "attempted" => Ok(ItemStatus::Attempted),
            "pending" => Ok(ItemStatus::Pending),
            other => Err(format!("unknown item status: {other}")),
        }
    }
}

/// Per-learner item statuses, as reported by the performance store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutstandingState(BTreeMap<ItemId, ItemStatus>);

impl OutstandingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, item: impl Into<ItemId>, status: ItemStatus) -> Self {
        self.0.insert(item.into(), status);
        self
    }

    pub fn set(&mut self, item: ItemId, status: ItemStatus) {
        self.0.insert(item, status);
    }

    pub fn status_of(&self, item: &ItemId) -> Option<ItemStatus> {
        self.0.get(item).copied()
    }

    pub fn is_resolved(&self, item: &ItemId) -> bool {
        self.status_of(item).is_some_and(ItemStatus::is_resolved)
    }

    /// Items explicitly marked pending, in id order.
    pub fn pending(&self) -> impl Iterator<Item = &ItemId> {
        self.0
            .iter()
            .filter(|(_, status)| **status == ItemStatus::Pending)
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One allocated slot in a day of the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedItem {
    pub item_id: ItemId,
    pub allocated_minutes: u32,
}

/// Date → ordered items. Serialized as `{"YYYY-MM-DD": [...]}` in date order.
///
/// Only days with at least one allocated item are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan(BTreeMap<NaiveDate, Vec<PlannedItem>>);

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the items for `date`. Empty days are not stored.
    pub fn insert_day(&mut self, date: NaiveDate, items: Vec<PlannedItem>) {
        if !items.is_empty() {
            self.0.insert(date, items);
        }
    }

    pub fn day(&self, date: NaiveDate) -> Option<&[PlannedItem]> {
        self.0.get(&date).map(Vec::as_slice)
    }

    pub fn days(&self) -> impl Iterator<Item = (NaiveDate, &[PlannedItem])> {
        self.0.iter().map(|(date, items)| (*date, items.as_slice()))
    }

    /// Days on or after `date`.
    pub fn days_from(&self, date: NaiveDate) -> impl Iterator<Item = (NaiveDate, &[PlannedItem])> {
        self.0
            .range(date..)
            .map(|(date, items)| (*date, items.as_slice()))
    }

    pub fn minutes_on(&self, date: NaiveDate) -> u32 {
        self.day(date)
            .map(|items| items.iter().map(|i| i.allocated_minutes).sum())
            .unwrap_or(0)
    }

    pub fn item_ids(&self) -> impl Iterator<Item = &ItemId> {
        self.0.values().flatten().map(|p| &p.item_id)
    }

    pub fn contains(&self, item: &ItemId) -> bool {
        self.item_ids().any(|id| id == item)
    }

    pub fn day_count(&self) -> usize {
        self.0.len()
    }

    pub fn item_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A learner's persisted plan together with the inputs needed to re-derive it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPlan {
    pub learner_id: LearnerId,
    /// The "today" the plan was generated on.
    pub generated_on: NaiveDate,
    pub daily_budget_minutes: u32,
    pub horizon_end: NaiveDate,
    #[serde(default)]
    pub proficiency: ProficiencyMap,
    pub plan: Plan,
}
