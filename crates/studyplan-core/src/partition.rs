//! Grouping of ranked items into per-topic FIFO queues.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::model::Item;

/// Items of a single topic, in ranked order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicQueue {
    pub topic: String,
    items: VecDeque<Item>,
}

impl TopicQueue {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            items: VecDeque::new(),
        }
    }

    pub fn push(&mut self, item: Item) {
        self.items.push_back(item);
    }

    pub fn front(&self) -> Option<&Item> {
        self.items.front()
    }

    pub fn pop_front(&mut self) -> Option<Item> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }
}

/// Split ranked items into one queue per topic.
///
/// Queues come out in first-seen topic order, and each queue keeps the
/// relative order its items had in `items`.
pub fn partition(items: Vec<Item>) -> Vec<TopicQueue> {
    let mut queues: Vec<TopicQueue> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in items {
        let slot = match index.get(&item.topic) {
            Some(&slot) => slot,
            None => {
                index.insert(item.topic.clone(), queues.len());
                queues.push(TopicQueue::new(item.topic.clone()));
                queues.len() - 1
            }
        };
        queues[slot].push(item);
    }

    queues
}

/// Distinct topics in first-seen order.
pub fn topics(items: &[Item]) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(item.topic.as_str()))
        .map(|item| item.topic.clone())
        .collect()
}
