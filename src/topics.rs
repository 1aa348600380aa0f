use crate::storage::{self, KeyValueStore};

pub const DEFAULT_TOPICS: [&str; 3] = ["Trump", "Steelers", "AI"];

/// Ordered topic list plus the currently selected topic.
///
/// The selection is either empty or a member of the list after every
/// mutation. Duplicates are allowed and addressed by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicStore {
    topics: Vec<String>,
    selected: String,
}

impl TopicStore {
    pub fn new(topics: Vec<String>) -> Self {
        let selected = topics.first().cloned().unwrap_or_default();
        Self { topics, selected }
    }

    /// Load the persisted list, seeding `defaults` when nothing usable is stored.
    pub fn load(store: &dyn KeyValueStore, defaults: &[String]) -> Self {
        match storage::load_topics(store) {
            Some(topics) => Self::new(topics),
            None => {
                tracing::info!("seeding default topics");
                Self::new(defaults.to_vec())
            }
        }
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.topics.iter().position(|t| *t == self.selected)
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Append a trimmed name. Blank input is ignored; duplicates are not.
    pub fn add(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.topics.push(name.to_string());
        self.repair_selection();
        true
    }

    /// Replace the entry at `index` verbatim, without trimming or validation.
    pub fn rename(&mut self, index: usize, name: &str) -> bool {
        let Some(slot) = self.topics.get_mut(index) else {
            return false;
        };
        *slot = name.to_string();
        self.repair_selection();
        true
    }

    /// Delete the entry at `index`. Removing the selected topic clears the
    /// selection; the comparison uses the value before removal.
    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.topics.len() {
            return false;
        }
        let removed = self.topics.remove(index);
        if removed == self.selected {
            self.selected.clear();
        }
        self.repair_selection();
        true
    }

    /// Select a topic by value. Only members (or the empty string) are accepted.
    pub fn select(&mut self, topic: &str) -> bool {
        if topic.is_empty() || self.topics.iter().any(|t| t == topic) {
            self.selected = topic.to_string();
            true
        } else {
            false
        }
    }

    pub fn select_index(&mut self, index: usize) -> bool {
        match self.topics.get(index) {
            Some(topic) => {
                self.selected = topic.clone();
                true
            }
            None => false,
        }
    }

    /// Move the selection by `offset` positions, wrapping around the list.
    pub fn cycle(&mut self, offset: isize) {
        if self.topics.is_empty() {
            return;
        }
        let len = self.topics.len() as isize;
        let current = self.selected_index().map(|i| i as isize).unwrap_or(-1);
        let next = (current + offset).rem_euclid(len) as usize;
        self.selected = self.topics[next].clone();
    }

    /// A non-empty selection that is no longer listed falls back to the
    /// first topic (or empty if there are none).
    fn repair_selection(&mut self) {
        if self.selected.is_empty() || self.topics.contains(&self.selected) {
            return;
        }
        self.selected = self.topics.first().cloned().unwrap_or_default();
    }
}
