//! Committed filter criteria and the debounced path from raw search input.

use std::{collections::BTreeMap, time::Duration};

use serde::Serialize;

/// Value a select emits for "no restriction".
pub const ALL_SENTINEL: &str = "all";

/// Immutable set of search/category/flag values applied to a resource list.
///
/// Every `with_*`/`without_*` call returns a new value; equality is by value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct FilterCriteria {
    search_text: String,
    categorical: BTreeMap<String, String>,
    flags: BTreeMap<String, bool>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn categorical(&self) -> &BTreeMap<String, String> {
        &self.categorical
    }

    pub fn category(&self, key: &str) -> Option<&str> {
        self.categorical.get(key).map(String::as_str)
    }

    pub fn flags(&self) -> &BTreeMap<String, bool> {
        &self.flags
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.flags.get(key).copied()
    }

    /// Stores the text trimmed, so surrounding whitespace is never a change.
    pub fn with_search(&self, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            search_text: text.trim().to_string(),
            ..self.clone()
        }
    }

    /// Sets `key` to `value`; an empty value or `"all"` removes the key.
    pub fn with_category(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        let mut categorical = self.categorical.clone();
        if value.trim().is_empty() || value == ALL_SENTINEL {
            categorical.remove(&key);
        } else {
            categorical.insert(key, value);
        }
        Self {
            categorical,
            ..self.clone()
        }
    }

    pub fn without_category(&self, key: &str) -> Self {
        let mut categorical = self.categorical.clone();
        categorical.remove(key);
        Self {
            categorical,
            ..self.clone()
        }
    }

    pub fn with_flag(&self, key: impl Into<String>, value: bool) -> Self {
        let mut flags = self.flags.clone();
        flags.insert(key.into(), value);
        Self {
            flags,
            ..self.clone()
        }
    }

    pub fn without_flag(&self, key: &str) -> Self {
        let mut flags = self.flags.clone();
        flags.remove(key);
        Self {
            flags,
            ..self.clone()
        }
    }

    /// Trimmed search text, `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        let trimmed = self.search_text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// Handle for one scheduled debounce commit. Only the most recently issued
/// ticket can commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTicket {
    generation: u64,
}

/// Holds the committed criteria plus at most one pending search edit.
#[derive(Debug, Clone)]
pub struct FilterStore {
    defaults: FilterCriteria,
    committed: FilterCriteria,
    pending_search: Option<String>,
    generation: u64,
    quiet_period: Duration,
}

impl FilterStore {
    pub fn new(defaults: FilterCriteria, quiet_period: Duration) -> Self {
        Self {
            committed: defaults.clone(),
            defaults,
            pending_search: None,
            generation: 0,
            quiet_period,
        }
    }

    pub fn committed(&self) -> &FilterCriteria {
        &self.committed
    }

    pub fn defaults(&self) -> &FilterCriteria {
        &self.defaults
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Raw text as last typed, pending or committed.
    pub fn raw_search(&self) -> &str {
        self.pending_search
            .as_deref()
            .unwrap_or(self.committed.search_text())
    }

    pub fn has_pending(&self) -> bool {
        self.pending_search.is_some()
    }

    /// Records a keystroke. Any earlier ticket is invalidated, which is how
    /// the quiet period restarts.
    pub fn set_raw_input(&mut self, value: impl Into<String>) -> DebounceTicket {
        self.generation += 1;
        self.pending_search = Some(value.into());
        DebounceTicket {
            generation: self.generation,
        }
    }

    /// Commits the pending search if `ticket` is still current. Returns the
    /// new criteria only when they differ from the committed ones.
    pub fn commit_pending(&mut self, ticket: DebounceTicket) -> Option<FilterCriteria> {
        if ticket.generation != self.generation {
            return None;
        }
        let text = self.pending_search.take()?;
        let next = self.committed.with_search(text);
        self.commit(next)
    }

    pub fn set_category(&mut self, key: &str, value: &str) -> Option<FilterCriteria> {
        let next = self.committed.with_category(key, value);
        self.commit(next)
    }

    pub fn set_flag(&mut self, key: &str, value: bool) -> Option<FilterCriteria> {
        let next = self.committed.with_flag(key, value);
        self.commit(next)
    }

    pub fn clear_flag(&mut self, key: &str) -> Option<FilterCriteria> {
        let next = self.committed.without_flag(key);
        self.commit(next)
    }

    /// Wholesale replacement (stat-card click, programmatic reset). Drops any
    /// pending search so a late timer cannot bring it back.
    pub fn replace(&mut self, criteria: FilterCriteria) -> Option<FilterCriteria> {
        self.drop_pending();
        self.commit(criteria)
    }

    pub fn clear(&mut self) -> Option<FilterCriteria> {
        let defaults = self.defaults.clone();
        self.replace(defaults)
    }

    fn drop_pending(&mut self) {
        self.generation += 1;
        self.pending_search = None;
    }

    fn commit(&mut self, next: FilterCriteria) -> Option<FilterCriteria> {
        if next == self.committed {
            return None;
        }
        self.committed = next.clone();
        Some(next)
    }
}

#[cfg(test)]
#[path = "tests/filters_tests.rs"]
mod tests;
