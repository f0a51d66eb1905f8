//! Global and filtered aggregate counters behind the stat cards.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use shared::protocol::number_from_value;

use crate::{
    error::{NetworkError, TrackKind},
    filters::FilterCriteria,
    track::{SequenceSource, Track, TrackOutcome, TrackView},
};

/// Aggregate name to value, e.g. `pending -> 5` or `total_amount -> 1200.5`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsMap(BTreeMap<String, f64>);

impl StatsMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps numeric members (numbers or numeric strings) and drops the rest.
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        Self(
            object
                .iter()
                .filter_map(|(key, value)| number_from_value(value).map(|n| (key.clone(), n)))
                .collect(),
        )
    }

    pub fn from_json(value: &Value) -> Result<Self, NetworkError> {
        value
            .as_object()
            .map(Self::from_json_object)
            .ok_or_else(|| NetworkError::Decode(format!("expected a stats object, got {value}")))
    }

    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(key, value)| (key.as_str(), *value))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for StatsMap {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Where the filtered half of the stats comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilteredStatsSource {
    /// The adapter issues its own request(s) for the filtered subset.
    Endpoint,
    /// The list response carries the filtered aggregates.
    ListResponse,
}

/// A counter that is also a filter shortcut.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCard {
    pub key: &'static str,
    pub label: &'static str,
    pub stat_key: &'static str,
    pub filters: FilterCriteria,
}

/// What a card shows. `Placeholder` covers loading, failed and missing
/// values alike; the list is never blocked by it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum StatValue {
    Ready(f64),
    Placeholder,
}

impl StatValue {
    pub fn from_view(view: &TrackView<StatsMap>, key: &str) -> Self {
        if view.is_loading() && view.value.is_none() {
            return StatValue::Placeholder;
        }
        // a failed track keeps its last map but never shows it
        if view.error.is_some() {
            return StatValue::Placeholder;
        }
        view.value
            .as_ref()
            .and_then(|stats| stats.get(key))
            .map(StatValue::Ready)
            .unwrap_or(StatValue::Placeholder)
    }

    pub fn render(&self) -> String {
        match self {
            StatValue::Ready(value) if value.fract() == 0.0 => format!("{value:.0}"),
            StatValue::Ready(value) => format!("{value:.2}"),
            StatValue::Placeholder => "-".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCardView {
    pub key: &'static str,
    pub label: &'static str,
    pub global: StatValue,
    pub filtered: StatValue,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub global: TrackView<StatsMap>,
    pub filtered: TrackView<StatsMap>,
}

/// Two independent tracks with the same staleness rule as the list.
#[derive(Debug, Clone)]
pub struct StatsAggregator {
    global: Track<StatsMap>,
    filtered: Track<StatsMap>,
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self {
            global: Track::new(TrackKind::GlobalStats),
            filtered: Track::new(TrackKind::FilteredStats),
        }
    }

    pub fn global(&self) -> &Track<StatsMap> {
        &self.global
    }

    pub fn filtered(&self) -> &Track<StatsMap> {
        &self.filtered
    }

    pub fn issue_global(&mut self, sequences: &SequenceSource) -> u64 {
        let sequence = sequences.next();
        self.global.begin(sequence);
        sequence
    }

    pub fn issue_filtered(&mut self, sequences: &SequenceSource) -> u64 {
        let sequence = sequences.next();
        self.filtered.begin(sequence);
        sequence
    }

    /// Ties the filtered track to a list request whose response will carry
    /// the filtered aggregates.
    pub fn attach_filtered(&mut self, list_sequence: u64) {
        self.filtered.begin(list_sequence);
    }

    pub fn complete_global(
        &mut self,
        sequence: u64,
        result: Result<StatsMap, NetworkError>,
    ) -> TrackOutcome {
        self.global.complete(sequence, result)
    }

    pub fn complete_filtered(
        &mut self,
        sequence: u64,
        result: Result<StatsMap, NetworkError>,
    ) -> TrackOutcome {
        self.filtered.complete(sequence, result)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            global: self.global.view(),
            filtered: self.filtered.view(),
        }
    }

    pub fn card_views(&self, cards: &[StatCard], committed: &FilterCriteria) -> Vec<StatCardView> {
        let snapshot = self.snapshot();
        cards
            .iter()
            .map(|card| StatCardView {
                key: card.key,
                label: card.label,
                global: StatValue::from_view(&snapshot.global, card.stat_key),
                filtered: StatValue::from_view(&snapshot.filtered, card.stat_key),
                active: &card.filters == committed,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn stats_map_accepts_numeric_strings_and_skips_other_members() {
        let stats = StatsMap::from_json(&json!({
            "pending": 5,
            "total_amount": "1250.75",
            "transactions": [],
            "label": "n/a",
        }))
        .expect("object");
        assert_eq!(stats.get("pending"), Some(5.0));
        assert_eq!(stats.get("total_amount"), Some(1250.75));
        assert_eq!(stats.len(), 2);
    }

    #[test]
    fn non_object_stats_body_is_a_decode_error() {
        assert!(matches!(
            StatsMap::from_json(&json!([1, 2])),
            Err(NetworkError::Decode(_))
        ));
    }

    #[test]
    fn global_and_filtered_tracks_are_independent() {
        let sequences = SequenceSource::new();
        let mut stats = StatsAggregator::new();
        let global = stats.issue_global(&sequences);
        let filtered = stats.issue_filtered(&sequences);

        stats.complete_filtered(filtered, Err(NetworkError::Transport("down".into())));
        stats.complete_global(global, Ok(StatsMap::new().with("pending", 5.0)));

        let snapshot = stats.snapshot();
        assert_eq!(
            snapshot.global.value.as_ref().and_then(|s| s.get("pending")),
            Some(5.0)
        );
        assert!(snapshot.global.error.is_none());
        assert!(snapshot.filtered.error.is_some());
    }

    #[test]
    fn card_degrades_to_placeholder_when_its_track_failed() {
        let sequences = SequenceSource::new();
        let mut stats = StatsAggregator::new();
        let global = stats.issue_global(&sequences);
        stats.complete_global(global, Err(NetworkError::Transport("down".into())));

        let cards = [StatCard {
            key: "pending",
            label: "Pending",
            stat_key: "pending",
            filters: FilterCriteria::new().with_category("status", "pending"),
        }];
        let views = stats.card_views(&cards, &FilterCriteria::new());
        assert_eq!(views[0].global, StatValue::Placeholder);
        assert_eq!(views[0].global.render(), "-");
        assert!(!views[0].active);
    }

    #[test]
    fn attached_filtered_track_follows_list_sequence() {
        let sequences = SequenceSource::new();
        let mut stats = StatsAggregator::new();
        let list_sequence = sequences.next();
        stats.attach_filtered(list_sequence);
        assert!(stats
            .complete_filtered(list_sequence, Ok(StatsMap::new().with("total", 2.0)))
            .is_applied());
    }

    #[test]
    fn stat_value_rendering() {
        assert_eq!(StatValue::Ready(12.0).render(), "12");
        assert_eq!(StatValue::Ready(12.5).render(), "12.50");
    }
}
