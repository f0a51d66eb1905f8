//! Sequence-numbered request tracks.
//!
//! Every fetch is stamped with a number from the engine's [`SequenceSource`]
//! before it leaves. A track only applies a completion whose number equals
//! the latest one it issued; anything older resolved late and is discarded.
//! In-flight requests are never aborted.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use serde::Serialize;

use crate::error::{NetworkError, StaleResponseDiscarded, TrackKind};

/// Monotonic counter shared by all tracks of one engine.
#[derive(Debug, Clone, Default)]
pub struct SequenceSource(Arc<AtomicU64>);

impl SequenceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn last_issued(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackOutcome {
    Applied { sequence: u64 },
    Discarded(StaleResponseDiscarded),
    Failed { sequence: u64, error: NetworkError },
}

impl TrackOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, TrackOutcome::Applied { .. })
    }

    pub fn is_discarded(&self) -> bool {
        matches!(self, TrackOutcome::Discarded(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TrackOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackStatus {
    Idle,
    Loading,
}

#[derive(Debug, Clone)]
pub struct Track<T> {
    kind: TrackKind,
    latest_issued: u64,
    status: TrackStatus,
    value: Option<T>,
    error: Option<NetworkError>,
}

impl<T> Track<T> {
    pub fn new(kind: TrackKind) -> Self {
        Self {
            kind,
            latest_issued: 0,
            status: TrackStatus::Idle,
            value: None,
            error: None,
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn latest_issued(&self) -> u64 {
        self.latest_issued
    }

    pub fn status(&self) -> TrackStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == TrackStatus::Loading
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn error(&self) -> Option<&NetworkError> {
        self.error.as_ref()
    }

    /// Starts a new cycle. A cycle still in flight is superseded, not
    /// cancelled.
    pub fn begin(&mut self, sequence: u64) {
        self.latest_issued = self.latest_issued.max(sequence);
        self.status = TrackStatus::Loading;
    }

    /// Applies a completion if it belongs to the latest cycle. On failure the
    /// last good value stays in place next to the error.
    pub fn complete(&mut self, sequence: u64, result: Result<T, NetworkError>) -> TrackOutcome {
        if sequence != self.latest_issued {
            return TrackOutcome::Discarded(StaleResponseDiscarded {
                track: self.kind,
                sequence,
                latest: self.latest_issued,
            });
        }

        self.status = TrackStatus::Idle;
        match result {
            Ok(value) => {
                self.value = Some(value);
                self.error = None;
                TrackOutcome::Applied { sequence }
            }
            Err(error) => {
                self.error = Some(error.clone());
                TrackOutcome::Failed { sequence, error }
            }
        }
    }
}

impl<T: Clone> Track<T> {
    pub fn view(&self) -> TrackView<T> {
        TrackView {
            value: self.value.clone(),
            status: self.status,
            error: self.error.as_ref().map(ToString::to_string),
        }
    }
}

/// Read-only copy of a track for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackView<T> {
    pub value: Option<T>,
    pub status: TrackStatus,
    pub error: Option<String>,
}

impl<T> TrackView<T> {
    pub fn is_loading(&self) -> bool {
        self.status == TrackStatus::Loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_source_is_shared_between_clones() {
        let source = SequenceSource::new();
        let other = source.clone();
        assert_eq!(source.next(), 1);
        assert_eq!(other.next(), 2);
        assert_eq!(source.last_issued(), 2);
    }

    #[test]
    fn older_completion_is_discarded_after_newer_applies() {
        let mut track = Track::new(TrackKind::List);
        track.begin(1);
        track.begin(2);

        assert!(track.complete(2, Ok("second")).is_applied());
        let outcome = track.complete(1, Ok("first"));

        assert_eq!(
            outcome,
            TrackOutcome::Discarded(StaleResponseDiscarded {
                track: TrackKind::List,
                sequence: 1,
                latest: 2,
            })
        );
        assert_eq!(track.value(), Some(&"second"));
        assert_eq!(track.status(), TrackStatus::Idle);
    }

    #[test]
    fn older_completion_arriving_first_keeps_track_loading() {
        let mut track = Track::new(TrackKind::GlobalStats);
        track.begin(3);
        track.begin(7);
        assert!(track.complete(3, Ok(1)).is_discarded());
        assert!(track.is_loading());
        assert_eq!(track.value(), None);
    }

    #[test]
    fn stale_failure_is_never_surfaced() {
        let mut track: Track<u32> = Track::new(TrackKind::FilteredStats);
        track.begin(1);
        track.begin(2);
        let outcome = track.complete(1, Err(NetworkError::Transport("reset".into())));
        assert!(outcome.is_discarded());
        assert_eq!(track.error(), None);
    }

    #[test]
    fn failure_preserves_last_good_value() {
        let mut track = Track::new(TrackKind::List);
        track.begin(1);
        track.complete(1, Ok(vec![1, 2, 3]));
        track.begin(2);
        let outcome = track.complete(
            2,
            Err(NetworkError::Status {
                status: 502,
                message: "bad gateway".into(),
            }),
        );

        assert!(outcome.is_failed());
        assert_eq!(track.value(), Some(&vec![1, 2, 3]));
        assert_eq!(track.error().and_then(NetworkError::status), Some(502));

        track.begin(3);
        track.complete(3, Ok(vec![4]));
        assert_eq!(track.error(), None);
    }
}
