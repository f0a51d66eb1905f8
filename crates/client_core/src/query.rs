//! Paginated list track.

use serde::Serialize;

use crate::{
    error::{NetworkError, TrackKind},
    filters::FilterCriteria,
    pagination::Pagination,
    stats::StatsMap,
    track::{SequenceSource, Track, TrackOutcome, TrackView},
};

/// Immutable snapshot of what one list fetch asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRequest {
    pub filters: FilterCriteria,
    pub page: u32,
    pub page_size: u32,
    pub sequence: u64,
}

/// Decoded list page as returned by an adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    /// Aggregates for the whole filtered set, when the endpoint embeds them.
    pub filtered_stats: Option<StatsMap>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub sequence: u64,
}

#[derive(Debug, Clone)]
pub struct QueryCoordinator<T> {
    track: Track<QueryResult<T>>,
}

impl<T> Default for QueryCoordinator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> QueryCoordinator<T> {
    pub fn new() -> Self {
        Self {
            track: Track::new(TrackKind::List),
        }
    }

    /// Stamps a request with the next sequence number and marks the track
    /// loading. Filters and page are captured by value.
    pub fn issue(
        &mut self,
        sequences: &SequenceSource,
        filters: &FilterCriteria,
        pagination: &Pagination,
    ) -> QueryRequest {
        let sequence = sequences.next();
        self.track.begin(sequence);
        QueryRequest {
            filters: filters.clone(),
            page: pagination.page(),
            page_size: pagination.page_size(),
            sequence,
        }
    }

    pub fn complete(
        &mut self,
        sequence: u64,
        result: Result<PageResponse<T>, NetworkError>,
    ) -> TrackOutcome {
        let result = result.map(|page| QueryResult {
            items: page.items,
            total_count: page.total_count,
            sequence,
        });
        self.track.complete(sequence, result)
    }

    pub fn track(&self) -> &Track<QueryResult<T>> {
        &self.track
    }

    pub fn items(&self) -> &[T] {
        self.track
            .value()
            .map(|result| result.items.as_slice())
            .unwrap_or(&[])
    }

    /// Total of the last applied result; `None` before the first one.
    pub fn total_count(&self) -> Option<u64> {
        self.track.value().map(|result| result.total_count)
    }

    pub fn is_loading(&self) -> bool {
        self.track.is_loading()
    }

    pub fn error(&self) -> Option<&NetworkError> {
        self.track.error()
    }
}

impl<T: Clone> QueryCoordinator<T> {
    pub fn view(&self) -> TrackView<QueryResult<T>> {
        self.track.view()
    }
}
