//! One engine instance drives one resource screen: committed filters, the
//! current page, the list track and both stats tracks.
//!
//! Every trigger follows the same two phases. Requests are issued under the
//! state lock, which stamps sequence numbers and captures the filters and page
//! by value. The lock is then released and the requests run concurrently;
//! each completion re-takes the lock only to apply or discard its result.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use shared::domain::{ResourceId, ResourceKind};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    adapters::{filtered_stats_or_total, initial_pagination, ResourceAdapter},
    config::EngineSettings,
    error::{MutationError, NetworkError, StaleResponseDiscarded, TrackKind, UnknownStatCard},
    filters::{DebounceTicket, FilterCriteria, FilterStore},
    mutation::{dispatch, MutationAction, MutationRequest},
    pagination::Pagination,
    query::{PageResponse, QueryCoordinator, QueryRequest},
    stats::{FilteredStatsSource, StatCard, StatCardView, StatsAggregator, StatsSnapshot},
    track::{SequenceSource, TrackOutcome, TrackStatus},
    transport::ApiTransport,
};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub enum EngineEvent {
    FiltersCommitted(FilterCriteria),
    PageChanged {
        page: u32,
    },
    TrackApplied {
        track: TrackKind,
        sequence: u64,
    },
    TrackFailed {
        track: TrackKind,
        sequence: u64,
        error: NetworkError,
    },
    ResponseDiscarded(StaleResponseDiscarded),
    MutationSucceeded {
        id: ResourceId,
        action: MutationAction,
    },
    MutationFailed {
        id: ResourceId,
        action: MutationAction,
        error: MutationError,
    },
    ModalChanged(Option<ResourceId>),
}

/// Outcome of every track a trigger refetched, in completion order per
/// trigger round. Empty when nothing changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshReport {
    pub outcomes: Vec<(TrackKind, TrackOutcome)>,
}

impl RefreshReport {
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Last outcome recorded for `track`.
    pub fn outcome(&self, track: TrackKind) -> Option<&TrackOutcome> {
        self.outcomes
            .iter()
            .rev()
            .find(|(kind, _)| *kind == track)
            .map(|(_, outcome)| outcome)
    }

    pub fn list(&self) -> Option<&TrackOutcome> {
        self.outcome(TrackKind::List)
    }

    pub fn global_stats(&self) -> Option<&TrackOutcome> {
        self.outcome(TrackKind::GlobalStats)
    }

    pub fn filtered_stats(&self) -> Option<&TrackOutcome> {
        self.outcome(TrackKind::FilteredStats)
    }

    fn extend(&mut self, outcomes: impl IntoIterator<Item = (TrackKind, TrackOutcome)>) {
        self.outcomes.extend(outcomes);
    }
}

#[derive(Debug, Clone)]
pub struct MutationOutcome<T> {
    /// Record echoed by the backend; `None` when the body was not one.
    pub updated: Option<T>,
    pub refresh: RefreshReport,
}

/// Everything a screen renders, copied out of the engine.
#[derive(Debug, Clone, Serialize)]
pub struct ViewSnapshot<T> {
    pub resource: ResourceKind,
    pub filters: FilterCriteria,
    pub search_input: String,
    pub pagination: Pagination,
    pub total_pages: u32,
    pub visible_range: Option<(u64, u64)>,
    pub items: Vec<T>,
    pub list_status: TrackStatus,
    pub list_error: Option<String>,
    pub stats: StatsSnapshot,
    pub cards: Vec<StatCardView>,
    pub open_modal: Option<ResourceId>,
}

#[derive(Debug, Clone, Copy)]
struct RefreshPlan {
    list: bool,
    global: bool,
    filtered: bool,
}

impl RefreshPlan {
    const ALL: Self = Self {
        list: true,
        global: true,
        filtered: true,
    };
    const FILTERS: Self = Self {
        list: true,
        global: false,
        filtered: true,
    };
    const PAGE: Self = Self {
        list: true,
        global: false,
        filtered: false,
    };
}

struct IssuedRequests {
    list: Option<QueryRequest>,
    /// The filtered track completes from the list response.
    attached: bool,
    global: Option<u64>,
    filtered: Option<(u64, FilterCriteria)>,
}

struct EngineState<T> {
    filters: FilterStore,
    pagination: Pagination,
    list: QueryCoordinator<T>,
    stats: StatsAggregator,
    open_modal: Option<ResourceId>,
}

pub struct QueryEngine<A: ResourceAdapter> {
    adapter: A,
    transport: Arc<dyn ApiTransport>,
    cards: Vec<StatCard>,
    sequences: SequenceSource,
    inner: Mutex<EngineState<A::Item>>,
    events: broadcast::Sender<EngineEvent>,
}

impl<A: ResourceAdapter> QueryEngine<A> {
    pub fn new(adapter: A, transport: Arc<dyn ApiTransport>, settings: &EngineSettings) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let quiet_period = settings
            .debounce_override()
            .unwrap_or_else(|| adapter.debounce());
        let state = EngineState {
            filters: FilterStore::new(adapter.default_filters(), quiet_period),
            pagination: initial_pagination(&adapter, settings.page_size),
            list: QueryCoordinator::new(),
            stats: StatsAggregator::new(),
            open_modal: None,
        };
        Arc::new(Self {
            cards: adapter.stat_cards(),
            adapter,
            transport,
            sequences: SequenceSource::new(),
            inner: Mutex::new(state),
            events,
        })
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn stat_cards(&self) -> &[StatCard] {
        &self.cards
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Initial load: list, global stats and filtered stats together.
    pub async fn mount(&self) -> RefreshReport {
        info!(resource = %A::KIND, "mounting resource screen");
        self.refresh(RefreshPlan::ALL).await
    }

    /// Explicit reload of all three tracks. This is the only recovery path
    /// after a failure; nothing retries on its own.
    pub async fn reload(&self) -> RefreshReport {
        self.refresh(RefreshPlan::ALL).await
    }

    /// Records a keystroke and schedules its commit after the quiet period.
    /// A later keystroke supersedes the scheduled commit.
    pub async fn set_search_input(self: &Arc<Self>, text: impl Into<String>) -> DebounceTicket {
        let (ticket, quiet_period) = {
            let mut state = self.inner.lock().await;
            let ticket = state.filters.set_raw_input(text);
            (ticket, state.filters.quiet_period())
        };

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            engine.commit_search(ticket).await;
        });
        ticket
    }

    /// Commits the pending search text if `ticket` is still the latest one.
    pub async fn commit_search(&self, ticket: DebounceTicket) -> RefreshReport {
        self.change_filters(|filters| filters.commit_pending(ticket), false)
            .await
    }

    pub async fn set_category(&self, key: &str, value: &str) -> RefreshReport {
        self.change_filters(|filters| filters.set_category(key, value), false)
            .await
    }

    pub async fn set_flag(&self, key: &str, value: bool) -> RefreshReport {
        self.change_filters(|filters| filters.set_flag(key, value), false)
            .await
    }

    pub async fn clear_flag(&self, key: &str) -> RefreshReport {
        self.change_filters(|filters| filters.clear_flag(key), false)
            .await
    }

    /// Back to the default criteria and page 1, with no quiet period.
    pub async fn clear_filters(&self) -> RefreshReport {
        self.change_filters(FilterStore::clear, true).await
    }

    pub async fn replace_filters(&self, criteria: FilterCriteria) -> RefreshReport {
        self.change_filters(|filters| filters.replace(criteria), true)
            .await
    }

    pub async fn select_stat_card(&self, key: &str) -> Result<RefreshReport, UnknownStatCard> {
        let card = self
            .cards
            .iter()
            .find(|card| card.key == key)
            .ok_or_else(|| UnknownStatCard(key.to_string()))?;
        Ok(self.replace_filters(card.filters.clone()).await)
    }

    pub async fn go_to_page(&self, page: u32) -> RefreshReport {
        self.change_page(|pagination| pagination.go_to(page)).await
    }

    pub async fn next_page(&self) -> RefreshReport {
        self.change_page(Pagination::next).await
    }

    pub async fn previous_page(&self) -> RefreshReport {
        self.change_page(Pagination::previous).await
    }

    pub async fn set_page_size(&self, page_size: u32) -> RefreshReport {
        self.change_page(|pagination| pagination.set_page_size(page_size))
            .await
    }

    /// Sends one mutation. Nothing local changes unless the backend accepts
    /// it; then the modal bound to `id` closes and all three tracks refetch
    /// at the current filters and page.
    pub async fn mutate(
        &self,
        id: impl Into<ResourceId>,
        action: MutationAction,
        payload: Option<Map<String, Value>>,
    ) -> Result<MutationOutcome<A::Item>, MutationError> {
        let id = id.into();
        let mut request = MutationRequest::new(id, action);
        request.payload = payload;

        let updated = match dispatch(&self.adapter, self.transport.as_ref(), &request).await {
            Ok(updated) => updated,
            Err(error) => {
                self.emit(EngineEvent::MutationFailed {
                    id,
                    action,
                    error: error.clone(),
                });
                return Err(error);
            }
        };

        {
            let mut state = self.inner.lock().await;
            if state.open_modal == Some(id) {
                state.open_modal = None;
                self.emit(EngineEvent::ModalChanged(None));
            }
        }
        self.emit(EngineEvent::MutationSucceeded { id, action });

        let refresh = self.refresh(RefreshPlan::ALL).await;
        Ok(MutationOutcome { updated, refresh })
    }

    pub async fn open_modal(&self, id: impl Into<ResourceId>) {
        let id = id.into();
        self.inner.lock().await.open_modal = Some(id);
        self.emit(EngineEvent::ModalChanged(Some(id)));
    }

    pub async fn close_modal(&self) {
        let previous = self.inner.lock().await.open_modal.take();
        if previous.is_some() {
            self.emit(EngineEvent::ModalChanged(None));
        }
    }

    pub async fn committed_filters(&self) -> FilterCriteria {
        self.inner.lock().await.filters.committed().clone()
    }

    pub async fn pagination(&self) -> Pagination {
        self.inner.lock().await.pagination
    }

    pub async fn snapshot(&self) -> ViewSnapshot<A::Item> {
        let state = self.inner.lock().await;
        let list = state.list.track();
        ViewSnapshot {
            resource: A::KIND,
            filters: state.filters.committed().clone(),
            search_input: state.filters.raw_search().to_string(),
            pagination: state.pagination,
            total_pages: state.pagination.total_pages(),
            visible_range: state.pagination.visible_range(),
            items: state.list.items().to_vec(),
            list_status: list.status(),
            list_error: list.error().map(ToString::to_string),
            stats: state.stats.snapshot(),
            cards: state
                .stats
                .card_views(&self.cards, state.filters.committed()),
            open_modal: state.open_modal,
        }
    }

    async fn change_filters<F>(&self, change: F, always_reset_page: bool) -> RefreshReport
    where
        F: FnOnce(&mut FilterStore) -> Option<FilterCriteria> + Send,
    {
        let (committed, page_moved) = {
            let mut state = self.inner.lock().await;
            let committed = change(&mut state.filters);
            let page_moved = if committed.is_some() || always_reset_page {
                state.pagination.reset()
            } else {
                false
            };
            (committed, page_moved)
        };

        if page_moved {
            self.emit(EngineEvent::PageChanged { page: 1 });
        }
        match committed {
            Some(filters) => {
                info!(
                    resource = %A::KIND,
                    search = filters.search_text(),
                    categories = filters.categorical().len(),
                    flags = filters.flags().len(),
                    "filters committed"
                );
                self.emit(EngineEvent::FiltersCommitted(filters));
                self.refresh(RefreshPlan::FILTERS).await
            }
            None if page_moved => self.refresh(RefreshPlan::PAGE).await,
            None => RefreshReport::default(),
        }
    }

    async fn change_page<F>(&self, change: F) -> RefreshReport
    where
        F: FnOnce(&mut Pagination) -> bool + Send,
    {
        let page = {
            let mut state = self.inner.lock().await;
            change(&mut state.pagination).then_some(state.pagination.page())
        };
        match page {
            Some(page) => {
                self.emit(EngineEvent::PageChanged { page });
                self.refresh(RefreshPlan::PAGE).await
            }
            None => RefreshReport::default(),
        }
    }

    async fn refresh(&self, mut plan: RefreshPlan) -> RefreshReport {
        let mut report = RefreshReport::default();
        loop {
            let IssuedRequests {
                list,
                attached,
                global,
                filtered,
            } = self.issue(plan).await;

            let list_task = async {
                match list {
                    Some(request) => {
                        let result = self
                            .adapter
                            .fetch_page(self.transport.as_ref(), &request)
                            .await;
                        self.complete_list(request.sequence, attached, result).await
                    }
                    None => (Vec::new(), false),
                }
            };
            let global_task = async {
                let sequence = global?;
                let result = self
                    .adapter
                    .fetch_global_stats(self.transport.as_ref())
                    .await;
                let outcome = self
                    .inner
                    .lock()
                    .await
                    .stats
                    .complete_global(sequence, result);
                self.record(TrackKind::GlobalStats, &outcome);
                Some(outcome)
            };
            let filtered_task = async {
                let (sequence, filters) = filtered?;
                let result = self
                    .adapter
                    .fetch_filtered_stats(self.transport.as_ref(), &filters)
                    .await;
                let outcome = self
                    .inner
                    .lock()
                    .await
                    .stats
                    .complete_filtered(sequence, result);
                self.record(TrackKind::FilteredStats, &outcome);
                Some(outcome)
            };

            let ((list_outcomes, page_reset), global, filtered) =
                futures::join!(list_task, global_task, filtered_task);
            report.extend(list_outcomes);
            report.extend(global.map(|outcome| (TrackKind::GlobalStats, outcome)));
            report.extend(filtered.map(|outcome| (TrackKind::FilteredStats, outcome)));

            if !page_reset {
                return report;
            }
            plan = RefreshPlan::PAGE;
        }
    }

    async fn issue(&self, plan: RefreshPlan) -> IssuedRequests {
        let mut guard = self.inner.lock().await;
        let state = &mut *guard;
        let mut issued = IssuedRequests {
            list: None,
            attached: false,
            global: None,
            filtered: None,
        };

        if plan.list {
            let request =
                state
                    .list
                    .issue(&self.sequences, state.filters.committed(), &state.pagination);
            debug!(
                resource = %A::KIND,
                sequence = request.sequence,
                page = request.page,
                page_size = request.page_size,
                "list request issued"
            );
            if plan.filtered
                && self.adapter.filtered_stats_source() == FilteredStatsSource::ListResponse
            {
                state.stats.attach_filtered(request.sequence);
                issued.attached = true;
            }
            issued.list = Some(request);
        }
        if plan.global {
            let sequence = state.stats.issue_global(&self.sequences);
            debug!(resource = %A::KIND, sequence, "global stats request issued");
            issued.global = Some(sequence);
        }
        if plan.filtered && !issued.attached {
            let sequence = state.stats.issue_filtered(&self.sequences);
            debug!(resource = %A::KIND, sequence, "filtered stats request issued");
            issued.filtered = Some((sequence, state.filters.committed().clone()));
        }
        issued
    }

    /// Applies a list response, plus the filtered stats it carries when the
    /// filtered track was attached to it. Returns whether the new total
    /// pushed the page back to 1.
    async fn complete_list(
        &self,
        sequence: u64,
        attached: bool,
        result: Result<PageResponse<A::Item>, NetworkError>,
    ) -> (Vec<(TrackKind, TrackOutcome)>, bool) {
        let mut outcomes = Vec::with_capacity(2);
        let mut state = self.inner.lock().await;

        let embedded = attached.then(|| match &result {
            Ok(page) => Ok(filtered_stats_or_total(
                page.filtered_stats.clone(),
                page.total_count,
            )),
            Err(error) => Err(error.clone()),
        });
        let total_count = result.as_ref().ok().map(|page| page.total_count);

        let outcome = state.list.complete(sequence, result);
        let mut page_reset = false;
        if let (true, Some(total_count)) = (outcome.is_applied(), total_count) {
            page_reset = state.pagination.set_total_count(total_count);
        }
        self.record(TrackKind::List, &outcome);
        outcomes.push((TrackKind::List, outcome));

        if let Some(stats) = embedded {
            let outcome = state.stats.complete_filtered(sequence, stats);
            self.record(TrackKind::FilteredStats, &outcome);
            outcomes.push((TrackKind::FilteredStats, outcome));
        }
        drop(state);

        if page_reset {
            info!(
                resource = %A::KIND,
                sequence,
                "current page no longer exists, returning to page 1"
            );
            self.emit(EngineEvent::PageChanged { page: 1 });
        }
        (outcomes, page_reset)
    }

    fn record(&self, track: TrackKind, outcome: &TrackOutcome) {
        let event = match outcome {
            TrackOutcome::Applied { sequence } => {
                debug!(resource = %A::KIND, %track, sequence, "response applied");
                EngineEvent::TrackApplied {
                    track,
                    sequence: *sequence,
                }
            }
            TrackOutcome::Discarded(stale) => {
                debug!(
                    resource = %A::KIND,
                    %track,
                    sequence = stale.sequence,
                    latest = stale.latest,
                    "stale response discarded"
                );
                EngineEvent::ResponseDiscarded(*stale)
            }
            TrackOutcome::Failed { sequence, error } => {
                warn!(resource = %A::KIND, %track, sequence, %error, "request failed");
                EngineEvent::TrackFailed {
                    track,
                    sequence: *sequence,
                    error: error.clone(),
                }
            }
        };
        self.emit(event);
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
