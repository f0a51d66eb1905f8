//! Per-resource knowledge: endpoints, filter-to-parameter mapping, stats
//! sources, stat cards and mutation validation. The engine itself is generic
//! over [`ResourceAdapter`].

mod appeals;
mod donations;
mod users;
mod wallet;

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::{domain::ResourceKind, protocol::ListEnvelope};

use crate::{
    error::{NetworkError, ValidationError},
    filters::FilterCriteria,
    mutation::{MutationCall, MutationRequest},
    pagination::Pagination,
    query::{PageResponse, QueryRequest},
    stats::{FilteredStatsSource, StatCard, StatsMap},
    transport::ApiTransport,
};

pub use appeals::AppealsAdapter;
pub use donations::DonationsAdapter;
pub use users::UsersAdapter;
pub use wallet::WalletAdapter;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

pub type QueryParams = Vec<(String, String)>;

#[async_trait]
pub trait ResourceAdapter: Send + Sync + 'static {
    type Item: DeserializeOwned + Serialize + Clone + Send + Sync + 'static;

    const KIND: ResourceKind;

    fn list_path(&self) -> &'static str;

    /// Query parameter a categorical filter key is sent as.
    fn param_name<'a>(&self, key: &'a str) -> &'a str {
        key
    }

    fn query_params(&self, request: &QueryRequest) -> QueryParams {
        let mut params = vec![
            ("page".to_string(), request.page.to_string()),
            ("page_size".to_string(), request.page_size.to_string()),
        ];
        params.extend(self.filter_params(&request.filters));
        params
    }

    /// Search, categorical and flag parameters without paging.
    fn filter_params(&self, filters: &FilterCriteria) -> QueryParams {
        let mut params = QueryParams::new();
        if let Some(term) = filters.search_term() {
            params.push(("search".to_string(), term.to_string()));
        }
        for (key, value) in filters.categorical() {
            params.push((self.param_name(key).to_string(), value.clone()));
        }
        for (key, value) in filters.flags() {
            params.push((key.clone(), value.to_string()));
        }
        params
    }

    async fn fetch_page(
        &self,
        transport: &dyn ApiTransport,
        request: &QueryRequest,
    ) -> Result<PageResponse<Self::Item>, NetworkError> {
        let body = transport
            .get_json(self.list_path(), &self.query_params(request))
            .await?;
        self.decode_page(body)
    }

    fn decode_page(&self, body: Value) -> Result<PageResponse<Self::Item>, NetworkError> {
        let envelope: ListEnvelope<Self::Item> = serde_json::from_value(body)?;
        let filtered_stats = self.embedded_stats(&envelope);
        Ok(PageResponse {
            total_count: envelope.total_count(),
            items: envelope.results,
            filtered_stats,
        })
    }

    /// Aggregates a list response carries for its whole filtered set.
    fn embedded_stats(&self, envelope: &ListEnvelope<Self::Item>) -> Option<StatsMap> {
        envelope.filtered_stats.as_ref().map(StatsMap::from_json_object)
    }

    fn decode_item(&self, body: Value) -> Result<Self::Item, NetworkError> {
        Ok(serde_json::from_value(body)?)
    }

    fn filtered_stats_source(&self) -> FilteredStatsSource {
        FilteredStatsSource::ListResponse
    }

    async fn fetch_global_stats(
        &self,
        transport: &dyn ApiTransport,
    ) -> Result<StatsMap, NetworkError>;

    /// Standalone filtered-stats fetch. Adapters whose list carries the
    /// aggregates still answer this with a one-row list request.
    async fn fetch_filtered_stats(
        &self,
        transport: &dyn ApiTransport,
        filters: &FilterCriteria,
    ) -> Result<StatsMap, NetworkError> {
        let request = QueryRequest {
            filters: filters.clone(),
            page: 1,
            page_size: 1,
            sequence: 0,
        };
        let page = self.fetch_page(transport, &request).await?;
        Ok(filtered_stats_or_total(page.filtered_stats, page.total_count))
    }

    fn build_mutation(&self, request: &MutationRequest) -> Result<MutationCall, ValidationError> {
        Err(ValidationError::UnsupportedAction {
            resource: Self::KIND,
            action: request.action,
        })
    }

    fn default_filters(&self) -> FilterCriteria {
        FilterCriteria::new()
    }

    fn default_page_size(&self) -> u32 {
        DEFAULT_PAGE_SIZE
    }

    fn debounce(&self) -> Duration {
        DEFAULT_DEBOUNCE
    }

    fn stat_cards(&self) -> Vec<StatCard> {
        Vec::new()
    }
}

/// Embedded aggregates, or `{ total: count }` when the response had none.
pub fn filtered_stats_or_total(embedded: Option<StatsMap>, total_count: u64) -> StatsMap {
    embedded.unwrap_or_else(|| StatsMap::new().with("total", total_count as f64))
}

/// Number of rows matching `params`, read from a one-row list request.
pub(crate) async fn count_matching(
    transport: &dyn ApiTransport,
    path: &str,
    mut params: QueryParams,
) -> Result<u64, NetworkError> {
    params.push(("page".to_string(), "1".to_string()));
    params.push(("page_size".to_string(), "1".to_string()));
    let body = transport.get_json(path, &params).await?;
    let envelope: ListEnvelope<Value> = serde_json::from_value(body)?;
    Ok(envelope.total_count())
}

/// Page size an engine starts with: the configured override, else the
/// adapter's default.
pub fn initial_pagination<A: ResourceAdapter>(adapter: &A, page_size: Option<u32>) -> Pagination {
    Pagination::new(page_size.unwrap_or_else(|| adapter.default_page_size()))
}

pub(crate) fn detail_path(list_path: &str, id: impl std::fmt::Display) -> String {
    format!("{}/{id}/", list_path.trim_end_matches('/'))
}

#[cfg(test)]
#[path = "../tests/adapters_tests.rs"]
mod tests;
