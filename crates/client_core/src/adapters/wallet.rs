use async_trait::async_trait;
use shared::{domain::ResourceKind, protocol::WalletTransaction};

use super::ResourceAdapter;
use crate::{
    error::NetworkError,
    filters::FilterCriteria,
    query::QueryRequest,
    stats::{StatCard, StatsMap},
    transport::ApiTransport,
};

const LIST_PATH: &str = "/api/wallet/admin/transactions/";
const OVERVIEW_PATH: &str = "/api/wallet/admin/overview/";

/// Read-only transaction ledger. Only free-text search is supported and
/// every mutation falls through to `UnsupportedAction`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalletAdapter;

#[async_trait]
impl ResourceAdapter for WalletAdapter {
    type Item = WalletTransaction;

    const KIND: ResourceKind = ResourceKind::WalletTransactions;

    fn list_path(&self) -> &'static str {
        LIST_PATH
    }

    fn query_params(&self, request: &QueryRequest) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), request.page.to_string()),
            ("page_size".to_string(), request.page_size.to_string()),
        ];
        if let Some(term) = request.filters.search_term() {
            params.push(("search".to_string(), term.to_string()));
        }
        params
    }

    async fn fetch_global_stats(
        &self,
        transport: &dyn ApiTransport,
    ) -> Result<StatsMap, NetworkError> {
        let body = transport.get_json(OVERVIEW_PATH, &[]).await?;
        StatsMap::from_json(&body)
    }

    fn stat_cards(&self) -> Vec<StatCard> {
        [
            ("total_transactions", "Transactions"),
            ("total_credits", "Credits"),
            ("total_debits", "Debits"),
            ("total_balance", "Wallet Balance"),
        ]
        .into_iter()
        .map(|(key, label)| StatCard {
            key,
            label,
            stat_key: key,
            filters: FilterCriteria::new(),
        })
        .collect()
    }
}
