use async_trait::async_trait;
use serde_json::Value;
use shared::{
    domain::ResourceKind,
    protocol::{Donation, ListEnvelope},
};

use super::{detail_path, ResourceAdapter};
use crate::{
    error::{NetworkError, ValidationError},
    filters::FilterCriteria,
    mutation::{require_payload, MutationAction, MutationCall, MutationRequest},
    stats::{StatCard, StatsMap},
    transport::ApiTransport,
};

const LIST_PATH: &str = "/api/donations/";

/// Donation ledger. Amount totals ride on the list response's `meta`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DonationsAdapter;

fn meta_stats(meta: Option<&serde_json::Map<String, Value>>, count: u64) -> StatsMap {
    let mut stats = meta.map(StatsMap::from_json_object).unwrap_or_default();
    stats.insert("total", count as f64);
    stats
}

#[async_trait]
impl ResourceAdapter for DonationsAdapter {
    type Item = Donation;

    const KIND: ResourceKind = ResourceKind::Donations;

    fn list_path(&self) -> &'static str {
        LIST_PATH
    }

    fn embedded_stats(&self, envelope: &ListEnvelope<Donation>) -> Option<StatsMap> {
        envelope
            .meta
            .as_ref()
            .map(|meta| meta_stats(Some(meta), envelope.total_count()))
    }

    /// The unfiltered list carries the all-time totals in its `meta`.
    async fn fetch_global_stats(
        &self,
        transport: &dyn ApiTransport,
    ) -> Result<StatsMap, NetworkError> {
        let params = [
            ("page".to_string(), "1".to_string()),
            ("page_size".to_string(), "1".to_string()),
        ];
        let body = transport.get_json(LIST_PATH, &params).await?;
        let envelope: ListEnvelope<Value> = serde_json::from_value(body)?;
        Ok(meta_stats(envelope.meta.as_ref(), envelope.total_count()))
    }

    fn build_mutation(&self, request: &MutationRequest) -> Result<MutationCall, ValidationError> {
        match request.action {
            MutationAction::Update => Ok(MutationCall::patch(
                detail_path(LIST_PATH, request.resource_id),
                Value::Object(require_payload(request, Self::KIND)?.clone()),
            )),
            action => Err(ValidationError::UnsupportedAction {
                resource: Self::KIND,
                action,
            }),
        }
    }

    fn stat_cards(&self) -> Vec<StatCard> {
        let method = |key: &'static str, label: &'static str, value: &str| StatCard {
            key,
            label,
            stat_key: key,
            filters: FilterCriteria::new().with_category("payment_method", value),
        };
        vec![
            StatCard {
                key: "total_amount",
                label: "Total Donations",
                stat_key: "total_amount",
                filters: FilterCriteria::new(),
            },
            method("via_bank", "Bank Transfer", "bank_transfer"),
            method("via_jazzcash", "JazzCash", "jazzcash"),
            method("via_easypaisa", "Easypaisa", "easypaisa"),
        ]
    }
}
