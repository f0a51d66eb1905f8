use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use shared::{domain::ResourceKind, protocol::Appeal};

use super::{detail_path, ResourceAdapter};
use crate::{
    error::{NetworkError, ValidationError},
    filters::FilterCriteria,
    mutation::{require_payload, MutationAction, MutationCall, MutationRequest},
    stats::{StatCard, StatsMap},
    transport::ApiTransport,
};

const LIST_PATH: &str = "/api/appeals/";
const STATS_PATH: &str = "/api/appeals/stats/";

/// Appeal review screen. The list response embeds `filtered_stats`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppealsAdapter;

#[async_trait]
impl ResourceAdapter for AppealsAdapter {
    type Item = Appeal;

    const KIND: ResourceKind = ResourceKind::Appeals;

    fn list_path(&self) -> &'static str {
        LIST_PATH
    }

    fn param_name<'a>(&self, key: &'a str) -> &'a str {
        match key {
            "type" => "category",
            other => other,
        }
    }

    async fn fetch_global_stats(
        &self,
        transport: &dyn ApiTransport,
    ) -> Result<StatsMap, NetworkError> {
        let body = transport.get_json(STATS_PATH, &[]).await?;
        StatsMap::from_json(&body)
    }

    fn build_mutation(&self, request: &MutationRequest) -> Result<MutationCall, ValidationError> {
        let path = detail_path(LIST_PATH, request.resource_id);
        let body = match request.action {
            MutationAction::Approve => json!({ "status": "approved" }),
            MutationAction::Cancel => json!({ "status": "cancelled" }),
            MutationAction::Reject => {
                let reason = request
                    .payload_str("reason")
                    .or_else(|| request.payload_str("rejection_reason"))
                    .map(str::trim)
                    .filter(|reason| !reason.is_empty());
                match reason {
                    Some(reason) => json!({ "status": "rejected", "rejection_reason": reason }),
                    None => json!({ "status": "rejected" }),
                }
            }
            MutationAction::Update => Value::Object(require_payload(request, Self::KIND)?.clone()),
            action => {
                return Err(ValidationError::UnsupportedAction {
                    resource: Self::KIND,
                    action,
                })
            }
        };
        Ok(MutationCall::patch(path, body))
    }

    fn default_page_size(&self) -> u32 {
        25
    }

    fn debounce(&self) -> Duration {
        Duration::from_millis(500)
    }

    fn stat_cards(&self) -> Vec<StatCard> {
        let status = |key: &'static str, label: &'static str| StatCard {
            key,
            label,
            stat_key: key,
            filters: FilterCriteria::new().with_category("status", key),
        };
        vec![
            StatCard {
                key: "total",
                label: "Total Appeals",
                stat_key: "total",
                filters: FilterCriteria::new(),
            },
            status("pending", "Pending"),
            status("approved", "Approved"),
            status("rejected", "Rejected"),
            status("fulfilled", "Fulfilled"),
        ]
    }
}
