use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::{json, Map, Value};
use shared::{
    domain::{ResourceKind, UserRole},
    protocol::UserAccount,
};

use super::{count_matching, detail_path, QueryParams, ResourceAdapter};
use crate::{
    error::{NetworkError, ValidationError},
    filters::FilterCriteria,
    mutation::{require_payload, MutationAction, MutationCall, MutationRequest},
    stats::{FilteredStatsSource, StatCard, StatsMap},
    transport::ApiTransport,
};

const LIST_PATH: &str = "/api/users/";
const ROLE_KEY: &str = "role";

/// Roles that get their own counter; `None` counts everyone.
const COUNTED_ROLES: [(&str, Option<UserRole>); 4] = [
    ("all", None),
    ("donor", Some(UserRole::Donor)),
    ("recipient", Some(UserRole::Recipient)),
    ("shura", Some(UserRole::Shura)),
];

const CONFLICTING_ROLES: [(UserRole, UserRole); 2] = [
    (UserRole::Admin, UserRole::Recipient),
    (UserRole::Shura, UserRole::Recipient),
];

/// User administration. Counters are per-role list counts, so both stats
/// tracks issue their own requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsersAdapter;

impl UsersAdapter {
    async fn role_counts(
        &self,
        transport: &dyn ApiTransport,
        base: QueryParams,
    ) -> Result<StatsMap, NetworkError> {
        let requests = COUNTED_ROLES.into_iter().map(|(key, role)| {
            let mut params = base.clone();
            if let Some(role) = role {
                params.push((ROLE_KEY.to_string(), role.as_str().to_string()));
            }
            async move {
                count_matching(transport, LIST_PATH, params)
                    .await
                    .map(|count| (key, count as f64))
            }
        });
        Ok(try_join_all(requests).await?.into_iter().collect())
    }
}

#[async_trait]
impl ResourceAdapter for UsersAdapter {
    type Item = UserAccount;

    const KIND: ResourceKind = ResourceKind::Users;

    fn list_path(&self) -> &'static str {
        LIST_PATH
    }

    fn filtered_stats_source(&self) -> FilteredStatsSource {
        FilteredStatsSource::Endpoint
    }

    async fn fetch_global_stats(
        &self,
        transport: &dyn ApiTransport,
    ) -> Result<StatsMap, NetworkError> {
        self.role_counts(transport, QueryParams::new()).await
    }

    /// Per-role counts under the current search and flags. The role filter
    /// itself is left out, otherwise every other counter would read zero.
    async fn fetch_filtered_stats(
        &self,
        transport: &dyn ApiTransport,
        filters: &FilterCriteria,
    ) -> Result<StatsMap, NetworkError> {
        let base = self.filter_params(&filters.without_category(ROLE_KEY));
        self.role_counts(transport, base).await
    }

    fn build_mutation(&self, request: &MutationRequest) -> Result<MutationCall, ValidationError> {
        let path = detail_path(LIST_PATH, request.resource_id);
        match request.action {
            MutationAction::Activate => Ok(MutationCall::patch(path, json!({ "is_active": true }))),
            MutationAction::Deactivate => {
                Ok(MutationCall::patch(path, json!({ "is_active": false })))
            }
            MutationAction::Update => {
                let payload = require_payload(request, Self::KIND)?;
                validate_profile(payload)?;
                Ok(MutationCall::patch(path, Value::Object(payload.clone())))
            }
            action => Err(ValidationError::UnsupportedAction {
                resource: Self::KIND,
                action,
            }),
        }
    }

    fn stat_cards(&self) -> Vec<StatCard> {
        COUNTED_ROLES
            .into_iter()
            .map(|(key, role)| StatCard {
                key,
                label: match role {
                    None => "All Users",
                    Some(UserRole::Donor) => "Donors",
                    Some(UserRole::Recipient) => "Recipients",
                    Some(_) => "Shura Members",
                },
                stat_key: key,
                filters: match role {
                    None => FilterCriteria::new(),
                    Some(role) => FilterCriteria::new().with_category(ROLE_KEY, role.as_str()),
                },
            })
            .collect()
    }
}

fn validate_profile(payload: &Map<String, Value>) -> Result<(), ValidationError> {
    for field in ["first_name", "last_name"] {
        if let Some(value) = payload.get(field) {
            let blank = value.as_str().map(|text| text.trim().is_empty()).unwrap_or(true);
            if blank {
                return Err(ValidationError::BlankField {
                    field: field.to_string(),
                });
            }
        }
    }

    let roles = requested_roles(payload);
    for (first, second) in CONFLICTING_ROLES {
        if roles.contains(&first) && roles.contains(&second) {
            return Err(ValidationError::ConflictingRoles {
                first: first.as_str(),
                second: second.as_str(),
            });
        }
    }
    Ok(())
}

/// `roles` as an array or a single string, plus a lone `role`.
fn requested_roles(payload: &Map<String, Value>) -> Vec<UserRole> {
    let mut names: Vec<&str> = match payload.get("roles") {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        Some(Value::String(role)) => vec![role.as_str()],
        _ => Vec::new(),
    };
    if let Some(role) = payload.get(ROLE_KEY).and_then(Value::as_str) {
        names.push(role);
    }
    names
        .into_iter()
        .filter_map(|name| serde_json::from_value(Value::String(name.trim().to_string())).ok())
        .collect()
}
