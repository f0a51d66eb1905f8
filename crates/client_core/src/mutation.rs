//! State-changing requests against a single resource.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use shared::domain::ResourceId;
use tracing::{info, warn};

use crate::{
    adapters::ResourceAdapter,
    error::{MutationError, ValidationError},
    transport::{ApiTransport, HttpMethod},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationAction {
    Approve,
    Reject,
    Cancel,
    Activate,
    Deactivate,
    Update,
}

impl MutationAction {
    pub fn as_str(self) -> &'static str {
        match self {
            MutationAction::Approve => "approve",
            MutationAction::Reject => "reject",
            MutationAction::Cancel => "cancel",
            MutationAction::Activate => "activate",
            MutationAction::Deactivate => "deactivate",
            MutationAction::Update => "update",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "approve" => Some(MutationAction::Approve),
            "reject" => Some(MutationAction::Reject),
            "cancel" => Some(MutationAction::Cancel),
            "activate" => Some(MutationAction::Activate),
            "deactivate" => Some(MutationAction::Deactivate),
            "update" => Some(MutationAction::Update),
            _ => None,
        }
    }
}

impl fmt::Display for MutationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationRequest {
    pub resource_id: ResourceId,
    pub action: MutationAction,
    pub payload: Option<Map<String, Value>>,
}

impl MutationRequest {
    pub fn new(resource_id: impl Into<ResourceId>, action: MutationAction) -> Self {
        Self {
            resource_id: resource_id.into(),
            action,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload
            .as_ref()
            .and_then(|payload| payload.get(key))
            .and_then(Value::as_str)
    }
}

/// Concrete HTTP call an adapter derives from a validated request.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationCall {
    pub method: HttpMethod,
    pub path: String,
    pub body: Value,
}

impl MutationCall {
    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Patch,
            path: path.into(),
            body,
        }
    }
}

/// Validates, sends, and decodes one mutation. Touches no engine state;
/// invalidation is the caller's job and only happens on success.
///
/// Any 2xx is a success. The updated record is `None` when the response
/// body is not a record of this resource (a bare `{"detail": ...}`, say).
pub async fn dispatch<A: ResourceAdapter>(
    adapter: &A,
    transport: &dyn ApiTransport,
    request: &MutationRequest,
) -> Result<Option<A::Item>, MutationError> {
    let call = adapter.build_mutation(request)?;
    let response = transport
        .send_json(call.method, &call.path, &call.body)
        .await
        .map_err(|err| {
            warn!(
                resource = %A::KIND,
                id = %request.resource_id,
                action = %request.action,
                error = %err,
                "mutation rejected"
            );
            MutationError::from(err)
        })?;

    let updated = match adapter.decode_item(response) {
        Ok(updated) => Some(updated),
        Err(err) => {
            warn!(
                resource = %A::KIND,
                id = %request.resource_id,
                error = %err,
                "mutation response carried no record"
            );
            None
        }
    };
    info!(
        resource = %A::KIND,
        id = %request.resource_id,
        action = %request.action,
        "mutation applied"
    );
    Ok(updated)
}

/// Fails with [`ValidationError::MissingPayload`] when the request has none.
pub fn require_payload<'a>(
    request: &'a MutationRequest,
    resource: shared::domain::ResourceKind,
) -> Result<&'a Map<String, Value>, ValidationError> {
    request
        .payload
        .as_ref()
        .filter(|payload| !payload.is_empty())
        .ok_or(ValidationError::MissingPayload {
            resource,
            action: request.action,
        })
}
