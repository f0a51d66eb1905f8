use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::domain::{
    AppealCategory, AppealId, AppealStatus, DonationId, PaymentMethod, TransactionId,
    TransactionType, UserId, UserRole,
};

/// Paginated list response shared by every list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub filtered_stats: Option<Map<String, Value>>,
    #[serde(default)]
    pub meta: Option<Map<String, Value>>,
}

impl<T> ListEnvelope<T> {
    /// Total matching rows; falls back to the page length when the backend
    /// omitted `count` (unpaginated responses).
    pub fn total_count(&self) -> u64 {
        self.count.unwrap_or(self.results.len() as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appeal {
    pub id: AppealId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: AppealCategory,
    pub status: AppealStatus,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub amount_requested: f64,
    #[serde(default)]
    pub is_monthly: bool,
    #[serde(default)]
    pub months_required: Option<u8>,
    #[serde(default)]
    pub is_urgent: bool,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    pub id: DonationId,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub donation_type: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub donor_name: Option<String>,
    #[serde(default)]
    pub appeal: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default = "default_role")]
    pub role: UserRole,
    #[serde(default)]
    pub is_verified_syed: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub wallet_balance: f64,
}

impl UserAccount {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if !full.is_empty() {
            return full.to_string();
        }
        self.email
            .clone()
            .or_else(|| self.phone.clone())
            .unwrap_or_else(|| format!("user #{}", self.id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: TransactionId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub amount: f64,
    #[serde(rename = "type", default = "default_transaction_type")]
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub appeal_id: Option<AppealId>,
    #[serde(default)]
    pub appeal_title: Option<String>,
}

fn default_currency() -> String {
    "PKR".to_string()
}

fn default_role() -> UserRole {
    UserRole::Donor
}

fn default_true() -> bool {
    true
}

fn default_transaction_type() -> TransactionType {
    TransactionType::Other
}

/// Parses a JSON number or a numeric string (decimal fields are serialized as
/// strings by the backend). Anything else is `None`.
pub fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(0.0),
        Some(value) => number_from_value(&value).ok_or_else(|| {
            serde::de::Error::custom(format!("expected a numeric amount, got {value}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn appeal_accepts_string_amounts_and_unknown_status() {
        let appeal: Appeal = serde_json::from_value(json!({
            "id": 4,
            "title": "Rent",
            "category": "house_rent",
            "status": "on_hold",
            "amount_requested": "12500.50",
        }))
        .expect("decode appeal");
        assert_eq!(appeal.amount_requested, 12500.5);
        assert_eq!(appeal.status, AppealStatus::Unknown);
        assert_eq!(appeal.category, AppealCategory::HouseRent);
    }

    #[test]
    fn envelope_total_falls_back_to_result_len() {
        let envelope: ListEnvelope<Value> =
            serde_json::from_value(json!({ "results": [1, 2, 3] })).expect("decode");
        assert_eq!(envelope.total_count(), 3);
    }

    #[test]
    fn wallet_transaction_reads_type_field() {
        let tx: WalletTransaction = serde_json::from_value(json!({
            "id": 9,
            "amount": 300,
            "type": "debit",
            "description": "withdrawal",
        }))
        .expect("decode tx");
        assert_eq!(tx.transaction_type, TransactionType::Debit);
        assert_eq!(tx.amount, 300.0);
    }

    #[test]
    fn user_display_name_falls_back_to_email() {
        let user: UserAccount = serde_json::from_value(json!({
            "id": 2,
            "email": "a@example.com",
            "role": "shura",
        }))
        .expect("decode user");
        assert_eq!(user.display_name(), "a@example.com");
        assert!(user.is_active);
    }
}
