use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::UnknownResourceKind;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
    ($name:ident => $resource:ident) => {
        id_newtype!($name);

        impl From<$name> for $resource {
            fn from(value: $name) -> Self {
                $resource(value.0)
            }
        }
    };
}

id_newtype!(ResourceId);
id_newtype!(AppealId => ResourceId);
id_newtype!(DonationId => ResourceId);
id_newtype!(UserId => ResourceId);
id_newtype!(TransactionId => ResourceId);

/// The four dashboard screens backed by the query engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Appeals,
    Donations,
    Users,
    WalletTransactions,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Appeals => "appeals",
            ResourceKind::Donations => "donations",
            ResourceKind::Users => "users",
            ResourceKind::WalletTransactions => "wallet_transactions",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = UnknownResourceKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "appeals" | "appeal" => Ok(ResourceKind::Appeals),
            "donations" | "donation" => Ok(ResourceKind::Donations),
            "users" | "user" => Ok(ResourceKind::Users),
            "wallet" | "wallet_transactions" | "transactions" => {
                Ok(ResourceKind::WalletTransactions)
            }
            other => Err(UnknownResourceKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppealStatus {
    Pending,
    Approved,
    Rejected,
    Fulfilled,
    Expired,
    Cancelled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppealCategory {
    HouseRent,
    SchoolFee,
    Medical,
    UtilityBills,
    Debt,
    BusinessSupport,
    DeathSupport,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Jazzcash,
    Easypaisa,
    Manual,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Donor,
    Recipient,
    Shura,
    #[serde(other)]
    Unknown,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Donor => "donor",
            UserRole::Recipient => "recipient",
            UserRole::Shura => "shura",
            UserRole::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Credit,
    Debit,
    #[serde(other)]
    Other,
}
