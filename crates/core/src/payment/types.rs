use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::storage::{sort_timestamp, ItemKey};

/// An account. Created once, never updated by this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn key(&self) -> ItemKey {
        ItemKey::user(&self.id)
    }
}

/// Lifecycle state of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// A payment owned by a user. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub payment_id: String,
    pub user_id: String,
    /// Decimal amount kept as text so no precision is lost.
    pub amount: String,
    pub currency: String,
    pub status: PaymentStatus,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn key(&self) -> ItemKey {
        ItemKey::payment(&self.user_id, self.created_at, &self.payment_id)
    }
}

/// One exchange-rate observation for a currency pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    pub pair: String,
    pub rate: String,
    pub timestamp: DateTime<Utc>,
}

impl Rate {
    pub fn new(pair: impl Into<String>, rate: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            pair: pair.into(),
            rate: rate.into(),
            timestamp: sort_timestamp(timestamp),
        }
    }

    pub fn key(&self) -> ItemKey {
        ItemKey::rate(&self.pair, self.timestamp)
    }
}

/// Response body of `POST /users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUser {
    pub user_id: String,
}

/// Response body of `POST /payments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPayment {
    pub payment_id: String,
}
