//! Single-table key scheme.
//!
//! Items are addressed by a tagged union keyed by [`EntityType`]; the literal
//! `pk`/`sk` strings are derived from it and parsed back into it. All
//! functions are pure.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::RepositoryError;

// ============================================================================
// Key prefixes
// ============================================================================

pub const USER_PREFIX: &str = "USER#";
pub const PAYMENT_PREFIX: &str = "PAYMENT#";
pub const RATE_PREFIX: &str = "RATE#";

/// Partition shared by every Rate item.
pub const RATE_PARTITION: &str = "RATE";

/// Kinds of items multiplexed in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    User,
    Payment,
    Rate,
}

impl EntityType {
    /// Value of the `entityType` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::User => "USER",
            EntityType::Payment => "PAYMENT",
            EntityType::Rate => "RATE",
        }
    }

    /// Sort key prefix shared by every item of this kind.
    pub fn sk_prefix(&self) -> &'static str {
        match self {
            EntityType::User => USER_PREFIX,
            EntityType::Payment => PAYMENT_PREFIX,
            EntityType::Rate => RATE_PREFIX,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "USER" => Some(EntityType::User),
            "PAYMENT" => Some(EntityType::Payment),
            "RATE" => Some(EntityType::Rate),
            _ => None,
        }
    }

    /// Human-readable name used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            EntityType::User => "User",
            EntityType::Payment => "Payment",
            EntityType::Rate => "Rate",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary key of an item, tagged by entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKey {
    /// `pk = <user_id>`, `sk = USER#<user_id>`
    User { user_id: String },
    /// `pk = <user_id>`, `sk = PAYMENT#<created_at>#<payment_id>`
    Payment {
        user_id: String,
        created_at: DateTime<Utc>,
        payment_id: String,
    },
    /// `pk = RATE`, `sk = RATE#<timestamp>#<pair>`
    Rate {
        pair: String,
        timestamp: DateTime<Utc>,
    },
}

impl ItemKey {
    pub fn user(user_id: impl Into<String>) -> Self {
        ItemKey::User {
            user_id: user_id.into(),
        }
    }

    pub fn payment(
        user_id: impl Into<String>,
        created_at: DateTime<Utc>,
        payment_id: impl Into<String>,
    ) -> Self {
        ItemKey::Payment {
            user_id: user_id.into(),
            created_at: sort_timestamp(created_at),
            payment_id: payment_id.into(),
        }
    }

    pub fn rate(pair: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        ItemKey::Rate {
            pair: pair.into(),
            timestamp: sort_timestamp(timestamp),
        }
    }

    pub fn entity_type(&self) -> EntityType {
        match self {
            ItemKey::User { .. } => EntityType::User,
            ItemKey::Payment { .. } => EntityType::Payment,
            ItemKey::Rate { .. } => EntityType::Rate,
        }
    }

    /// Partition key string.
    pub fn pk(&self) -> String {
        match self {
            ItemKey::User { user_id } => user_id.clone(),
            ItemKey::Payment { user_id, .. } => user_id.clone(),
            ItemKey::Rate { .. } => RATE_PARTITION.to_string(),
        }
    }

    /// Sort key string.
    pub fn sk(&self) -> String {
        match self {
            ItemKey::User { user_id } => format!("{USER_PREFIX}{user_id}"),
            ItemKey::Payment {
                created_at,
                payment_id,
                ..
            } => format!(
                "{PAYMENT_PREFIX}{}#{payment_id}",
                format_sort_timestamp(*created_at)
            ),
            ItemKey::Rate { pair, timestamp } => {
                format!("{RATE_PREFIX}{}#{pair}", format_sort_timestamp(*timestamp))
            }
        }
    }

    /// Value projected into the payment id index, if any.
    pub fn payment_id(&self) -> Option<&str> {
        match self {
            ItemKey::Payment { payment_id, .. } => Some(payment_id),
            _ => None,
        }
    }

    /// Rebuilds a key from its stored parts.
    pub fn from_parts(entity_type: EntityType, pk: &str, sk: &str) -> Result<Self, RepositoryError> {
        let invalid =
            || RepositoryError::InvalidData(format!("malformed {entity_type} key: {pk}/{sk}"));

        let rest = sk.strip_prefix(entity_type.sk_prefix()).ok_or_else(invalid)?;

        match entity_type {
            EntityType::User => {
                if rest != pk {
                    return Err(invalid());
                }
                Ok(ItemKey::user(pk))
            }
            EntityType::Payment => {
                let (stamp, payment_id) = rest.split_once('#').ok_or_else(invalid)?;
                if payment_id.is_empty() {
                    return Err(invalid());
                }
                Ok(ItemKey::Payment {
                    user_id: pk.to_string(),
                    created_at: parse_sort_timestamp(stamp).ok_or_else(invalid)?,
                    payment_id: payment_id.to_string(),
                })
            }
            EntityType::Rate => {
                if pk != RATE_PARTITION {
                    return Err(invalid());
                }
                let (stamp, pair) = rest.split_once('#').ok_or_else(invalid)?;
                Ok(ItemKey::Rate {
                    pair: pair.to_string(),
                    timestamp: parse_sort_timestamp(stamp).ok_or_else(invalid)?,
                })
            }
        }
    }
}

/// Truncates a timestamp to the precision kept in sort keys.
pub fn sort_timestamp(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(6)
}

/// Fixed-width RFC 3339 form (microseconds, `Z`) so that lexical order of
/// sort keys matches chronological order.
pub fn format_sort_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_sort_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}
