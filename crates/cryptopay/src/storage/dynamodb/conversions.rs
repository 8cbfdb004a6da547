//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between DynamoDB AttributeValue maps and
//! store items. These are testable in isolation without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use cryptopay_core::storage::schema::{
    ENTITY_TYPE_ATTRIBUTE, PARTITION_KEY, PAYMENT_ID_ATTRIBUTE, SORT_KEY,
};
use cryptopay_core::storage::{EntityType, Item, ItemKey, RepositoryError};
use serde_json::{Map, Number, Value};

pub type AttributeMap = HashMap<String, AttributeValue>;

// ============================================================================
// Payment id claims
// ============================================================================

/// Prefix of the marker items that reserve a payment id.
pub const PAYMENT_ID_CLAIM_PREFIX: &str = "PAYMENTID#";

/// Marker item written alongside a payment to reserve its id.
///
/// It carries no `paymentId` attribute, so it never shows up in the index,
/// and its sort key never matches an entity prefix.
pub fn payment_id_claim(payment_id: &str, owner: &ItemKey) -> AttributeMap {
    let claim = format!("{PAYMENT_ID_CLAIM_PREFIX}{payment_id}");
    HashMap::from([
        (PARTITION_KEY.to_string(), AttributeValue::S(claim.clone())),
        (SORT_KEY.to_string(), AttributeValue::S(claim)),
        (
            "claimedBy".to_string(),
            AttributeValue::S(format!("{}/{}", owner.pk(), owner.sk())),
        ),
    ])
}

pub fn is_payment_id_claim(attributes: &AttributeMap) -> bool {
    matches!(
        attributes.get(PARTITION_KEY),
        Some(AttributeValue::S(pk)) if pk.starts_with(PAYMENT_ID_CLAIM_PREFIX)
    )
}

// ============================================================================
// JSON values
// ============================================================================

pub fn json_to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(values) => AttributeValue::L(values.iter().map(json_to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_attribute(v)))
                .collect(),
        ),
    }
}

pub fn attribute_to_json(value: &AttributeValue) -> Result<Value, RepositoryError> {
    match value {
        AttributeValue::Null(_) => Ok(Value::Null),
        AttributeValue::Bool(b) => Ok(Value::Bool(*b)),
        AttributeValue::N(n) => n
            .parse::<Number>()
            .map(Value::Number)
            .map_err(|e| RepositoryError::Serialization(format!("invalid number {n}: {e}"))),
        AttributeValue::S(s) => Ok(Value::String(s.clone())),
        AttributeValue::L(values) => values
            .iter()
            .map(attribute_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        AttributeValue::M(map) => map
            .iter()
            .map(|(k, v)| attribute_to_json(v).map(|v| (k.clone(), v)))
            .collect::<Result<Map<_, _>, _>>()
            .map(Value::Object),
        other => Err(RepositoryError::Serialization(format!(
            "unsupported attribute type: {other:?}"
        ))),
    }
}

// ============================================================================
// Items
// ============================================================================

/// Primary key attributes of an item.
pub fn key_to_attributes(key: &ItemKey) -> AttributeMap {
    HashMap::from([
        (PARTITION_KEY.to_string(), AttributeValue::S(key.pk())),
        (SORT_KEY.to_string(), AttributeValue::S(key.sk())),
    ])
}

/// Exclusive start key for resuming an index query after `key`: the table
/// key plus the index key.
pub fn start_key_attributes(key: &ItemKey) -> AttributeMap {
    let mut attributes = key_to_attributes(key);
    if let Some(payment_id) = key.payment_id() {
        attributes.insert(
            PAYMENT_ID_ATTRIBUTE.to_string(),
            AttributeValue::S(payment_id.to_string()),
        );
    }
    attributes
}

/// Convert an item to a DynamoDB item.
pub fn item_to_attributes(item: &Item) -> AttributeMap {
    let mut attributes: AttributeMap = item
        .attributes
        .iter()
        .map(|(k, v)| (k.clone(), json_to_attribute(v)))
        .collect();

    attributes.extend(start_key_attributes(&item.key));
    attributes.insert(
        ENTITY_TYPE_ATTRIBUTE.to_string(),
        AttributeValue::S(item.entity_type().as_str().to_string()),
    );
    attributes
}

fn get_string<'a>(attributes: &'a AttributeMap, name: &str) -> Result<&'a str, RepositoryError> {
    match attributes.get(name) {
        Some(AttributeValue::S(value)) => Ok(value.as_str()),
        Some(_) => Err(RepositoryError::InvalidData(format!(
            "attribute {name} is not a string"
        ))),
        None => Err(RepositoryError::InvalidData(format!(
            "missing attribute {name}"
        ))),
    }
}

/// Convert a DynamoDB item to an item.
pub fn attributes_to_item(attributes: &AttributeMap) -> Result<Item, RepositoryError> {
    let pk = get_string(attributes, PARTITION_KEY)?;
    let sk = get_string(attributes, SORT_KEY)?;
    let entity_type = get_string(attributes, ENTITY_TYPE_ATTRIBUTE)?;
    let entity_type = EntityType::parse(entity_type).ok_or_else(|| {
        RepositoryError::InvalidData(format!("unknown entity type {entity_type}"))
    })?;

    let key = ItemKey::from_parts(entity_type, pk, sk)?;

    let mut data = Map::new();
    for (name, value) in attributes {
        if [PARTITION_KEY, SORT_KEY, ENTITY_TYPE_ATTRIBUTE, PAYMENT_ID_ATTRIBUTE]
            .contains(&name.as_str())
        {
            continue;
        }
        data.insert(name.clone(), attribute_to_json(value)?);
    }

    Ok(Item::new(key, data))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;

    fn payment_item() -> Item {
        let created = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let attributes = json!({
            "userId": "U1",
            "amount": "150.00",
            "currency": "USD",
            "status": "pending",
            "metadata": {"description": "Payment for services", "tags": ["a", 1, true, null]},
        });
        let Value::Object(attributes) = attributes else {
            unreachable!()
        };
        Item::new(ItemKey::payment("U1", created, "P1"), attributes)
    }

    #[test]
    fn test_item_to_attributes_adds_key_attributes() {
        let attributes = item_to_attributes(&payment_item());

        assert_eq!(attributes["pk"], AttributeValue::S("U1".into()));
        assert_eq!(
            attributes["sk"],
            AttributeValue::S("PAYMENT#2024-06-15T12:00:00.000000Z#P1".into())
        );
        assert_eq!(attributes["paymentId"], AttributeValue::S("P1".into()));
        assert_eq!(attributes["entityType"], AttributeValue::S("PAYMENT".into()));
    }

    #[test]
    fn test_item_survives_attribute_round_trip() {
        let item = payment_item();
        let restored = attributes_to_item(&item_to_attributes(&item)).unwrap();
        assert_eq!(restored, item);
    }

    #[test]
    fn test_users_carry_no_payment_id() {
        let item = Item::new(ItemKey::user("U1"), Map::new());
        let attributes = item_to_attributes(&item);
        assert!(!attributes.contains_key("paymentId"));
    }

    #[test]
    fn test_numbers_keep_their_text() {
        let value = attribute_to_json(&AttributeValue::N("150.25".into())).unwrap();
        assert_eq!(value, json!(150.25));
        assert_eq!(json_to_attribute(&json!(42)), AttributeValue::N("42".into()));
    }

    #[test]
    fn test_missing_entity_type_is_invalid() {
        let mut attributes = item_to_attributes(&payment_item());
        attributes.remove("entityType");
        assert!(matches!(
            attributes_to_item(&attributes),
            Err(RepositoryError::InvalidData(_))
        ));
    }

    #[test]
    fn test_claim_marker_is_recognised() {
        let owner = ItemKey::user("U1");
        let claim = payment_id_claim("P1", &owner);

        assert!(is_payment_id_claim(&claim));
        assert!(!claim.contains_key("paymentId"));
        assert!(!is_payment_id_claim(&key_to_attributes(&owner)));
    }
}
