//! Conversions between domain types and store items.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use super::{Payment, Rate, User};
use crate::storage::{
    schema::PAYMENT_ID_ATTRIBUTE, EntityType, Item, RepositoryError, Result,
};

fn to_attributes<T: Serialize>(value: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(RepositoryError::Serialization(format!(
            "expected an object, got {other}"
        ))),
        Err(e) => Err(RepositoryError::Serialization(e.to_string())),
    }
}

fn from_attributes<T: DeserializeOwned>(attributes: Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(attributes))
        .map_err(|e| RepositoryError::Serialization(e.to_string()))
}

fn expect_entity(item: &Item, expected: EntityType) -> Result<()> {
    if item.entity_type() == expected {
        Ok(())
    } else {
        Err(RepositoryError::InvalidData(format!(
            "expected a {expected} item, found {} at {}/{}",
            item.entity_type(),
            item.pk(),
            item.sk()
        )))
    }
}

pub fn user_to_item(user: &User) -> Result<Item> {
    Ok(Item::new(user.key(), to_attributes(user)?))
}

pub fn user_from_item(item: Item) -> Result<User> {
    expect_entity(&item, EntityType::User)?;
    from_attributes(item.attributes)
}

/// The payment id lives in the key, so it is dropped from the attributes.
pub fn payment_to_item(payment: &Payment) -> Result<Item> {
    let mut attributes = to_attributes(payment)?;
    attributes.remove(PAYMENT_ID_ATTRIBUTE);
    Ok(Item::new(payment.key(), attributes))
}

pub fn payment_from_item(item: Item) -> Result<Payment> {
    expect_entity(&item, EntityType::Payment)?;
    let payment_id = item
        .payment_id()
        .map(str::to_string)
        .ok_or_else(|| RepositoryError::InvalidData("payment item without paymentId".into()))?;

    let mut attributes = item.attributes;
    attributes.insert(PAYMENT_ID_ATTRIBUTE.to_string(), Value::String(payment_id));
    from_attributes(attributes)
}

pub fn rate_to_item(rate: &Rate) -> Result<Item> {
    Ok(Item::new(rate.key(), to_attributes(rate)?))
}

pub fn rate_from_item(item: Item) -> Result<Rate> {
    expect_entity(&item, EntityType::Rate)?;
    from_attributes(item.attributes)
}
