use serde_json::{Map, Value};

use super::{EntityType, ItemKey};

/// A stored item: its typed key plus the non-key attributes.
///
/// Key attributes (`pk`, `sk`, `entityType`, `paymentId`) are derived from
/// [`ItemKey`] and never duplicated in `attributes`.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub key: ItemKey,
    pub attributes: Map<String, Value>,
}

impl Item {
    pub fn new(key: ItemKey, attributes: Map<String, Value>) -> Self {
        Self { key, attributes }
    }

    pub fn pk(&self) -> String {
        self.key.pk()
    }

    pub fn sk(&self) -> String {
        self.key.sk()
    }

    pub fn entity_type(&self) -> EntityType {
        self.key.entity_type()
    }

    pub fn payment_id(&self) -> Option<&str> {
        self.key.payment_id()
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }
}
