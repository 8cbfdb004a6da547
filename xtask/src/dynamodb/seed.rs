//! Rate seeding (pure conversion + batch writes).

use std::collections::HashMap;

use aws_sdk_dynamodb::types::{AttributeValue, PutRequest, WriteRequest};
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};
use cryptopay_core::payment::{generate_seed_rates, rate_to_item, Rate};
use cryptopay_core::storage::schema::{
    ENTITY_TYPE_ATTRIBUTE, PARTITION_KEY, PAYMENT_ID_ATTRIBUTE, SORT_KEY,
};
use cryptopay_core::storage::Item;
use serde_json::Value;

use super::error::{DynamodbError, Result};

/// BatchWriteItem accepts at most this many requests.
const BATCH_SIZE: usize = 25;

/// Generate the rate history to insert, newest observation at `end`.
pub fn generate_rates(pairs: &[String], points: u32, end: DateTime<Utc>) -> Vec<Rate> {
    let pairs: Vec<&str> = pairs.iter().map(String::as_str).collect();
    generate_seed_rates(&pairs, points, end)
}

fn json_to_attribute(value: &Value) -> AttributeValue {
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

/// Physical attributes of a store item, key attributes included.
pub fn item_to_attributes(item: &Item) -> HashMap<String, AttributeValue> {
    let mut attributes: HashMap<String, AttributeValue> = item
        .attributes
        .iter()
        .map(|(k, v)| (k.clone(), json_to_attribute(v)))
        .collect();

    attributes.insert(PARTITION_KEY.to_string(), AttributeValue::S(item.pk()));
    attributes.insert(SORT_KEY.to_string(), AttributeValue::S(item.sk()));
    attributes.insert(
        ENTITY_TYPE_ATTRIBUTE.to_string(),
        AttributeValue::S(item.entity_type().as_str().to_string()),
    );
    if let Some(payment_id) = item.payment_id() {
        attributes.insert(
            PAYMENT_ID_ATTRIBUTE.to_string(),
            AttributeValue::S(payment_id.to_string()),
        );
    }

    attributes
}

fn rate_attributes(rate: &Rate) -> Result<HashMap<String, AttributeValue>> {
    let item = rate_to_item(rate).map_err(|e| DynamodbError::InvalidSeed(e.to_string()))?;
    Ok(item_to_attributes(&item))
}

/// Insert rates into the table. Returns the number of items written.
pub async fn seed_rates(client: &Client, table_name: &str, rates: &[Rate]) -> Result<usize> {
    let mut inserted = 0;

    for chunk in rates.chunks(BATCH_SIZE) {
        let write_requests = chunk
            .iter()
            .map(|rate| {
                let put = PutRequest::builder()
                    .set_item(Some(rate_attributes(rate)?))
                    .build()
                    .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;
                Ok(WriteRequest::builder().put_request(put).build())
            })
            .collect::<Result<Vec<_>>>()?;

        let response = client
            .batch_write_item()
            .request_items(table_name, write_requests)
            .send()
            .await
            .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;

        let unprocessed = response
            .unprocessed_items()
            .and_then(|items| items.get(table_name))
            .map_or(0, Vec::len);
        if unprocessed > 0 {
            return Err(DynamodbError::AwsSdk(format!(
                "{unprocessed} items were not processed, retry the seed"
            )));
        }

        inserted += chunk.len();
    }

    Ok(inserted)
}
