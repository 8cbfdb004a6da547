//! DynamoDB store implementation.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, Put, TransactWriteItem};
use aws_sdk_dynamodb::Client;

use cryptopay_core::storage::{
    Item, ItemKey, Page, PutCondition, Query, QueryTarget, Result, Store,
};

use super::conversions::{
    attributes_to_item, is_payment_id_claim, item_to_attributes, key_to_attributes,
    payment_id_claim, start_key_attributes, AttributeMap,
};
use super::error::{
    map_build_error, map_get_item_error, map_put_item_error, map_query_error, map_scan_error,
    map_transact_write_error,
};

const KEY_ABSENT: &str = "attribute_not_exists(pk)";

/// Page size used when a query does not set one.
pub const DEFAULT_PAGE_SIZE: i32 = 100;

/// DynamoDB-based store implementation.
pub struct DynamoDbStore {
    client: Client,
    table_name: String,
}

impl DynamoDbStore {
    /// Creates a new store with the given DynamoDB client and table name.
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Creates a new store using the AWS SDK default credential chain.
    pub async fn from_env(table_name: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config), table_name)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn id_for_errors(item: &Item) -> String {
        item.payment_id()
            .map(str::to_string)
            .unwrap_or_else(|| item.pk())
    }

    async fn put_single(&self, item: &Item, condition: Option<&str>) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item_to_attributes(item)))
            .set_condition_expression(condition.map(str::to_string))
            .send()
            .await
            .map_err(|e| {
                map_put_item_error(e, item.entity_type().label(), Self::id_for_errors(item))
            })?;
        Ok(())
    }

    /// Writes the payment and its id claim in one transaction.
    async fn put_with_claim(&self, item: &Item, payment_id: &str) -> Result<()> {
        let payment = Put::builder()
            .table_name(&self.table_name)
            .set_item(Some(item_to_attributes(item)))
            .condition_expression(KEY_ABSENT)
            .build()
            .map_err(map_build_error)?;
        let claim = Put::builder()
            .table_name(&self.table_name)
            .set_item(Some(payment_id_claim(payment_id, &item.key)))
            .condition_expression(KEY_ABSENT)
            .build()
            .map_err(map_build_error)?;

        self.client
            .transact_write_items()
            .transact_items(TransactWriteItem::builder().put(payment).build())
            .transact_items(TransactWriteItem::builder().put(claim).build())
            .send()
            .await
            .map_err(|e| map_transact_write_error(e, item.entity_type().label(), payment_id))?;
        Ok(())
    }

    /// One raw page: the items and DynamoDB's own continuation key.
    async fn fetch_page(
        &self,
        query: &Query,
        start_key: Option<AttributeMap>,
        limit: i32,
    ) -> Result<(Vec<AttributeMap>, Option<AttributeMap>)> {
        let prefix = query.sk_prefix.map(|entity| entity.sk_prefix());

        match &query.target {
            QueryTarget::Partition(pk) => {
                let condition = match prefix {
                    Some(_) => "pk = :key AND begins_with(sk, :prefix)",
                    None => "pk = :key",
                };
                let output = self
                    .client
                    .query()
                    .table_name(&self.table_name)
                    .key_condition_expression(condition)
                    .set_expression_attribute_values(Some(values(pk, prefix)))
                    .set_exclusive_start_key(start_key)
                    .scan_index_forward(!query.descending)
                    .limit(limit)
                    .send()
                    .await
                    .map_err(map_query_error)?;
                Ok((output.items.unwrap_or_default(), output.last_evaluated_key))
            }
            QueryTarget::Index { index, key } => {
                let condition = match prefix {
                    Some(_) => "paymentId = :key AND begins_with(sk, :prefix)",
                    None => "paymentId = :key",
                };
                let output = self
                    .client
                    .query()
                    .table_name(&self.table_name)
                    .index_name(index.as_str())
                    .key_condition_expression(condition)
                    .set_expression_attribute_values(Some(values(key, prefix)))
                    .set_exclusive_start_key(start_key)
                    .scan_index_forward(!query.descending)
                    .limit(limit)
                    .send()
                    .await
                    .map_err(map_query_error)?;
                Ok((output.items.unwrap_or_default(), output.last_evaluated_key))
            }
            QueryTarget::Scan => {
                let mut request = self
                    .client
                    .scan()
                    .table_name(&self.table_name)
                    .set_exclusive_start_key(start_key)
                    .limit(limit);
                if let Some(prefix) = prefix {
                    request = request
                        .filter_expression("begins_with(sk, :prefix)")
                        .expression_attribute_values(":prefix", AttributeValue::S(prefix.into()));
                }
                let output = request.send().await.map_err(map_scan_error)?;
                Ok((output.items.unwrap_or_default(), output.last_evaluated_key))
            }
        }
    }
}

fn values(key: &str, prefix: Option<&str>) -> AttributeMap {
    let mut values = AttributeMap::from([(":key".to_string(), AttributeValue::S(key.to_string()))]);
    if let Some(prefix) = prefix {
        values.insert(":prefix".to_string(), AttributeValue::S(prefix.to_string()));
    }
    values
}

#[async_trait]
impl Store for DynamoDbStore {
    async fn put_item(&self, item: &Item, condition: PutCondition) -> Result<()> {
        match (condition, item.payment_id()) {
            (PutCondition::Overwrite, _) => self.put_single(item, None).await,
            (PutCondition::KeyAbsent, _) | (PutCondition::UniquePaymentId, None) => {
                self.put_single(item, Some(KEY_ABSENT)).await
            }
            (PutCondition::UniquePaymentId, Some(payment_id)) => {
                self.put_with_claim(item, payment_id).await
            }
        }
    }

    async fn get_item(&self, key: &ItemKey) -> Result<Option<Item>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key_to_attributes(key)))
            .send()
            .await
            .map_err(map_get_item_error)?;

        match result.item {
            Some(attributes) => Ok(Some(attributes_to_item(&attributes)?)),
            None => Ok(None),
        }
    }

    async fn query_page(&self, query: &Query, start_after: Option<&ItemKey>) -> Result<Page> {
        let limit = query
            .page_size
            .and_then(|size| i32::try_from(size).ok())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .max(1);
        let mut start_key = start_after.map(|key| match query.target {
            QueryTarget::Index { .. } => start_key_attributes(key),
            QueryTarget::Partition(_) | QueryTarget::Scan => key_to_attributes(key),
        });

        // Filtered scans can evaluate a page without returning anything; keep
        // going until something matches or the table is exhausted.
        loop {
            let (raw_items, last_evaluated) = self.fetch_page(query, start_key, limit).await?;

            let items = raw_items
                .iter()
                .filter(|attributes| !is_payment_id_claim(attributes))
                .map(attributes_to_item)
                .collect::<Result<Vec<Item>>>()?;

            match last_evaluated {
                None => {
                    return Ok(Page {
                        items,
                        last_key: None,
                    })
                }
                Some(_) if !items.is_empty() => {
                    let last_key = items.last().map(|item| item.key.clone());
                    return Ok(Page { items, last_key });
                }
                Some(next) => start_key = Some(next),
            }
        }
    }
}
