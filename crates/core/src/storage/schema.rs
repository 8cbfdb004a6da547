//! Physical table schema shared by the server, the store backends and the
//! provisioning tasks.

/// Default name of the single shared table.
pub const DEFAULT_TABLE_NAME: &str = "CryptoPaymentTable";

/// Partition key attribute.
pub const PARTITION_KEY: &str = "pk";

/// Sort key attribute.
pub const SORT_KEY: &str = "sk";

/// Discriminator attribute written on every item.
pub const ENTITY_TYPE_ATTRIBUTE: &str = "entityType";

/// Hash key of the payment id index. Only Payment items carry it.
pub const PAYMENT_ID_ATTRIBUTE: &str = "paymentId";

/// Secondary indexes declared on the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexName {
    /// Re-projects payments by `paymentId` (hash) and `sk` (range), all attributes.
    PaymentId,
}

impl IndexName {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexName::PaymentId => "paymentId-index",
        }
    }

    /// Attribute used as the index hash key.
    pub fn partition_key(&self) -> &'static str {
        match self {
            IndexName::PaymentId => PAYMENT_ID_ATTRIBUTE,
        }
    }

    /// Attribute used as the index range key.
    pub fn sort_key(&self) -> &'static str {
        match self {
            IndexName::PaymentId => SORT_KEY,
        }
    }

    pub fn all() -> &'static [IndexName] {
        &[IndexName::PaymentId]
    }
}

impl std::fmt::Display for IndexName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
