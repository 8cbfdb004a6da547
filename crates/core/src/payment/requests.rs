//! API request types and their validation.
//!
//! Bodies are deserialized loosely (`serde_json::Value` fields) so that a
//! wrongly-typed field produces the same validation message as a missing
//! one. Validation is pure: ids and clocks are passed in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Payment, PaymentStatus, User, ValidationError};
use crate::storage::sort_timestamp;

/// Longest client-supplied payment id accepted.
pub const MAX_PAYMENT_ID_LEN: usize = 64;

/// Request payload for `POST /users`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Value>,
}

impl CreateUserRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(Value::String(name.into()));
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(Value::String(email.into()));
        self
    }

    /// Validates the payload and builds the user it describes.
    pub fn into_user(self, id: String, now: DateTime<Utc>) -> Result<User, ValidationError> {
        let name = match self.name {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) if !name.trim().is_empty() => Some(name.trim().to_string()),
            Some(_) => return Err(ValidationError::InvalidName),
        };

        let email = match self.email {
            None | Some(Value::Null) => None,
            Some(Value::String(email)) if is_valid_email(&email) => Some(email),
            Some(_) => return Err(ValidationError::InvalidEmail),
        };

        if name.is_none() && email.is_none() {
            return Err(ValidationError::MissingUserFields);
        }

        Ok(User {
            id,
            name,
            email,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Request payload for `POST /payments`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Optional client-chosen id; a generated one is used otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<Value>,
}

impl CreatePaymentRequest {
    pub fn new(
        user_id: impl Into<String>,
        amount: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            user_id: Some(Value::String(user_id.into())),
            amount: Some(Value::String(amount.into())),
            currency: Some(Value::String(currency.into())),
            metadata: None,
            payment_id: None,
        }
    }

    pub fn with_payment_id(mut self, payment_id: impl Into<String>) -> Self {
        self.payment_id = Some(Value::String(payment_id.into()));
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(Value::Object(metadata));
        self
    }

    /// The owning user id, if the payload carries a usable one.
    pub fn user_id(&self) -> Option<&str> {
        match &self.user_id {
            Some(Value::String(id)) if !id.is_empty() => Some(id),
            _ => None,
        }
    }

    /// Validates the payload and builds the pending payment it describes.
    ///
    /// `generated_id` is used when the client did not choose a payment id.
    pub fn into_payment(
        self,
        generated_id: String,
        now: DateTime<Utc>,
    ) -> Result<Payment, ValidationError> {
        let user_id = self
            .user_id()
            .map(str::to_string)
            .ok_or(ValidationError::InvalidUserId)?;

        let amount = match self.amount {
            Some(Value::String(amount)) if is_positive_decimal(&amount) => amount,
            Some(Value::Number(amount)) if is_positive_decimal(&amount.to_string()) => {
                amount.to_string()
            }
            _ => return Err(ValidationError::InvalidAmount),
        };

        let currency = match self.currency {
            Some(Value::String(currency)) if !currency.is_empty() => currency,
            _ => return Err(ValidationError::MissingCurrency),
        };
        if !is_currency_code(&currency) {
            return Err(ValidationError::InvalidCurrency);
        }

        let metadata = match self.metadata {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(metadata)) => metadata,
            Some(_) => return Err(ValidationError::InvalidMetadata),
        };

        let payment_id = match self.payment_id {
            None | Some(Value::Null) => generated_id,
            Some(Value::String(id)) if is_valid_payment_id(&id) => id,
            Some(_) => return Err(ValidationError::InvalidPaymentId),
        };

        let now = sort_timestamp(now);
        Ok(Payment {
            payment_id,
            user_id,
            amount,
            currency,
            status: PaymentStatus::Pending,
            metadata,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Query parameters for `GET /rates/history`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatesHistoryQuery {
    /// Only return observations for this pair.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair: Option<String>,
}

/// `local@domain.tld`, with no `@` outside the separator.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Exactly three ASCII uppercase letters.
pub fn is_currency_code(currency: &str) -> bool {
    currency.len() == 3 && currency.bytes().all(|b| b.is_ascii_uppercase())
}

/// Unsigned decimal with at least one non-zero digit.
pub fn is_positive_decimal(amount: &str) -> bool {
    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());

    if whole.is_empty() && fraction.is_empty() {
        return false;
    }
    if amount.ends_with('.') || !digits_only(whole) || !digits_only(fraction) {
        return false;
    }
    amount.bytes().any(|b| (b'1'..=b'9').contains(&b))
}

/// Letters, digits, `-` and `_`, up to [`MAX_PAYMENT_ID_LEN`] characters.
pub fn is_valid_payment_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_PAYMENT_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_create_user_with_name_only() {
        let request: CreateUserRequest = serde_json::from_value(json!({"name": "Alice"})).unwrap();

        let user = request.into_user("U1".into(), now()).unwrap();

        assert_eq!(user.id, "U1");
        assert_eq!(user.name.as_deref(), Some("Alice"));
        assert_eq!(user.email, None);
        assert_eq!(user.created_at, now());
    }

    #[test]
    fn test_create_user_with_email() {
        let user = CreateUserRequest::new()
            .with_email("alice@example.com")
            .into_user("U1".into(), now())
            .unwrap();

        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn test_create_user_rejects_empty_body() {
        let result = CreateUserRequest::new().into_user("U1".into(), now());
        assert_eq!(result, Err(ValidationError::MissingUserFields));
    }

    #[test]
    fn test_create_user_rejects_blank_name() {
        let result = CreateUserRequest::new()
            .with_name("   ")
            .into_user("U1".into(), now());
        assert_eq!(result, Err(ValidationError::InvalidName));
    }

    #[test]
    fn test_create_user_rejects_bad_email() {
        let result = CreateUserRequest::new()
            .with_email("not-an-email")
            .into_user("U1".into(), now());
        assert_eq!(result, Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@mail.example.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@@b.co"));
        assert!(!is_valid_email("a@.co"));
        assert!(!is_valid_email("a@b."));
    }

    #[test]
    fn test_create_payment_defaults() {
        let payment = CreatePaymentRequest::new("U1", "0.5", "BTC")
            .into_payment("P1".into(), now())
            .unwrap();

        assert_eq!(payment.payment_id, "P1");
        assert_eq!(payment.user_id, "U1");
        assert_eq!(payment.amount, "0.5");
        assert_eq!(payment.currency, "BTC");
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.metadata.is_empty());
    }

    #[test]
    fn test_create_payment_uses_client_payment_id() {
        let payment = CreatePaymentRequest::new("U1", "10", "USD")
            .with_payment_id("order-42")
            .into_payment("generated".into(), now())
            .unwrap();

        assert_eq!(payment.payment_id, "order-42");
    }

    #[test]
    fn test_create_payment_accepts_numeric_amount() {
        let request: CreatePaymentRequest = serde_json::from_value(json!({
            "userId": "U1",
            "amount": 150.25,
            "currency": "USD",
            "metadata": {"description": "Payment for services"}
        }))
        .unwrap();

        let payment = request.into_payment("P1".into(), now()).unwrap();

        assert_eq!(payment.amount, "150.25");
        assert_eq!(payment.metadata["description"], "Payment for services");
    }

    #[test]
    fn test_create_payment_validation_order() {
        let cases = [
            (json!({"amount": "1", "currency": "USD"}), ValidationError::InvalidUserId),
            (
                json!({"userId": 123, "amount": "1", "currency": "USD"}),
                ValidationError::InvalidUserId,
            ),
            (json!({"userId": "U1", "currency": "USD"}), ValidationError::InvalidAmount),
            (
                json!({"userId": "U1", "amount": "-1", "currency": "USD"}),
                ValidationError::InvalidAmount,
            ),
            (json!({"userId": "U1", "amount": "1"}), ValidationError::MissingCurrency),
            (
                json!({"userId": "U1", "amount": "1", "currency": "usd"}),
                ValidationError::InvalidCurrency,
            ),
            (
                json!({"userId": "U1", "amount": "1", "currency": "USD", "metadata": []}),
                ValidationError::InvalidMetadata,
            ),
            (
                json!({"userId": "U1", "amount": "1", "currency": "USD", "paymentId": "a#b"}),
                ValidationError::InvalidPaymentId,
            ),
        ];

        for (body, expected) in cases {
            let request: CreatePaymentRequest = serde_json::from_value(body.clone()).unwrap();
            assert_eq!(
                request.into_payment("P1".into(), now()),
                Err(expected),
                "body: {body}"
            );
        }
    }

    #[test]
    fn test_positive_decimal() {
        assert!(is_positive_decimal("1"));
        assert!(is_positive_decimal("0.5"));
        assert!(is_positive_decimal(".5"));
        assert!(is_positive_decimal("150.00"));
        assert!(!is_positive_decimal("0"));
        assert!(!is_positive_decimal("0.000"));
        assert!(!is_positive_decimal(""));
        assert!(!is_positive_decimal("."));
        assert!(!is_positive_decimal("1."));
        assert!(!is_positive_decimal("-1"));
        assert!(!is_positive_decimal("1e5"));
        assert!(!is_positive_decimal("1.2.3"));
    }

    #[test]
    fn test_currency_code() {
        assert!(is_currency_code("BTC"));
        assert!(!is_currency_code("BT"));
        assert!(!is_currency_code("BTCX"));
        assert!(!is_currency_code("btc"));
    }
}
