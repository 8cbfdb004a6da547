//! Users, payments and rates: domain types, request validation and the
//! conversions to and from store items.

mod error;
mod items;
mod mock_data;
mod operations;
mod requests;
mod types;

pub use error::ValidationError;
pub use items::{
    payment_from_item, payment_to_item, rate_from_item, rate_to_item, user_from_item,
    user_to_item,
};
pub use mock_data::{generate_seed_rates, DEFAULT_PAIRS};
pub use operations::{filter_by_pair, latest_rates};
pub use requests::{
    is_currency_code, is_positive_decimal, is_valid_email, is_valid_payment_id,
    CreatePaymentRequest, CreateUserRequest, RatesHistoryQuery, MAX_PAYMENT_ID_LEN,
};
pub use types::{CreatedPayment, CreatedUser, Payment, PaymentStatus, Rate, User};
