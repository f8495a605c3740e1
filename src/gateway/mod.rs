pub mod paystack;

pub use paystack::PaystackClient;

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{AppError, Result};

/// Scale factor between major units and the gateway's minor unit (kobo).
pub const MINOR_UNIT_SCALE: i64 = 100;

/// Request to open a hosted-checkout session for a deposit.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub reference: String,
    pub amount: Decimal,
    pub email: String,
    pub callback_url: String,
}

/// A hosted-checkout session the caller is redirected to.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub authorization_url: String,
}

/// Outbound boundary to the payment provider. Transport failures and
/// 4xx/5xx responses all collapse into `UpstreamUnavailable`; the ledger
/// engine has no use for a gateway-specific error taxonomy.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn init_checkout(&self, request: CheckoutRequest) -> Result<CheckoutSession>;
}

/// Converts a major-unit amount to the gateway's minor unit.
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
    (amount * Decimal::from(MINOR_UNIT_SCALE))
        .round()
        .to_i64()
        .ok_or_else(|| AppError::InvalidOperation(format!("amount {} out of range", amount)))
}

/// Converts a minor-unit amount back to major units with 2-decimal scale.
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}
