use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::reference::WALLET_NUMBER_LEN;
use crate::services::wallet_service::MIN_DEPOSIT;

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

/// Request to provision a wallet for a newly created user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWalletRequest {
    pub user_id: Uuid,
}

/// Request to start an external deposit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositRequest {
    pub amount: Decimal,
}

impl DepositRequest {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.amount < MIN_DEPOSIT {
            errors.push(ValidationError {
                field: "amount".to_string(),
                message: format!("amount must be at least {}", MIN_DEPOSIT),
            });
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Request to transfer funds to another wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    /// 10-digit wallet number of the recipient.
    pub wallet_number: String,
    pub amount: Decimal,
}

impl TransferRequest {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.wallet_number.len() != WALLET_NUMBER_LEN
            || !self.wallet_number.chars().all(|c| c.is_ascii_digit())
        {
            errors.push(ValidationError {
                field: "wallet_number".to_string(),
                message: "wallet_number must be exactly 10 digits".to_string(),
            });
        }
        if self.amount < Decimal::ONE {
            errors.push(ValidationError {
                field: "amount".to_string(),
                message: "amount must be at least 1".to_string(),
            });
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
