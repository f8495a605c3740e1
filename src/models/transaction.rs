use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Kind of balance-affecting event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// External funds entering a wallet via the payment gateway.
    Deposit,
    /// Internal wallet-to-wallet movement.
    Transfer,
}

/// Transaction status. Monotonic: `Pending` may move to `Success` or
/// `Failed`; both of those are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Success | TransactionStatus::Failed)
    }

    /// Checks whether a status transition is allowed.
    pub fn can_transition(from: TransactionStatus, to: TransactionStatus) -> bool {
        matches!(
            (from, to),
            (TransactionStatus::Pending, TransactionStatus::Success)
                | (TransactionStatus::Pending, TransactionStatus::Failed)
        )
    }
}

/// An immutable-once-successful record of a balance-affecting event.
/// The `reference` is the idempotency key for the whole system.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub reference: String,
    #[sqlx(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub wallet_id: Uuid,
    pub recipient_wallet_number: Option<String>,
    pub authorization_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// A pending deposit awaiting gateway confirmation. Holds the hosted
    /// checkout handle returned at initiation.
    pub fn deposit(
        reference: String,
        amount: Decimal,
        wallet_id: Uuid,
        authorization_url: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            reference,
            transaction_type: TransactionType::Deposit,
            amount,
            status: TransactionStatus::Pending,
            wallet_id,
            recipient_wallet_number: None,
            authorization_url: Some(authorization_url),
            created_at: Utc::now(),
        }
    }

    /// A transfer record for the sending wallet. Transfers settle in the
    /// same unit of work that moves the funds, so they are born successful.
    pub fn transfer(
        reference: String,
        amount: Decimal,
        wallet_id: Uuid,
        recipient_wallet_number: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            reference,
            transaction_type: TransactionType::Transfer,
            amount,
            status: TransactionStatus::Success,
            wallet_id,
            recipient_wallet_number: Some(recipient_wallet_number),
            authorization_url: None,
            created_at: Utc::now(),
        }
    }
}
