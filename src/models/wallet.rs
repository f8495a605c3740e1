use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user's single monetary account, addressed externally by its
/// 10-digit wallet number. The balance is only ever mutated by the
/// ledger engine inside a scoped unit of work.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Wallet {
    pub id: Uuid,
    pub wallet_number: String,
    pub balance: Decimal,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Creates a new wallet with a zero balance.
    pub fn new(user_id: Uuid, wallet_number: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            wallet_number,
            balance: Decimal::ZERO,
            user_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_sufficient_funds(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_wallet_starts_empty() {
        let wallet = Wallet::new(Uuid::new_v4(), "0123456789".to_string());
        assert_eq!(wallet.balance, Decimal::ZERO);
        assert_eq!(wallet.wallet_number, "0123456789");
        assert_eq!(wallet.created_at, wallet.updated_at);
    }

    #[test]
    fn test_sufficient_funds() {
        let mut wallet = Wallet::new(Uuid::new_v4(), "0123456789".to_string());
        wallet.balance = dec!(500.00);

        assert!(wallet.has_sufficient_funds(dec!(500)));
        assert!(wallet.has_sufficient_funds(dec!(499.99)));
        assert!(!wallet.has_sufficient_funds(dec!(500.01)));
    }
}
