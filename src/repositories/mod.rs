pub mod memory;
pub mod postgres;

pub use memory::InMemoryLedgerStore;
pub use postgres::PgLedgerStore;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Transaction, Wallet};

/// Outcome of applying a gateway notification to a deposit.
#[derive(Debug, Clone)]
pub enum DepositOutcome {
    /// The deposit moved `pending -> success` and the wallet was credited.
    Credited {
        wallet: Wallet,
        transaction: Transaction,
    },
    /// The deposit moved `pending -> failed`. No balance change.
    MarkedFailed(Transaction),
    /// The reference was already `success`. Duplicate delivery; no-op.
    AlreadySettled(Transaction),
    /// The reference is terminally `failed`. Never credited.
    AlreadyFailed(Transaction),
}

/// Durable storage contract for wallets and transactions: the single
/// source of truth for balances.
///
/// Every method that both reads and writes a balance is one atomic unit of
/// work. The idempotency gate in `settle_deposit` runs inside the same
/// scope as the credit so two concurrent deliveries cannot both pass it,
/// and `transfer` serializes against any other mutation of either wallet.
/// On any error the whole unit rolls back; partial effects are never
/// observable.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Persists a new wallet. Fails with `Conflict` if the user already
    /// has a wallet or the wallet number is taken.
    async fn create_wallet(&self, wallet: Wallet) -> Result<Wallet>;

    async fn find_wallet_by_user(&self, user_id: Uuid) -> Result<Option<Wallet>>;

    async fn find_wallet_by_number(&self, wallet_number: &str) -> Result<Option<Wallet>>;

    /// Persists a transaction record. Fails with `Conflict` on a duplicate
    /// reference; this is the hard uniqueness backstop for the generator.
    async fn insert_transaction(&self, transaction: Transaction) -> Result<Transaction>;

    /// Looks up a transaction owned by a specific wallet. Returns `None`
    /// for references that exist but belong to another wallet.
    async fn find_wallet_transaction(
        &self,
        wallet_id: Uuid,
        reference: &str,
    ) -> Result<Option<Transaction>>;

    /// All transactions for a wallet, newest first.
    async fn list_transactions(&self, wallet_id: Uuid) -> Result<Vec<Transaction>>;

    /// Atomically settles a pending deposit: marks it `success` and credits
    /// the owning wallet by the amount recorded at initiation. Fails with
    /// `NotFound` for an unknown reference.
    async fn settle_deposit(&self, reference: &str) -> Result<DepositOutcome>;

    /// Atomically marks a pending deposit `failed`. Never reverses a
    /// settled deposit. Fails with `NotFound` for an unknown reference.
    async fn fail_deposit(&self, reference: &str) -> Result<DepositOutcome>;

    /// Atomically debits the sender, credits the recipient and records the
    /// sender-side transaction. The sender's balance is re-read under the
    /// lock; fails with `InsufficientBalance` if it no longer covers the
    /// amount. All three writes commit together or not at all.
    async fn transfer(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        amount: Decimal,
        transaction: Transaction,
    ) -> Result<Transaction>;
}
