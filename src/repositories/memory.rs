use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{DepositOutcome, LedgerStore};
use crate::error::{AppError, Result};
use crate::models::{Transaction, TransactionStatus, Wallet};

#[derive(Default)]
struct State {
    wallets: Vec<Wallet>,
    transactions: Vec<Transaction>,
}

/// In-memory ledger store for tests and local development. A single mutex
/// guards all state, so every unit of work is serialized; the semantics
/// match the row-locked Postgres store.
#[derive(Default)]
pub struct InMemoryLedgerStore {
    state: Mutex<State>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn create_wallet(&self, wallet: Wallet) -> Result<Wallet> {
        let mut state = self.state.lock().await;

        if state.wallets.iter().any(|w| w.user_id == wallet.user_id) {
            return Err(AppError::Conflict(format!(
                "user '{}' already has a wallet",
                wallet.user_id
            )));
        }
        if state
            .wallets
            .iter()
            .any(|w| w.wallet_number == wallet.wallet_number)
        {
            return Err(AppError::Conflict(format!(
                "wallet number '{}' already allocated",
                wallet.wallet_number
            )));
        }

        state.wallets.push(wallet.clone());
        Ok(wallet)
    }

    async fn find_wallet_by_user(&self, user_id: Uuid) -> Result<Option<Wallet>> {
        let state = self.state.lock().await;
        Ok(state.wallets.iter().find(|w| w.user_id == user_id).cloned())
    }

    async fn find_wallet_by_number(&self, wallet_number: &str) -> Result<Option<Wallet>> {
        let state = self.state.lock().await;
        Ok(state
            .wallets
            .iter()
            .find(|w| w.wallet_number == wallet_number)
            .cloned())
    }

    async fn insert_transaction(&self, transaction: Transaction) -> Result<Transaction> {
        let mut state = self.state.lock().await;

        if state
            .transactions
            .iter()
            .any(|t| t.reference == transaction.reference)
        {
            return Err(AppError::Conflict(format!(
                "reference '{}' already exists",
                transaction.reference
            )));
        }

        state.transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn find_wallet_transaction(
        &self,
        wallet_id: Uuid,
        reference: &str,
    ) -> Result<Option<Transaction>> {
        let state = self.state.lock().await;
        Ok(state
            .transactions
            .iter()
            .find(|t| t.wallet_id == wallet_id && t.reference == reference)
            .cloned())
    }

    async fn list_transactions(&self, wallet_id: Uuid) -> Result<Vec<Transaction>> {
        let state = self.state.lock().await;
        let mut rows: Vec<Transaction> = state
            .transactions
            .iter()
            .rev()
            .filter(|t| t.wallet_id == wallet_id)
            .cloned()
            .collect();
        // Stable sort: ties keep the newest insertion first.
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn settle_deposit(&self, reference: &str) -> Result<DepositOutcome> {
        let mut state = self.state.lock().await;

        let position = state
            .transactions
            .iter()
            .position(|t| t.reference == reference)
            .ok_or_else(|| AppError::NotFound(format!("transaction '{}' not found", reference)))?;

        match state.transactions[position].status {
            TransactionStatus::Success => {
                return Ok(DepositOutcome::AlreadySettled(
                    state.transactions[position].clone(),
                ))
            }
            TransactionStatus::Failed => {
                return Ok(DepositOutcome::AlreadyFailed(
                    state.transactions[position].clone(),
                ))
            }
            TransactionStatus::Pending => {}
        }

        // Resolve the wallet before mutating anything so an error leaves
        // the unit of work untouched.
        let wallet_id = state.transactions[position].wallet_id;
        let wallet_position = state
            .wallets
            .iter()
            .position(|w| w.id == wallet_id)
            .ok_or_else(|| AppError::NotFound(format!("wallet '{}' not found", wallet_id)))?;

        state.transactions[position].status = TransactionStatus::Success;
        let transaction = state.transactions[position].clone();

        let wallet = &mut state.wallets[wallet_position];
        wallet.balance += transaction.amount;
        wallet.updated_at = chrono::Utc::now();
        let wallet = wallet.clone();

        Ok(DepositOutcome::Credited {
            wallet,
            transaction,
        })
    }

    async fn fail_deposit(&self, reference: &str) -> Result<DepositOutcome> {
        let mut state = self.state.lock().await;

        let position = state
            .transactions
            .iter()
            .position(|t| t.reference == reference)
            .ok_or_else(|| AppError::NotFound(format!("transaction '{}' not found", reference)))?;

        match state.transactions[position].status {
            TransactionStatus::Success => {
                return Ok(DepositOutcome::AlreadySettled(
                    state.transactions[position].clone(),
                ))
            }
            TransactionStatus::Failed => {
                return Ok(DepositOutcome::AlreadyFailed(
                    state.transactions[position].clone(),
                ))
            }
            TransactionStatus::Pending => {}
        }

        state.transactions[position].status = TransactionStatus::Failed;
        Ok(DepositOutcome::MarkedFailed(
            state.transactions[position].clone(),
        ))
    }

    async fn transfer(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        amount: Decimal,
        transaction: Transaction,
    ) -> Result<Transaction> {
        let mut state = self.state.lock().await;

        if state
            .transactions
            .iter()
            .any(|t| t.reference == transaction.reference)
        {
            return Err(AppError::Conflict(format!(
                "reference '{}' already exists",
                transaction.reference
            )));
        }

        let sender = state
            .wallets
            .iter()
            .find(|w| w.id == sender_id)
            .ok_or_else(|| AppError::NotFound(format!("wallet '{}' not found", sender_id)))?;
        if !sender.has_sufficient_funds(amount) {
            return Err(AppError::InsufficientBalance {
                available: sender.balance,
                requested: amount,
            });
        }
        state
            .wallets
            .iter()
            .find(|w| w.id == recipient_id)
            .ok_or_else(|| AppError::NotFound(format!("wallet '{}' not found", recipient_id)))?;

        let now = chrono::Utc::now();
        for wallet in state.wallets.iter_mut() {
            if wallet.id == sender_id {
                wallet.balance -= amount;
                wallet.updated_at = now;
            } else if wallet.id == recipient_id {
                wallet.balance += amount;
                wallet.updated_at = now;
            }
        }

        state.transactions.push(transaction.clone());
        Ok(transaction)
    }
}
