use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{DepositOutcome, LedgerStore};
use crate::error::{AppError, Result};
use crate::models::{Transaction, TransactionStatus, Wallet};

const WALLET_COLUMNS: &str = "id, wallet_number, balance, user_id, created_at, updated_at";
const TRANSACTION_COLUMNS: &str = "id, reference, type, amount, status, wallet_id, recipient_wallet_number, authorization_url, created_at";

/// Postgres-backed ledger store. Read-modify-write sequences take row
/// locks (`SELECT ... FOR UPDATE`) inside a single database transaction;
/// transfers lock both wallets in ascending id order so two transfers in
/// opposite directions between the same pair cannot deadlock.
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_insert_error(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(format!(
            "duplicate value for constraint '{}'",
            db.constraint().unwrap_or("unknown")
        )),
        _ => AppError::Database(e),
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn create_wallet(&self, wallet: Wallet) -> Result<Wallet> {
        let row = sqlx::query_as::<_, Wallet>(&format!(
            r#"
            INSERT INTO wallets (id, wallet_number, balance, user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {WALLET_COLUMNS}
            "#,
        ))
        .bind(wallet.id)
        .bind(&wallet.wallet_number)
        .bind(wallet.balance)
        .bind(wallet.user_id)
        .bind(wallet.created_at)
        .bind(wallet.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(row)
    }

    async fn find_wallet_by_user(&self, user_id: Uuid) -> Result<Option<Wallet>> {
        let row = sqlx::query_as::<_, Wallet>(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallets WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    async fn find_wallet_by_number(&self, wallet_number: &str) -> Result<Option<Wallet>> {
        let row = sqlx::query_as::<_, Wallet>(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallets WHERE wallet_number = $1"
        ))
        .bind(wallet_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    async fn insert_transaction(&self, transaction: Transaction) -> Result<Transaction> {
        let row = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            INSERT INTO transactions (id, reference, type, amount, status, wallet_id, recipient_wallet_number, authorization_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {TRANSACTION_COLUMNS}
            "#,
        ))
        .bind(transaction.id)
        .bind(&transaction.reference)
        .bind(transaction.transaction_type)
        .bind(transaction.amount)
        .bind(transaction.status)
        .bind(transaction.wallet_id)
        .bind(&transaction.recipient_wallet_number)
        .bind(&transaction.authorization_url)
        .bind(transaction.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(row)
    }

    async fn find_wallet_transaction(
        &self,
        wallet_id: Uuid,
        reference: &str,
    ) -> Result<Option<Transaction>> {
        let row = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE wallet_id = $1 AND reference = $2"
        ))
        .bind(wallet_id)
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    async fn list_transactions(&self, wallet_id: Uuid) -> Result<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE wallet_id = $1 ORDER BY created_at DESC"
        ))
        .bind(wallet_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    async fn settle_deposit(&self, reference: &str) -> Result<DepositOutcome> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Lock the transaction row first; the idempotency gate must sit in
        // the same scope as the credit.
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE reference = $1 FOR UPDATE"
        ))
        .bind(reference)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound(format!("transaction '{}' not found", reference)))?;

        match transaction.status {
            TransactionStatus::Success => {
                tx.rollback().await.map_err(AppError::Database)?;
                return Ok(DepositOutcome::AlreadySettled(transaction));
            }
            TransactionStatus::Failed => {
                tx.rollback().await.map_err(AppError::Database)?;
                return Ok(DepositOutcome::AlreadyFailed(transaction));
            }
            TransactionStatus::Pending => {}
        }

        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            UPDATE transactions SET status = 'success'
            WHERE id = $1
            RETURNING {TRANSACTION_COLUMNS}
            "#,
        ))
        .bind(transaction.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        let wallet = sqlx::query_as::<_, Wallet>(&format!(
            r#"
            UPDATE wallets SET balance = balance + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {WALLET_COLUMNS}
            "#,
        ))
        .bind(transaction.wallet_id)
        .bind(transaction.amount)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok(DepositOutcome::Credited {
            wallet,
            transaction,
        })
    }

    async fn fail_deposit(&self, reference: &str) -> Result<DepositOutcome> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE reference = $1 FOR UPDATE"
        ))
        .bind(reference)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound(format!("transaction '{}' not found", reference)))?;

        match transaction.status {
            TransactionStatus::Success => {
                tx.rollback().await.map_err(AppError::Database)?;
                return Ok(DepositOutcome::AlreadySettled(transaction));
            }
            TransactionStatus::Failed => {
                tx.rollback().await.map_err(AppError::Database)?;
                return Ok(DepositOutcome::AlreadyFailed(transaction));
            }
            TransactionStatus::Pending => {}
        }

        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            UPDATE transactions SET status = 'failed'
            WHERE id = $1
            RETURNING {TRANSACTION_COLUMNS}
            "#,
        ))
        .bind(transaction.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok(DepositOutcome::MarkedFailed(transaction))
    }

    async fn transfer(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        amount: Decimal,
        transaction: Transaction,
    ) -> Result<Transaction> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Lock both wallets in ascending id order.
        let locked = sqlx::query_as::<_, Wallet>(&format!(
            r#"
            SELECT {WALLET_COLUMNS} FROM wallets
            WHERE id = $1 OR id = $2
            ORDER BY id
            FOR UPDATE
            "#,
        ))
        .bind(sender_id)
        .bind(recipient_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        let sender = locked
            .iter()
            .find(|w| w.id == sender_id)
            .ok_or_else(|| AppError::NotFound(format!("wallet '{}' not found", sender_id)))?;
        locked
            .iter()
            .find(|w| w.id == recipient_id)
            .ok_or_else(|| AppError::NotFound(format!("wallet '{}' not found", recipient_id)))?;

        // Authoritative balance check, under the lock.
        if !sender.has_sufficient_funds(amount) {
            let available = sender.balance;
            tx.rollback().await.map_err(AppError::Database)?;
            return Err(AppError::InsufficientBalance {
                available,
                requested: amount,
            });
        }

        sqlx::query(
            "UPDATE wallets SET balance = balance - $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(sender_id)
        .bind(amount)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        sqlx::query(
            "UPDATE wallets SET balance = balance + $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(recipient_id)
        .bind(amount)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            INSERT INTO transactions (id, reference, type, amount, status, wallet_id, recipient_wallet_number, authorization_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {TRANSACTION_COLUMNS}
            "#,
        ))
        .bind(transaction.id)
        .bind(&transaction.reference)
        .bind(transaction.transaction_type)
        .bind(transaction.amount)
        .bind(transaction.status)
        .bind(transaction.wallet_id)
        .bind(&transaction.recipient_wallet_number)
        .bind(&transaction.authorization_url)
        .bind(transaction.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_insert_error)?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok(transaction)
    }
}
