mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use wallet_engine::error::{AppError, Result};
use wallet_engine::models::{Transaction, TransactionStatus, TransactionType, Wallet};
use wallet_engine::repositories::{DepositOutcome, InMemoryLedgerStore, LedgerStore};
use wallet_engine::services::WalletService;

#[tokio::test]
async fn test_create_wallet_starts_empty_with_ten_digit_number() {
    let ctx = common::setup();
    let user_id = Uuid::new_v4();

    let wallet = ctx.service.create_wallet(user_id).await.unwrap();

    assert_eq!(wallet.user_id, user_id);
    assert_eq!(wallet.balance, dec!(0));
    assert_eq!(wallet.wallet_number.len(), 10);
    assert!(wallet.wallet_number.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn test_one_wallet_per_user() {
    let ctx = common::setup();
    let user_id = Uuid::new_v4();

    ctx.service.create_wallet(user_id).await.unwrap();
    let result = ctx.service.create_wallet(user_id).await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_balance_requires_existing_wallet() {
    let ctx = common::setup();

    let result = ctx.service.get_balance(Uuid::new_v4()).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_deposit_below_minimum_rejected() {
    let ctx = common::setup();
    let (user_id, _) = common::funded_wallet(&ctx, dec!(0)).await;

    let result = ctx
        .service
        .initiate_deposit(user_id, "user@example.com", dec!(99.99))
        .await;

    assert!(matches!(result, Err(AppError::InvalidOperation(_))));
    assert!(ctx.service.get_transactions(user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_deposit_initiation_records_pending_transaction() {
    let ctx = common::setup();
    let (user_id, _) = common::funded_wallet(&ctx, dec!(0)).await;

    let initiation = ctx
        .service
        .initiate_deposit(user_id, "user@example.com", dec!(5000))
        .await
        .unwrap();

    assert!(initiation.reference.starts_with("TXN_"));
    assert_eq!(
        initiation.authorization_url,
        format!("https://checkout.test/{}", initiation.reference)
    );

    let status = ctx
        .service
        .get_deposit_status(user_id, &initiation.reference)
        .await
        .unwrap();
    assert_eq!(status.status, TransactionStatus::Pending);
    assert_eq!(status.amount, dec!(5000));

    // Pending deposits never move the balance
    assert_eq!(ctx.service.get_balance(user_id).await.unwrap(), dec!(0));
}

#[tokio::test]
async fn test_gateway_failure_persists_nothing() {
    let ctx = common::setup();
    let (user_id, _) = common::funded_wallet(&ctx, dec!(0)).await;

    ctx.gateway.set_failing(true);
    let result = ctx
        .service
        .initiate_deposit(user_id, "user@example.com", dec!(5000))
        .await;

    assert!(matches!(result, Err(AppError::UpstreamUnavailable(_))));
    assert!(ctx.service.get_transactions(user_id).await.unwrap().is_empty());

    // The deposit never started, so a retry is a fresh initiation.
    ctx.gateway.set_failing(false);
    let retry = ctx
        .service
        .initiate_deposit(user_id, "user@example.com", dec!(5000))
        .await;
    assert!(retry.is_ok());
}

#[tokio::test]
async fn test_deposit_status_not_visible_across_wallets() {
    let ctx = common::setup();
    let (alice, _) = common::funded_wallet(&ctx, dec!(0)).await;
    let (bob, _) = common::funded_wallet(&ctx, dec!(0)).await;

    let initiation = ctx
        .service
        .initiate_deposit(alice, "alice@example.com", dec!(5000))
        .await
        .unwrap();

    // Bob probing Alice's reference looks identical to a missing one.
    let result = ctx.service.get_deposit_status(bob, &initiation.reference).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_transaction_history_newest_first_projection() {
    let ctx = common::setup();
    let (user_id, _) = common::funded_wallet(&ctx, dec!(1000)).await;
    let (_, recipient) = common::funded_wallet(&ctx, dec!(0)).await;

    ctx.service
        .transfer(user_id, &recipient.wallet_number, dec!(400))
        .await
        .unwrap();

    let history = ctx.service.get_transactions(user_id).await.unwrap();

    assert_eq!(history.len(), 2);
    // Newest first: the transfer happened after the funding deposit.
    assert_eq!(history[0].transaction_type, TransactionType::Transfer);
    assert_eq!(history[0].amount, dec!(400));
    assert_eq!(history[0].status, TransactionStatus::Success);
    assert_eq!(history[1].transaction_type, TransactionType::Deposit);
    assert_eq!(history[1].amount, dec!(1000));
}

/// Store wrapper that rejects the first N wallet inserts with `Conflict`,
/// simulating wallet-number collisions.
struct CollidingNumberStore {
    inner: InMemoryLedgerStore,
    remaining_collisions: AtomicUsize,
}

impl CollidingNumberStore {
    fn new(collisions: usize) -> Self {
        Self {
            inner: InMemoryLedgerStore::new(),
            remaining_collisions: AtomicUsize::new(collisions),
        }
    }
}

#[async_trait]
impl LedgerStore for CollidingNumberStore {
    async fn create_wallet(&self, wallet: Wallet) -> Result<Wallet> {
        let remaining = self.remaining_collisions.load(Ordering::SeqCst);
        if remaining > 0 {
            self.remaining_collisions
                .store(remaining - 1, Ordering::SeqCst);
            return Err(AppError::Conflict(format!(
                "wallet number '{}' already allocated",
                wallet.wallet_number
            )));
        }
        self.inner.create_wallet(wallet).await
    }

    async fn find_wallet_by_user(&self, user_id: Uuid) -> Result<Option<Wallet>> {
        self.inner.find_wallet_by_user(user_id).await
    }

    async fn find_wallet_by_number(&self, wallet_number: &str) -> Result<Option<Wallet>> {
        self.inner.find_wallet_by_number(wallet_number).await
    }

    async fn insert_transaction(&self, transaction: Transaction) -> Result<Transaction> {
        self.inner.insert_transaction(transaction).await
    }

    async fn find_wallet_transaction(
        &self,
        wallet_id: Uuid,
        reference: &str,
    ) -> Result<Option<Transaction>> {
        self.inner.find_wallet_transaction(wallet_id, reference).await
    }

    async fn list_transactions(&self, wallet_id: Uuid) -> Result<Vec<Transaction>> {
        self.inner.list_transactions(wallet_id).await
    }

    async fn settle_deposit(&self, reference: &str) -> Result<DepositOutcome> {
        self.inner.settle_deposit(reference).await
    }

    async fn fail_deposit(&self, reference: &str) -> Result<DepositOutcome> {
        self.inner.fail_deposit(reference).await
    }

    async fn transfer(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        amount: Decimal,
        transaction: Transaction,
    ) -> Result<Transaction> {
        self.inner
            .transfer(sender_id, recipient_id, amount, transaction)
            .await
    }
}

fn service_with_colliding_numbers(collisions: usize) -> WalletService {
    WalletService::new(
        Arc::new(CollidingNumberStore::new(collisions)),
        Arc::new(common::StubGateway::new()),
        common::TEST_SECRET.to_string(),
        common::CALLBACK_BASE.to_string(),
    )
}

#[tokio::test]
async fn test_wallet_number_collision_is_retried() {
    // Two collisions still leave attempts to succeed on the third draw.
    let service = service_with_colliding_numbers(2);
    let user_id = Uuid::new_v4();

    let wallet = service.create_wallet(user_id).await.unwrap();

    assert_eq!(wallet.user_id, user_id);
    assert_eq!(wallet.wallet_number.len(), 10);
}

#[tokio::test]
async fn test_wallet_number_collisions_exhaust_retries() {
    // Five straight collisions exhaust the retry budget.
    let service = service_with_colliding_numbers(5);

    let result = service.create_wallet(Uuid::new_v4()).await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}
