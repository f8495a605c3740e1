#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use wallet_engine::error::{AppError, Result};
use wallet_engine::gateway::{self, CheckoutRequest, CheckoutSession, PaymentGateway};
use wallet_engine::models::Wallet;
use wallet_engine::repositories::InMemoryLedgerStore;
use wallet_engine::services::WalletService;
use wallet_engine::webhook;

pub const TEST_SECRET: &str = "sk_test_0123456789abcdef";
pub const CALLBACK_BASE: &str = "https://wallet.test";

/// Gateway stub: hands out deterministic checkout URLs, or fails on
/// demand to exercise the no-partial-effects path.
pub struct StubGateway {
    failing: AtomicBool,
}

impl StubGateway {
    pub fn new() -> Self {
        Self {
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn init_checkout(&self, request: CheckoutRequest) -> Result<CheckoutSession> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::UpstreamUnavailable(
                "stub gateway configured to fail".to_string(),
            ));
        }
        Ok(CheckoutSession {
            authorization_url: format!("https://checkout.test/{}", request.reference),
        })
    }
}

pub struct TestContext {
    pub service: Arc<WalletService>,
    pub gateway: Arc<StubGateway>,
}

pub fn setup() -> TestContext {
    let store = Arc::new(InMemoryLedgerStore::new());
    let gateway = Arc::new(StubGateway::new());
    let service = Arc::new(WalletService::new(
        store,
        gateway.clone(),
        TEST_SECRET.to_string(),
        CALLBACK_BASE.to_string(),
    ));

    TestContext { service, gateway }
}

/// Builds a gateway notification with an authentic signature.
pub fn signed_event(event: &str, reference: &str, minor_amount: i64) -> (String, Vec<u8>) {
    let payload = serde_json::json!({
        "event": event,
        "data": { "reference": reference, "amount": minor_amount }
    });
    let bytes = serde_json::to_vec(&payload).expect("payload serializes");
    let signature = webhook::sign_payload(TEST_SECRET, &bytes);
    (signature, bytes)
}

/// Funds a wallet through the real deposit path: initiation followed by a
/// signed success notification.
pub async fn fund(ctx: &TestContext, user_id: Uuid, amount: Decimal) {
    let initiation = ctx
        .service
        .initiate_deposit(user_id, "funder@example.com", amount)
        .await
        .expect("deposit initiation");

    let minor = gateway::to_minor_units(amount).expect("amount converts");
    let (signature, payload) = signed_event("charge.success", &initiation.reference, minor);
    ctx.service
        .handle_gateway_notification(&signature, &payload)
        .await
        .expect("deposit settlement");
}

/// Creates a wallet for a fresh user and funds it via the deposit path.
pub async fn funded_wallet(ctx: &TestContext, amount: Decimal) -> (Uuid, Wallet) {
    let user_id = Uuid::new_v4();
    let wallet = ctx
        .service
        .create_wallet(user_id)
        .await
        .expect("wallet creation");

    if amount > Decimal::ZERO {
        fund(ctx, user_id, amount).await;
    }

    (user_id, wallet)
}
