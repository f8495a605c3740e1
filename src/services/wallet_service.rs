use std::sync::Arc;

use metrics::counter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::gateway::{self, CheckoutRequest, PaymentGateway};
use crate::models::{Transaction, TransactionStatus, TransactionType, Wallet};
use crate::reference::{self, ReferenceGenerator};
use crate::repositories::{DepositOutcome, LedgerStore};
use crate::webhook::{self, GatewayEvent};

/// Minimum deposit amount in major units.
pub const MIN_DEPOSIT: Decimal = Decimal::ONE_HUNDRED;

/// Attempts at allocating a unique wallet number before giving up.
const WALLET_NUMBER_ATTEMPTS: usize = 5;

/// Result of initiating a deposit: the idempotency reference and the
/// hosted-checkout URL the caller is redirected to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositInitiation {
    pub reference: String,
    pub authorization_url: String,
}

/// Deposit status projection owned by the requesting wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositStatus {
    pub reference: String,
    pub status: TransactionStatus,
    pub amount: Decimal,
}

/// Result of a committed transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub status: String,
    pub message: String,
}

/// History projection. Internal identifiers and gateway handles are not
/// exposed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSummary {
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub status: TransactionStatus,
}

/// Acknowledgment body returned to the gateway for every accepted
/// notification, duplicate deliveries included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub status: bool,
}

impl WebhookAck {
    pub fn ok() -> Self {
        Self { status: true }
    }
}

/// The ledger engine. Orchestrates deposit initiation, webhook-driven
/// crediting and peer transfers; owns all invariants and hands every
/// read-modify-write to the store as one atomic unit of work.
///
/// Callers are already authenticated and permission-checked at the API
/// boundary; the engine only consumes the caller's user id.
pub struct WalletService {
    store: Arc<dyn LedgerStore>,
    gateway: Arc<dyn PaymentGateway>,
    webhook_secret: String,
    callback_base_url: String,
}

impl WalletService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        gateway: Arc<dyn PaymentGateway>,
        webhook_secret: String,
        callback_base_url: String,
    ) -> Self {
        Self {
            store,
            gateway,
            webhook_secret,
            callback_base_url: callback_base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn wallet_for_user(&self, user_id: Uuid) -> Result<Wallet> {
        self.store
            .find_wallet_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Wallet not found".to_string()))
    }

    /// Creates the user's single wallet with a fresh wallet number and a
    /// zero balance. Wallet-number collisions are retried; a duplicate
    /// user surfaces as `Conflict`.
    pub async fn create_wallet(&self, user_id: Uuid) -> Result<Wallet> {
        if self.store.find_wallet_by_user(user_id).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "user '{}' already has a wallet",
                user_id
            )));
        }

        let mut last_conflict = None;
        for _ in 0..WALLET_NUMBER_ATTEMPTS {
            let wallet = Wallet::new(user_id, reference::generate_wallet_number());
            match self.store.create_wallet(wallet).await {
                Ok(wallet) => {
                    info!(user_id = %user_id, wallet_number = %wallet.wallet_number, "wallet created");
                    counter!("wallet_created_total").increment(1);
                    return Ok(wallet);
                }
                Err(AppError::Conflict(msg)) => {
                    last_conflict = Some(AppError::Conflict(msg));
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_conflict
            .unwrap_or_else(|| AppError::Conflict("could not allocate wallet number".to_string())))
    }

    pub async fn get_balance(&self, user_id: Uuid) -> Result<Decimal> {
        Ok(self.wallet_for_user(user_id).await?.balance)
    }

    /// Starts an external deposit: opens a hosted-checkout session with
    /// the gateway, then records a pending transaction holding the
    /// checkout handle. If the gateway call fails nothing is persisted;
    /// the caller retries with a fresh initiation.
    pub async fn initiate_deposit(
        &self,
        user_id: Uuid,
        email: &str,
        amount: Decimal,
    ) -> Result<DepositInitiation> {
        if amount < MIN_DEPOSIT {
            return Err(AppError::InvalidOperation(format!(
                "deposit amount must be at least {}",
                MIN_DEPOSIT
            )));
        }

        let wallet = self.wallet_for_user(user_id).await?;
        let reference = ReferenceGenerator::deposit();

        let session = self
            .gateway
            .init_checkout(CheckoutRequest {
                reference: reference.clone(),
                amount,
                email: email.to_string(),
                callback_url: format!(
                    "{}/wallet/deposit/{}/status",
                    self.callback_base_url, reference
                ),
            })
            .await?;

        let transaction = Transaction::deposit(
            reference.clone(),
            amount,
            wallet.id,
            session.authorization_url.clone(),
        );
        self.store.insert_transaction(transaction).await?;

        info!(reference = %reference, "deposit initiated");
        counter!("wallet_deposits_initiated_total").increment(1);

        Ok(DepositInitiation {
            reference,
            authorization_url: session.authorization_url,
        })
    }

    /// The crediting path. Verifies the signature over the raw payload
    /// bytes before anything else, then applies success/failure events
    /// through the store's atomic settlement. Duplicate deliveries are a
    /// no-op success, never an error.
    pub async fn handle_gateway_notification(
        &self,
        signature: &str,
        payload: &[u8],
    ) -> Result<WebhookAck> {
        if !webhook::verify_signature(&self.webhook_secret, payload, signature) {
            counter!("wallet_webhooks_rejected_total").increment(1);
            return Err(AppError::InvalidSignature);
        }

        let event: GatewayEvent = serde_json::from_slice(payload).map_err(|e| {
            AppError::InvalidOperation(format!("malformed gateway payload: {e}"))
        })?;

        match event.event.as_str() {
            webhook::CHARGE_SUCCESS => {
                match self.store.settle_deposit(&event.data.reference).await? {
                    DepositOutcome::Credited {
                        wallet,
                        transaction,
                    } => {
                        // The credited amount is the one recorded at
                        // initiation, not the payload's.
                        let reported = gateway::from_minor_units(event.data.amount);
                        if reported != transaction.amount {
                            warn!(
                                reference = %transaction.reference,
                                %reported,
                                recorded = %transaction.amount,
                                "gateway-reported amount differs from initiated amount"
                            );
                            counter!("wallet_webhook_amount_mismatch_total").increment(1);
                        }
                        info!(
                            reference = %transaction.reference,
                            wallet_number = %wallet.wallet_number,
                            amount = %transaction.amount,
                            "deposit settled"
                        );
                        counter!("wallet_deposits_settled_total").increment(1);
                    }
                    DepositOutcome::AlreadySettled(transaction) => {
                        info!(reference = %transaction.reference, "duplicate delivery, deposit already settled");
                    }
                    DepositOutcome::AlreadyFailed(transaction) => {
                        warn!(reference = %transaction.reference, "success notification for terminally failed deposit, not credited");
                    }
                    // Settlement never marks a deposit failed.
                    DepositOutcome::MarkedFailed(_) => {}
                }
                Ok(WebhookAck::ok())
            }
            webhook::CHARGE_FAILED => {
                match self.store.fail_deposit(&event.data.reference).await? {
                    DepositOutcome::MarkedFailed(transaction) => {
                        info!(reference = %transaction.reference, "deposit marked failed");
                        counter!("wallet_deposits_failed_total").increment(1);
                    }
                    DepositOutcome::AlreadySettled(transaction) => {
                        warn!(reference = %transaction.reference, "failure notification for settled deposit, ignored");
                    }
                    DepositOutcome::AlreadyFailed(_) | DepositOutcome::Credited { .. } => {}
                }
                Ok(WebhookAck::ok())
            }
            // The gateway sends many event types; only charge outcomes are
            // actionable here.
            _ => Ok(WebhookAck::ok()),
        }
    }

    /// Status of a deposit owned by the caller's wallet. A reference that
    /// belongs to another wallet is indistinguishable from a missing one.
    pub async fn get_deposit_status(
        &self,
        user_id: Uuid,
        reference: &str,
    ) -> Result<DepositStatus> {
        let wallet = self.wallet_for_user(user_id).await?;
        let transaction = self
            .store
            .find_wallet_transaction(wallet.id, reference)
            .await?
            .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))?;

        Ok(DepositStatus {
            reference: transaction.reference,
            status: transaction.status,
            amount: transaction.amount,
        })
    }

    /// Moves funds between two wallets atomically. The debit, the credit
    /// and the sender-side transaction record commit together or not at
    /// all; the store re-checks the sender balance under its lock.
    pub async fn transfer(
        &self,
        user_id: Uuid,
        recipient_wallet_number: &str,
        amount: Decimal,
    ) -> Result<TransferReceipt> {
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidOperation(
                "transfer amount must be positive".to_string(),
            ));
        }

        let sender = self.wallet_for_user(user_id).await?;
        let recipient = self
            .store
            .find_wallet_by_number(recipient_wallet_number)
            .await?
            .ok_or_else(|| {
                AppError::InvalidOperation("Recipient wallet not found".to_string())
            })?;

        if sender.id == recipient.id {
            return Err(AppError::InvalidOperation(
                "Cannot transfer to your own wallet".to_string(),
            ));
        }

        // Advisory pre-check; the authoritative check happens inside the
        // store's locked unit of work.
        if !sender.has_sufficient_funds(amount) {
            return Err(AppError::InsufficientBalance {
                available: sender.balance,
                requested: amount,
            });
        }

        let transaction = Transaction::transfer(
            ReferenceGenerator::transfer(),
            amount,
            sender.id,
            recipient.wallet_number.clone(),
        );
        let transaction = self
            .store
            .transfer(sender.id, recipient.id, amount, transaction)
            .await?;

        info!(
            reference = %transaction.reference,
            amount = %amount,
            "transfer completed"
        );
        counter!("wallet_transfers_total").increment(1);

        Ok(TransferReceipt {
            status: "success".to_string(),
            message: "Transfer completed".to_string(),
        })
    }

    /// All transactions for the caller's wallet, newest first.
    pub async fn get_transactions(&self, user_id: Uuid) -> Result<Vec<TransactionSummary>> {
        let wallet = self.wallet_for_user(user_id).await?;
        let transactions = self.store.list_transactions(wallet.id).await?;

        Ok(transactions
            .into_iter()
            .map(|t| TransactionSummary {
                transaction_type: t.transaction_type,
                amount: t.amount,
                status: t.status,
            })
            .collect())
    }
}
