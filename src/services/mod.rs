pub mod wallet_service;

pub use wallet_service::{
    DepositInitiation, DepositStatus, TransactionSummary, TransferReceipt, WalletService,
    WebhookAck,
};
