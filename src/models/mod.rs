pub mod transaction;
pub mod wallet;

pub use transaction::{Transaction, TransactionStatus, TransactionType};
pub use wallet::Wallet;
