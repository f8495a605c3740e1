use chrono::Utc;
use rand::Rng;

/// Number of random bytes appended to every reference. 8 bytes gives 64
/// bits of entropy; the unique constraint on `transactions.reference` is
/// the backstop if the improbable collision ever happens.
const REFERENCE_ENTROPY_BYTES: usize = 8;

/// Digits in an externally shareable wallet number.
pub const WALLET_NUMBER_LEN: usize = 10;

/// Generates externally shareable, globally unique transaction references:
/// a type-prefixed tag, the millisecond wall clock, and a random suffix.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceGenerator;

impl ReferenceGenerator {
    /// Reference for an external deposit, e.g. `TXN_1700000000000_9f2c...`.
    pub fn deposit() -> String {
        Self::generate("TXN")
    }

    /// Reference for a peer transfer, e.g. `TRF_1700000000000_9f2c...`.
    pub fn transfer() -> String {
        Self::generate("TRF")
    }

    fn generate(prefix: &str) -> String {
        let mut entropy = [0u8; REFERENCE_ENTROPY_BYTES];
        rand::thread_rng().fill(&mut entropy);
        format!(
            "{}_{}_{}",
            prefix,
            Utc::now().timestamp_millis(),
            hex::encode(entropy)
        )
    }
}

/// Generates a random zero-padded 10-digit wallet number. Uniqueness is
/// enforced by the ledger store; callers retry on collision.
pub fn generate_wallet_number() -> String {
    let n: u64 = rand::thread_rng().gen_range(0..10_000_000_000);
    format!("{:0width$}", n, width = WALLET_NUMBER_LEN)
}
