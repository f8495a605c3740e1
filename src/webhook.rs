use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Header carrying the gateway's hex-encoded HMAC of the request body.
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Event name the gateway sends when a charge completes.
pub const CHARGE_SUCCESS: &str = "charge.success";

/// Event name the gateway sends when a charge fails.
pub const CHARGE_FAILED: &str = "charge.failed";

/// Verifies that a gateway notification was signed with the shared secret.
///
/// The HMAC-SHA-512 is computed over the exact raw payload bytes and
/// compared against the presented hex digest. The comparison goes through
/// `Mac::verify_slice`, which is constant-time. No state, no side effects.
pub fn verify_signature(secret: &str, payload: &[u8], presented: &str) -> bool {
    let presented = match hex::decode(presented.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let mut mac = match HmacSha512::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);
    mac.verify_slice(&presented).is_ok()
}

/// Computes the hex signature for a payload. Used by outbound tooling and
/// tests that need to produce authentic notifications.
pub fn sign_payload(secret: &str, payload: &[u8]) -> String {
    let mut mac =
        HmacSha512::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// A gateway notification, parsed after signature verification.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayEvent {
    pub event: String,
    pub data: GatewayEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayEventData {
    pub reference: String,
    /// Amount in the gateway's minor currency unit (kobo).
    pub amount: i64,
    #[serde(default)]
    pub status: Option<String>,
}
