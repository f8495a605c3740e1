use std::collections::HashSet;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::responses::{ApiResponse, ErrorResponse};
use crate::error::{AppError, Result};

/// Header set by the upstream auth layer after it has authenticated the
/// caller (JWT or API key). The ledger trusts this boundary.
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
/// Comma-separated capability list for API-key callers. Absent for
/// JWT-authenticated callers, which are unrestricted.
pub const CAPABILITIES_HEADER: &str = "x-capabilities";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Deposit,
    Transfer,
    Read,
}

impl Capability {
    fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "deposit" => Some(Capability::Deposit),
            "transfer" => Some(Capability::Transfer),
            "read" => Some(Capability::Read),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Capability::Deposit => "deposit",
            Capability::Transfer => "transfer",
            Capability::Read => "read",
        }
    }
}

/// The caller's already-validated capability set. JWT callers are
/// unrestricted; API-key callers carry an explicit scope.
#[derive(Debug, Clone)]
pub enum CapabilitySet {
    Unrestricted,
    Scoped(HashSet<Capability>),
}

impl CapabilitySet {
    pub fn allows(&self, capability: Capability) -> bool {
        match self {
            CapabilitySet::Unrestricted => true,
            CapabilitySet::Scoped(set) => set.contains(&capability),
        }
    }
}

/// Authenticated caller identity handed in by the excluded auth layer.
/// Capability checks happen here, at the API boundary; the ledger engine
/// never re-checks them.
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub capabilities: CapabilitySet,
}

impl CallerContext {
    pub fn unrestricted(user_id: Uuid) -> Self {
        Self {
            user_id,
            email: None,
            capabilities: CapabilitySet::Unrestricted,
        }
    }

    pub fn require(&self, capability: Capability) -> Result<()> {
        if self.capabilities.allows(capability) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied(format!(
                "missing '{}' permission",
                capability.name()
            )))
        }
    }

    /// Checkout email for deposits, with the original system's fallback.
    pub fn email_or_default(&self) -> &str {
        self.email.as_deref().unwrap_or("user@example.com")
    }
}

fn unauthenticated(message: &str) -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::<()>::error(ErrorResponse::new(
            "UNAUTHENTICATED",
            message,
        ))),
    )
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CallerContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ApiResponse<()>>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthenticated("missing caller identity"))?;
        let user_id = Uuid::parse_str(user_id)
            .map_err(|_| unauthenticated("malformed caller identity"))?;

        let email = parts
            .headers
            .get(USER_EMAIL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let capabilities = match parts
            .headers
            .get(CAPABILITIES_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            None => CapabilitySet::Unrestricted,
            Some(raw) => {
                let mut set = HashSet::new();
                for token in raw.split(',').filter(|t| !t.trim().is_empty()) {
                    let capability = Capability::parse(token)
                        .ok_or_else(|| unauthenticated("unknown capability in scope"))?;
                    set.insert(capability);
                }
                CapabilitySet::Scoped(set)
            }
        };

        Ok(CallerContext {
            user_id,
            email,
            capabilities,
        })
    }
}
