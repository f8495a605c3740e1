use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Error taxonomy for the wallet ledger.
///
/// Business-rule failures carry their specific kind so callers can map them
/// to user-visible outcomes; storage failures roll back the enclosing unit
/// of work and surface as `Database`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        available: Decimal,
        requested: Decimal,
    },

    #[error("invalid webhook signature")]
    InvalidSignature,

    #[error("payment gateway unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl AppError {
    /// Stable machine-readable code used in API error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidOperation(_) => "INVALID_OPERATION",
            AppError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            AppError::InvalidSignature => "INVALID_SIGNATURE",
            AppError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            AppError::Conflict(_) => "CONFLICT",
            AppError::PermissionDenied(_) => "PERMISSION_DENIED",
            AppError::Database(_) | AppError::Config(_) => "INTERNAL_ERROR",
        }
    }
}
