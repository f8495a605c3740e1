use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::api::requests::{CreateWalletRequest, DepositRequest, TransferRequest, ValidationError};
use crate::api::responses::{
    ApiResponse, BalanceResponse, ErrorResponse, HealthResponse, ValidationErrorDetail,
    WalletResponse,
};
use crate::auth::{CallerContext, Capability};
use crate::error::AppError;
use crate::services::{
    DepositInitiation, DepositStatus, TransactionSummary, TransferReceipt, WebhookAck,
};
use crate::webhook;

use super::routes::AppState;

type ApiError = (StatusCode, Json<ApiResponse<()>>);
type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn error_response(context: &str, error: AppError) -> ApiError {
    let status = match &error {
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::InvalidOperation(_) | AppError::InsufficientBalance { .. } => {
            StatusCode::BAD_REQUEST
        }
        AppError::InvalidSignature => StatusCode::BAD_REQUEST,
        AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        AppError::Database(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let body = if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("{}: {}", context, error);
        ErrorResponse::new(error.code(), "An internal error occurred")
    } else {
        ErrorResponse::new(error.code(), error.to_string())
    };

    (status, Json(ApiResponse::<()>::error(body)))
}

fn validation_response(errors: Vec<ValidationError>) -> ApiError {
    let details: Vec<ValidationErrorDetail> = errors
        .into_iter()
        .map(|e| ValidationErrorDetail {
            field: e.field,
            message: e.message,
        })
        .collect();

    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error(
            ErrorResponse::new("VALIDATION_ERROR", "Request validation failed")
                .with_details(details),
        )),
    )
}

/// Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let db_healthy = match &state.pool {
        Some(pool) => sqlx::query("SELECT 1").fetch_one(pool).await.is_ok(),
        None => true,
    };

    Json(ApiResponse::success(HealthResponse {
        status: if db_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        database: db_healthy,
    }))
}

/// Readiness check endpoint.
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    let ready = match &state.pool {
        Some(pool) => sqlx::query("SELECT 1").fetch_one(pool).await.is_ok(),
        None => true,
    };

    if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Liveness check endpoint.
pub async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

/// Prometheus metrics endpoint.
pub async fn metrics_endpoint(State(state): State<AppState>) -> Result<String, StatusCode> {
    match &state.metrics_handle {
        Some(handle) => Ok(handle.render()),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// Provisions the wallet for a newly created user. Invoked by the user
/// service, exactly once per user.
pub async fn create_wallet(
    State(state): State<AppState>,
    Json(request): Json<CreateWalletRequest>,
) -> Result<(StatusCode, Json<ApiResponse<WalletResponse>>), ApiError> {
    match state.service.create_wallet(request.user_id).await {
        Ok(wallet) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::success(WalletResponse::from(wallet))),
        )),
        Err(e) => Err(error_response("Failed to create wallet", e)),
    }
}

/// Current balance of the caller's wallet.
pub async fn get_balance(
    State(state): State<AppState>,
    caller: CallerContext,
) -> ApiResult<BalanceResponse> {
    caller
        .require(Capability::Read)
        .map_err(|e| error_response("Balance permission check failed", e))?;

    match state.service.get_balance(caller.user_id).await {
        Ok(balance) => Ok(Json(ApiResponse::success(BalanceResponse { balance }))),
        Err(e) => Err(error_response("Failed to get balance", e)),
    }
}

/// Starts a deposit and returns the hosted-checkout redirect.
pub async fn initiate_deposit(
    State(state): State<AppState>,
    caller: CallerContext,
    Json(request): Json<DepositRequest>,
) -> ApiResult<DepositInitiation> {
    caller
        .require(Capability::Deposit)
        .map_err(|e| error_response("Deposit permission check failed", e))?;
    request.validate().map_err(validation_response)?;

    match state
        .service
        .initiate_deposit(caller.user_id, caller.email_or_default(), request.amount)
        .await
    {
        Ok(initiation) => Ok(Json(ApiResponse::success(initiation))),
        Err(e) => Err(error_response("Failed to initiate deposit", e)),
    }
}

/// Inbound gateway notification. The signature is verified over the raw
/// body bytes before the payload is parsed or anything is mutated.
pub async fn paystack_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<WebhookAck> {
    let signature = headers
        .get(webhook::SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    match state
        .service
        .handle_gateway_notification(signature, &body)
        .await
    {
        Ok(ack) => Ok(Json(ApiResponse::success(ack))),
        Err(e) => Err(error_response("Webhook processing failed", e)),
    }
}

/// Status of a deposit owned by the caller's wallet.
pub async fn get_deposit_status(
    State(state): State<AppState>,
    caller: CallerContext,
    Path(reference): Path<String>,
) -> ApiResult<DepositStatus> {
    match state
        .service
        .get_deposit_status(caller.user_id, &reference)
        .await
    {
        Ok(status) => Ok(Json(ApiResponse::success(status))),
        Err(e) => Err(error_response("Failed to get deposit status", e)),
    }
}

/// Transfers funds to another wallet by wallet number.
pub async fn transfer(
    State(state): State<AppState>,
    caller: CallerContext,
    Json(request): Json<TransferRequest>,
) -> ApiResult<TransferReceipt> {
    caller
        .require(Capability::Transfer)
        .map_err(|e| error_response("Transfer permission check failed", e))?;
    request.validate().map_err(validation_response)?;

    match state
        .service
        .transfer(caller.user_id, &request.wallet_number, request.amount)
        .await
    {
        Ok(receipt) => Ok(Json(ApiResponse::success(receipt))),
        Err(e) => Err(error_response("Failed to transfer", e)),
    }
}

/// Transaction history for the caller's wallet, newest first.
pub async fn get_transactions(
    State(state): State<AppState>,
    caller: CallerContext,
) -> ApiResult<Vec<TransactionSummary>> {
    caller
        .require(Capability::Read)
        .map_err(|e| error_response("History permission check failed", e))?;

    match state.service.get_transactions(caller.user_id).await {
        Ok(transactions) => Ok(Json(ApiResponse::success(transactions))),
        Err(e) => Err(error_response("Failed to list transactions", e)),
    }
}
