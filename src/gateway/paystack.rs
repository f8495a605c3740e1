use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{to_minor_units, CheckoutRequest, CheckoutSession, PaymentGateway};
use crate::error::{AppError, Result};

/// Paystack transaction-initialize client. Bearer-token authenticated;
/// amounts go over the wire in kobo.
pub struct PaystackClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl PaystackClient {
    pub fn new(base_url: String, secret_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key,
        }
    }
}

#[derive(Debug, serde::Serialize)]
struct InitializeRequest<'a> {
    email: &'a str,
    amount: i64,
    reference: &'a str,
    callback_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct InitializeResponse {
    data: InitializeData,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn init_checkout(&self, request: CheckoutRequest) -> Result<CheckoutSession> {
        let amount = to_minor_units(request.amount)?;

        let response = self
            .http
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&InitializeRequest {
                email: &request.email,
                amount,
                reference: &request.reference,
                callback_url: &request.callback_url,
            })
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "gateway returned {}",
                status
            )));
        }

        let body: InitializeResponse = response
            .json()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("malformed gateway response: {e}")))?;

        debug!(reference = %request.reference, "checkout session created");

        Ok(CheckoutSession {
            authorization_url: body.data.authorization_url,
        })
    }
}
