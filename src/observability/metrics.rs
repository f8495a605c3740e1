use metrics::{describe_counter, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the Prometheus recorder and registers metric descriptions.
/// Safe to call more than once; the first installation wins.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = METRICS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();

    Ok(METRICS_HANDLE.get_or_init(|| handle).clone())
}

fn describe_metrics() {
    describe_counter!(
        "wallet_created_total",
        Unit::Count,
        "Total wallets provisioned"
    );
    describe_counter!(
        "wallet_deposits_initiated_total",
        Unit::Count,
        "Total deposit checkout sessions opened"
    );
    describe_counter!(
        "wallet_deposits_settled_total",
        Unit::Count,
        "Total deposits credited after gateway confirmation"
    );
    describe_counter!(
        "wallet_deposits_failed_total",
        Unit::Count,
        "Total deposits marked failed by the gateway"
    );
    describe_counter!(
        "wallet_transfers_total",
        Unit::Count,
        "Total committed peer transfers"
    );
    describe_counter!(
        "wallet_webhooks_rejected_total",
        Unit::Count,
        "Total gateway notifications rejected for a bad signature"
    );
    describe_counter!(
        "wallet_webhook_amount_mismatch_total",
        Unit::Count,
        "Gateway notifications whose amount differed from the initiated amount"
    );
}
