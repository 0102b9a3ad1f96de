//! # Metrics Collection
//!
//! Prometheus counters for authentication and session activity. Until
//! [`init_metrics`] installs the exporter the global recorder is absent and
//! every `record_*` helper is a no-op.

use crate::config::ObservabilityConfig;
use crate::errors::{Result, StorefrontError};
use ::tracing::{info, warn};
use metrics::{counter, describe_counter, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Metrics recorder that tracks application metrics
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    pub fn new() -> Self {
        Self
    }

    /// Record an authentication attempt outcome (`success` or an error label)
    pub fn record_authentication(&self, status: &str) {
        let labels = [("status", status.to_string())];
        counter!("auth_authentications_total", &labels).increment(1);
    }

    pub fn record_registration(&self, status: &str) {
        let labels = [("status", status.to_string())];
        counter!("auth_registrations_total", &labels).increment(1);
    }

    pub fn record_session_rotated(&self) {
        counter!("auth_sessions_rotated_total").increment(1);
    }

    pub fn record_sessions_revoked(&self, count: u64) {
        counter!("auth_sessions_revoked_total").increment(count);
    }

    pub fn record_activation_email(&self, delivered: bool) {
        let status = if delivered { "delivered" } else { "failed" };
        let labels = [("status", status.to_string())];
        counter!("auth_activation_emails_total", &labels).increment(1);
    }

    /// Describe authentication metrics
    pub fn register_auth_metrics(&self) {
        describe_counter!(
            "auth_authentications_total",
            Unit::Count,
            "Authentication attempts by outcome"
        );
        describe_counter!(
            "auth_registrations_total",
            Unit::Count,
            "Registration attempts by outcome"
        );
        describe_counter!(
            "auth_sessions_rotated_total",
            Unit::Count,
            "Session rows created or rotated to a new refresh token"
        );
        describe_counter!(
            "auth_sessions_revoked_total",
            Unit::Count,
            "Session rows deleted by logout or revocation"
        );
        describe_counter!(
            "auth_activation_emails_total",
            Unit::Count,
            "Activation email dispatch outcomes"
        );

        counter!("auth_sessions_rotated_total").absolute(0);
        counter!("auth_sessions_revoked_total").absolute(0);
    }
}

/// Global metrics recorder instance
static METRICS: once_cell::sync::Lazy<Arc<RwLock<Option<MetricsRecorder>>>> =
    once_cell::sync::Lazy::new(|| Arc::new(RwLock::new(None)));

/// Initialize metrics collection and Prometheus exporter
pub async fn init_metrics(config: &ObservabilityConfig) -> Result<()> {
    if !config.enable_metrics {
        return Ok(());
    }

    let metrics_addr = match config.metrics_bind_address() {
        Some(addr) => addr,
        None => {
            warn!("Metrics disabled: no bind address configured");
            return Ok(());
        }
    };

    let socket_addr: SocketAddr = metrics_addr.parse().map_err(|e| {
        StorefrontError::config(format!("Invalid metrics bind address '{}': {}", metrics_addr, e))
    })?;

    PrometheusBuilder::new()
        .with_http_listener(socket_addr)
        .add_global_label("service", &config.service_name)
        .install()
        .map_err(|e| {
            StorefrontError::config(format!("Failed to initialize metrics exporter: {}", e))
        })?;

    let recorder = MetricsRecorder::new();
    {
        let mut metrics = METRICS.write().await;
        *metrics = Some(recorder.clone());
    }
    recorder.register_auth_metrics();

    info!(
        metrics_addr = %metrics_addr,
        service_name = %config.service_name,
        "Metrics collection initialized"
    );

    Ok(())
}

/// Get the global metrics recorder
pub async fn get_metrics() -> Option<MetricsRecorder> {
    METRICS.read().await.clone()
}

pub async fn record_authentication(status: &str) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_authentication(status);
    }
}

pub async fn record_registration(status: &str) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_registration(status);
    }
}

pub async fn record_session_rotated() {
    if let Some(metrics) = get_metrics().await {
        metrics.record_session_rotated();
    }
}

pub async fn record_sessions_revoked(count: u64) {
    if count == 0 {
        return;
    }
    if let Some(metrics) = get_metrics().await {
        metrics.record_sessions_revoked(count);
    }
}

pub async fn record_activation_email(delivered: bool) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_activation_email(delivered);
    }
}
