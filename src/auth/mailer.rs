//! Activation email dispatch.
//!
//! Delivery itself is an external concern behind [`ActivationMailer`].
//! [`MailDispatcher`] hands each send to a tracked background task so the
//! registering request never waits on, or fails because of, the mail server.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::task::TaskTracker;
use tracing::{info, warn, Instrument, Span};

use crate::errors::Result;
use crate::observability::metrics;

#[async_trait]
pub trait ActivationMailer: Send + Sync {
    async fn send_activation_email(&self, to: &str, activation_url: &str) -> Result<()>;
}

/// Mailer that only logs the activation URL. Used when no mail transport is configured.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl ActivationMailer for LogMailer {
    async fn send_activation_email(&self, to: &str, activation_url: &str) -> Result<()> {
        info!(recipient = %to, activation_url = %activation_url, "activation email (log transport)");
        Ok(())
    }
}

#[derive(Clone)]
pub struct MailDispatcher {
    mailer: Arc<dyn ActivationMailer>,
    tracker: TaskTracker,
    activation_base_url: String,
}

impl MailDispatcher {
    pub fn new(mailer: Arc<dyn ActivationMailer>, activation_base_url: impl Into<String>) -> Self {
        Self { mailer, tracker: TaskTracker::new(), activation_base_url: activation_base_url.into() }
    }

    pub fn activation_url(&self, activation_link: &str) -> String {
        format!("{}/{}", self.activation_base_url.trim_end_matches('/'), activation_link)
    }

    /// Queue an activation email. Failures are logged and counted, never returned.
    pub fn dispatch_activation(&self, email: &str, activation_link: &str) {
        let mailer = Arc::clone(&self.mailer);
        let to = email.to_string();
        let url = self.activation_url(activation_link);

        // Runs under the registering request's span
        self.tracker.spawn(
            async move {
                match mailer.send_activation_email(&to, &url).await {
                    Ok(()) => metrics::record_activation_email(true).await,
                    Err(e) => {
                        warn!(recipient = %to, error = %e, "failed to send activation email");
                        metrics::record_activation_email(false).await;
                    }
                }
            }
            .instrument(Span::current()),
        );
    }

    /// Number of sends still in flight
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting new sends and wait for in-flight ones.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}
