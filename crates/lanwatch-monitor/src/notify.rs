//! Notification channel: LINE Notify client plus a log-only fallback.
//!
//! Delivery is best effort. Failures are logged and never fail a cycle.

use std::future::Future;
use std::time::Duration;

use lanwatch_core::events::Notification;

const LINE_NOTIFY_URL: &str = "https://notify-api.line.me/api/notify";

/// Errors from the notification channel.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Notification channel rejected message: {0}")]
    Rejected(String),
}

/// A sink that accepts rendered message text.
pub trait Notifier {
    fn notify(&self, message: &str) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Posts messages to LINE Notify with a bearer token.
pub struct LineNotifier {
    client: reqwest::Client,
    token: String,
}

impl LineNotifier {
    pub fn new(token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.to_string(),
        }
    }
}

impl Notifier for LineNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(LINE_NOTIFY_URL)
            .bearer_auth(&self.token)
            .form(&[("message", message)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().to_string()));
        }
        Ok(())
    }
}

/// Logs messages instead of sending them. Used when notifications are disabled.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        tracing::info!(text = message, "Notification (channel disabled)");
        Ok(())
    }
}

/// Send one message, logging instead of propagating a failure.
pub async fn send<N: Notifier>(notifier: &N, message: &str) -> bool {
    match notifier.notify(message).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, text = message, "Notification delivery failed");
            false
        }
    }
}

/// Render and send `events` in order, pausing between successive new-device
/// notifications. Returns how many were delivered.
pub async fn dispatch<N: Notifier>(
    notifier: &N,
    events: &[Notification],
    station_name: &str,
    pause: Duration,
) -> usize {
    let mut delivered = 0;
    let mut last_was_new = false;

    for event in events {
        if event.is_new_device() && last_was_new && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }

        let message = event.render(station_name);
        tracing::info!(kind = event.kind(), text = %message, "Sending notification");
        if send(notifier, &message).await {
            delivered += 1;
        }
        last_was_new = event.is_new_device();
    }

    delivered
}
