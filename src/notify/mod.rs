//! Sends human-readable messages about changes to a chat channel.
//!
//! Delivery is best-effort. A message that cannot be delivered is logged and dropped, it never
//! affects the store mutation that caused it.

pub mod message;
mod memory;
mod webhook;

use crate::error::NotificationDeliveryError;
use crate::{Config, Result};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use memory::MemoryNotifier;
pub use webhook::WebhookNotifier;

/// The result type of `Notifier` operations.
pub type DeliveryResult = std::result::Result<(), NotificationDeliveryError>;

/// An outbound channel that accepts plain-text messages.
#[async_trait::async_trait]
pub trait Notifier: Debug + Send + Sync {
    /// Sends `text` as a single message.
    async fn send(&self, text: &str) -> DeliveryResult;
}

/// Which notifier to use.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum Mode {
    /// Send messages to the configured webhook.
    #[default]
    Webhook,
    /// Keep messages in memory. Used in tests and when `EXPENSES_IN_TEST_MODE` is set.
    Testing,
}

impl Mode {
    /// `Mode::Testing` when `EXPENSES_IN_TEST_MODE` is set and non-empty, otherwise
    /// `Mode::Webhook`.
    pub fn from_env() -> Self {
        match std::env::var("EXPENSES_IN_TEST_MODE") {
            Ok(s) if !s.is_empty() => Mode::Testing,
            _ => Mode::Webhook,
        }
    }
}

/// Used when no chat or token has been configured. Messages are only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> DeliveryResult {
        info!("Notifications are not configured, not sending:\n{text}");
        Ok(())
    }
}

/// Wraps a `Notifier` and makes every delivery best-effort.
#[derive(Debug, Clone)]
pub struct Notifications {
    notifier: Arc<dyn Notifier>,
}

impl Notifications {
    pub fn new(notifier: impl Notifier + 'static) -> Self {
        Self {
            notifier: Arc::new(notifier),
        }
    }

    /// Builds the notifier for `mode` from the settings in `config`.
    pub async fn from_config(config: &Config, mode: Mode) -> Result<Self> {
        if mode == Mode::Testing {
            debug!("Test mode, notifications are kept in memory");
            return Ok(Self::new(MemoryNotifier::default()));
        }

        let settings = config.notify();
        let token = config.notify_token().await?;
        match (token, settings.chat_id()) {
            (Some(token), Some(chat_id)) => Ok(Self::new(WebhookNotifier::new(
                settings.endpoint(),
                token,
                chat_id,
                settings.timeout(),
            )?)),
            (None, _) => {
                debug!(
                    "No notification token in {} or {}",
                    crate::config::NOTIFY_TOKEN_ENV,
                    config.notify_token_path().display()
                );
                Ok(Self::new(LogNotifier))
            }
            (_, None) => {
                debug!("No chat_id configured in {}", config.config_path().display());
                Ok(Self::new(LogNotifier))
            }
        }
    }

    /// Sends `text`. Failures are logged and swallowed. Returns whether the message was accepted.
    pub async fn deliver(&self, text: &str) -> bool {
        match self.notifier.send(text).await {
            Ok(()) => {
                debug!("Notification delivered");
                true
            }
            Err(e) => {
                warn!("{e}");
                false
            }
        }
    }
}
