//! Implements the `Notifier` trait in memory for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a chat bot.

use crate::error::NotificationDeliveryError;
use crate::notify::{DeliveryResult, Notifier};
use std::sync::{Arc, Mutex};
use tracing::info;

/// Keeps every message it is sent. Clones share the same message list.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    messages: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl MemoryNotifier {
    /// A notifier that rejects every message.
    pub fn failing() -> Self {
        Self {
            messages: Arc::default(),
            fail: true,
        }
    }

    /// The messages received so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, text: &str) -> DeliveryResult {
        if self.fail {
            return Err(NotificationDeliveryError(
                "the in-memory notifier is set to fail".to_string(),
            ));
        }
        info!("Test mode notification:\n{text}");
        let mut guard = match self.messages.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(text.to_string());
        Ok(())
    }
}
