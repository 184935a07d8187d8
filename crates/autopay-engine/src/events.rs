// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local in-process event bus.
//!
//! Fans published events out to per-subscriber buffered channels, so every
//! rule watching an event type observes (and consumes) its own copy. The
//! forwarding shape follows the mpsc fan pattern used by the channel
//! multiplexer in the agent stack.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::warn;

use autopay_core::error::AutopayError;
use autopay_core::types::DomainEvent;
use autopay_core::EventBus;

/// Per-subscriber buffer depth. A subscriber that falls further behind
/// loses the newest events for that type.
const SUBSCRIBER_BUFFER: usize = 64;

/// In-process [`EventBus`] implementation.
#[derive(Default)]
pub struct LocalEventBus {
    subscribers: Mutex<HashMap<String, Vec<mpsc::Sender<DomainEvent>>>>,
}

impl LocalEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event to every live subscriber of its type.
    ///
    /// Closed subscriptions are pruned; full ones drop the event with a
    /// warning rather than blocking the publisher.
    pub async fn publish(&self, event: DomainEvent) {
        let mut subscribers = self.subscribers.lock().await;
        let Some(senders) = subscribers.get_mut(&event.event_type) else {
            return;
        };
        senders.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(event_type = %event.event_type, "subscriber buffer full, event dropped");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    /// Number of live subscriptions for an event type, for tests.
    pub async fn subscriber_count(&self, event_type: &str) -> usize {
        self.subscribers
            .lock()
            .await
            .get(event_type)
            .map_or(0, |senders| senders.len())
    }
}

#[async_trait]
impl EventBus for LocalEventBus {
    async fn subscribe(
        &self,
        event_type: &str,
    ) -> Result<mpsc::Receiver<DomainEvent>, AutopayError> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        self.subscribers
            .lock()
            .await
            .entry(event_type.to_string())
            .or_default()
            .push(tx);
        Ok(rx)
    }
}
