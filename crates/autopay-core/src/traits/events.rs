// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event bus trait for event-based conditions.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::AutopayError;
use crate::types::DomainEvent;

/// Delivers domain events the engine subscribes to for event-based
/// conditions.
///
/// Each subscription yields its own buffered receiver, so two rules
/// watching the same event type each observe (and consume) their own copy
/// of every matching event.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Subscribe to events of the given type.
    async fn subscribe(
        &self,
        event_type: &str,
    ) -> Result<mpsc::Receiver<DomainEvent>, AutopayError>;
}
