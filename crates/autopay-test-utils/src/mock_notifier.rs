// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording notification sink.

use async_trait::async_trait;
use tokio::sync::Mutex;

use autopay_core::error::AutopayError;
use autopay_core::types::{AutopayRule, Execution};
use autopay_core::NotificationSink;

/// A [`NotificationSink`] that records every notice it receives.
///
/// Flip `fail_next` to check that notification failures stay
/// best-effort and never affect execution outcomes.
#[derive(Default)]
pub struct MockNotifier {
    notices: Mutex<Vec<Execution>>,
    fail: Mutex<bool>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent deliveries fail.
    pub async fn fail_deliveries(&self, fail: bool) {
        *self.fail.lock().await = fail;
    }

    /// Executions notified so far, oldest first.
    pub async fn notices(&self) -> Vec<Execution> {
        self.notices.lock().await.clone()
    }

    pub async fn notice_count(&self) -> usize {
        self.notices.lock().await.len()
    }
}

#[async_trait]
impl NotificationSink for MockNotifier {
    async fn notify(
        &self,
        _rule: &AutopayRule,
        execution: &Execution,
    ) -> Result<(), AutopayError> {
        if *self.fail.lock().await {
            return Err(AutopayError::Notification("delivery refused".into()));
        }
        self.notices.lock().await.push(execution.clone());
        Ok(())
    }
}
