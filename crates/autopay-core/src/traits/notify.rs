// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification sink trait for "rule triggered" notices.

use async_trait::async_trait;

use crate::error::AutopayError;
use crate::types::{AutopayRule, Execution};

/// Fire-and-forget delivery of execution notices to the UI layer.
///
/// Strictly best-effort: the pipeline logs and swallows delivery
/// failures; they never roll back or fail an execution.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(
        &self,
        rule: &AutopayRule,
        execution: &Execution,
    ) -> Result<(), AutopayError>;
}
