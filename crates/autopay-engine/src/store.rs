// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rule store: the single source of truth for rule state.
//!
//! Every component mutates rules exclusively through this store. The
//! scheduler holds rules by id only and re-reads them on each tick, so no
//! two components ever race on rule fields.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::warn;

use autopay_core::error::AutopayError;
use autopay_core::types::{AutopayRule, RuleId};

/// Patch for rule updates. Only `Some` fields are applied.
#[derive(Debug, Clone, Default)]
pub struct RulePatch {
    pub active: Option<bool>,
    pub last_triggered: Option<DateTime<Utc>>,
}

/// Registry of autopay rules.
///
/// Operations are async for backend flexibility, but callers treat them
/// as synchronous steps within a tick: every mutation is awaited inline.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Insert a new rule. Fails on a duplicate id.
    async fn insert(&self, rule: AutopayRule) -> Result<(), AutopayError>;

    /// Apply a patch, returning the updated rule.
    ///
    /// `last_triggered` is monotonic: a patch carrying an earlier
    /// timestamp than the stored one is ignored for that field.
    async fn update(&self, id: &RuleId, patch: RulePatch) -> Result<AutopayRule, AutopayError>;

    /// Fetch a rule by id.
    async fn get(&self, id: &RuleId) -> Result<Option<AutopayRule>, AutopayError>;

    /// Remove a rule. Returns `false` when the rule did not exist.
    async fn delete(&self, id: &RuleId) -> Result<bool, AutopayError>;

    /// All rules, in unspecified order.
    async fn list(&self) -> Result<Vec<AutopayRule>, AutopayError>;

    /// Rules with `active == true`.
    async fn list_active(&self) -> Result<Vec<AutopayRule>, AutopayError>;
}

/// In-memory rule store.
///
/// The shipped backend: persistence technology is out of scope for the
/// engine, and the store trait is the seam a durable backend would
/// implement.
#[derive(Default)]
pub struct MemoryRuleStore {
    rules: RwLock<HashMap<RuleId, AutopayRule>>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn insert(&self, rule: AutopayRule) -> Result<(), AutopayError> {
        let mut rules = self.rules.write().await;
        if rules.contains_key(&rule.id) {
            return Err(AutopayError::Internal(format!(
                "duplicate rule id {}",
                rule.id
            )));
        }
        rules.insert(rule.id.clone(), rule);
        Ok(())
    }

    async fn update(&self, id: &RuleId, patch: RulePatch) -> Result<AutopayRule, AutopayError> {
        let mut rules = self.rules.write().await;
        let rule = rules
            .get_mut(id)
            .ok_or_else(|| AutopayError::RuleNotFound(id.clone()))?;

        if let Some(active) = patch.active {
            rule.active = active;
        }
        if let Some(triggered) = patch.last_triggered {
            if rule.last_triggered.is_none_or(|prev| triggered >= prev) {
                rule.last_triggered = Some(triggered);
            } else {
                warn!(
                    rule_id = %id,
                    %triggered,
                    "ignoring non-monotonic last_triggered update"
                );
            }
        }
        Ok(rule.clone())
    }

    async fn get(&self, id: &RuleId) -> Result<Option<AutopayRule>, AutopayError> {
        Ok(self.rules.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &RuleId) -> Result<bool, AutopayError> {
        Ok(self.rules.write().await.remove(id).is_some())
    }

    async fn list(&self) -> Result<Vec<AutopayRule>, AutopayError> {
        Ok(self.rules.read().await.values().cloned().collect())
    }

    async fn list_active(&self) -> Result<Vec<AutopayRule>, AutopayError> {
        Ok(self
            .rules
            .read()
            .await
            .values()
            .filter(|r| r.active)
            .cloned()
            .collect())
    }
}
