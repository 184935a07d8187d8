// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The autopay engine: standing payment rules, monitored indefinitely and
//! executed exactly once per satisfied condition occurrence.
//!
//! Components, wired together by [`AutopayEngine`]:
//! - [`store`] — rule registry, the single source of truth for rule state
//! - [`condition`] — stateless per-tick predicate evaluation
//! - [`pipeline`] — funds check, ledger commit, settlement, notification
//! - [`scheduler`] — one cancellable monitor task per active rule
//! - [`events`] / [`ledger`] — shipped in-process backends for the
//!   event-bus and ledger seams

pub mod condition;
pub mod engine;
pub mod events;
pub mod ledger;
pub mod pipeline;
pub mod scheduler;
pub mod store;

pub use condition::{ConditionEvaluator, EvalContext};
pub use engine::{AutopayEngine, EngineStats};
pub use events::LocalEventBus;
pub use ledger::MemoryLedger;
pub use pipeline::ExecutionPipeline;
pub use scheduler::{MonitorState, RuleScheduler};
pub use store::{MemoryRuleStore, RulePatch, RuleStore};
