// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for autopay integration tests.
//!
//! Mock implementations of every collaborator seam (wallet, price feed,
//! notifier, clock) plus [`EngineHarness`], which wires a complete engine
//! around them for end-to-end tests.

pub mod harness;
pub mod manual_clock;
pub mod mock_ledger;
pub mod mock_notifier;
pub mod mock_price;
pub mod mock_wallet;

pub use harness::{EngineHarness, EngineHarnessBuilder};
pub use manual_clock::ManualClock;
pub use mock_ledger::MockLedger;
pub use mock_notifier::MockNotifier;
pub use mock_price::MockPriceFeed;
pub use mock_wallet::MockWallet;
