// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the x402 autopay engine.
//!
//! This crate provides the collaborator trait definitions, domain types,
//! condition predicates, and error types used throughout the autopay
//! workspace. The engine crate consumes wallets, ledgers, clocks, price
//! feeds, event buses, and notification sinks exclusively through the
//! traits defined here.

pub mod condition;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use condition::{ParseError, Predicate, PriceOp, Weekday};
pub use error::AutopayError;
pub use types::{
    AutopayRule, DomainEvent, Execution, NewTransaction, RuleId, TransactionId,
    TransactionPatch, TransactionRecord, TransactionStatus, WalletRef,
};

// Re-export all collaborator traits at crate root.
pub use traits::{
    ClockSource, EventBus, LedgerStore, NotificationSink, PriceFeed, SystemClock,
    WalletGateway,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autopay_error_has_all_variants() {
        let _validation = AutopayError::Validation("test".into());
        let _parse = AutopayError::Parse(ParseError::Empty);
        let _not_found = AutopayError::RuleNotFound(RuleId("r".into()));
        let _wallet = AutopayError::Wallet {
            message: "test".into(),
            source: None,
        };
        let _ledger = AutopayError::Ledger {
            message: "test".into(),
            source: Some(Box::new(std::io::Error::other("test"))),
        };
        let _price = AutopayError::PriceFeed {
            message: "test".into(),
            source: None,
        };
        let _bus = AutopayError::EventBus("test".into());
        let _notify = AutopayError::Notification("test".into());
        let _internal = AutopayError::Internal("test".into());
    }

    #[test]
    fn parse_error_converts_into_autopay_error() {
        let err: AutopayError = ParseError::Unrecognized("gibberish".into()).into();
        assert!(matches!(err, AutopayError::Parse(_)));
        assert!(err.to_string().contains("gibberish"));
    }

    #[test]
    fn system_clock_advances() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // Compile-time check that every collaborator trait is reachable
        // through the public API.
        fn _assert_wallet<T: WalletGateway>() {}
        fn _assert_ledger<T: LedgerStore>() {}
        fn _assert_clock<T: ClockSource>() {}
        fn _assert_price<T: PriceFeed>() {}
        fn _assert_bus<T: EventBus>() {}
        fn _assert_notify<T: NotificationSink>() {}
    }
}
