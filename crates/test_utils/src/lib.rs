//! Test Utilities
//!
//! Shared fixtures, builders, and assertions for the settlement test suite.
//! Builders construct domain aggregates in any reachable state by walking
//! the real transition tables, so tests never fabricate illegal states.

pub mod fixtures;
pub mod builders;
pub mod assertions;

pub use fixtures::{IdFixtures, MoneyFixtures, StringFixtures};
pub use builders::{TestOrderBuilder, TestPaymentBuilder};
pub use assertions::assert_settlement_consistent;
