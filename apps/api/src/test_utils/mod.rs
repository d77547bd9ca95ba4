//! Test utilities for use case and route tests.
//!
//! This module provides:
//! - Test data factories for creating valid test fixtures
//! - In-memory implementations of every port, with inspection helpers
//! - `TestAppStateBuilder` for constructing an `AppState` over those mocks

mod app_state_builder;
mod auth_mocks;
mod billing_mocks;
mod chart_mocks;
mod factories;

pub use app_state_builder::*;
pub use auth_mocks::*;
pub use billing_mocks::*;
pub use chart_mocks::*;
pub use factories::*;
