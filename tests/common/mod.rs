//! Common test infrastructure
//!
//! Fixture data and shared constants for the end-to-end pipeline tests.
//! Tests should only import from this module, not from internal submodules.

mod constants;
mod fixtures;

// Public API - this is what tests import
pub use constants::*;
pub use fixtures::{create_test_data, TestData};
