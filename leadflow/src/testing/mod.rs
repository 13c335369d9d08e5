//! Testing utilities for lead flows.
//!
//! This module provides:
//! - A scripted in-memory lead API
//! - Fixtures for lead data and API responses
//! - Assertions over flow state and history

mod assertions;
pub mod fixtures;
mod mocks;

pub use assertions::{assert_manual_override, assert_stage_order, assert_stage_status};
pub use mocks::{ApiCall, ScriptedLeadApi};
