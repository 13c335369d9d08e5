//! Core domain model types for leadflow.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Stage key and status enums
//! - Per-stage state and typed payloads
//! - Flow events

mod event;
mod payload;
mod state;
mod status;

pub use event::FlowEvent;
pub use payload::{AssignmentRecord, StagePayload};
pub use state::StageState;
pub use status::{StageKey, StageStatus};
