//! # Leadflow
//!
//! Lead-intake automation: a six-stage sequence that creates a lead record,
//! checks for duplicates, enriches, validates and scores the lead, then
//! hands it to a human for assignment.
//!
//! - **Explicit state machine**: [`flow::LeadFlow`] changes only through a
//!   pure transition function
//! - **Sequential automation**: stages run one at a time against a
//!   [`api::LeadApi`]; failures land on the stage instead of aborting
//! - **Manual completion**: any `warning`/`error` stage can be forced to
//!   `success` with operator-entered data
//! - **Observability**: every transition is emitted to an
//!   [`events::EventSink`] and logged through `tracing`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use leadflow::prelude::*;
//!
//! let config = LeadflowConfig::from_env()?;
//! let api = Arc::new(HttpLeadApi::new(&config.api)?);
//! let sequencer = StageSequencer::new(api).with_pacing(config.pacing);
//!
//! let mut session = LeadSession::new("LEAD-001", LeadData::new("Acme Textiles"), sequencer);
//! session.run_automation().await?;
//!
//! if let Some(draft) = session.draft_mut() {
//!     draft.owner = "Priya Sharma".to_string();
//! }
//! println!("{}", session.submit_assignment().await?);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod api;
pub mod cancellation;
pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod flow;
pub mod observability;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    #[cfg(feature = "http")]
    pub use crate::api::HttpLeadApi;
    pub use crate::api::{FollowUpSla, LeadApi, LeadData, ScoreCard};
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::{ApiConfig, LeadflowConfig, PacingConfig};
    pub use crate::core::{FlowEvent, StageKey, StagePayload, StageState, StageStatus};
    pub use crate::errors::{ApiError, AssignmentError, LeadflowError, TransitionError};
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::flow::{
        AssignmentDraft, FlowPhase, FlowSummary, LeadFlow, LeadSession, OverrideBuffer,
        StageOutcome, StageSequencer, Transition,
    };
    pub use crate::utils::{generate_uuid, iso_timestamp, Timestamp};
}
