//! The lead-intake flow.
//!
//! [`LeadFlow`] is the state machine. [`StageSequencer`] drives it through
//! the automated stages, [`OverrideBuffer`] lets an operator complete a
//! stage by hand, and [`AssignmentDraft`] finishes the flow. A
//! [`LeadSession`] ties them together for one lead.

mod assignment;
mod machine;
pub mod outcome;
mod overrides;
mod sequencer;
mod session;
mod summary;


pub use assignment::AssignmentDraft;
pub use machine::{FlowPhase, LeadFlow, StageOutcome, Transition, TransitionRecord};
pub use overrides::{manual_fields, ManualFieldSpec, OverrideBuffer};
pub use sequencer::StageSequencer;
pub use session::LeadSession;
pub use summary::{FlowSummary, ManualScore};
