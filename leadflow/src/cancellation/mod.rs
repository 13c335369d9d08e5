//! Cooperative cancellation for running flows.
//!
//! A session owns one [`CancellationToken`]; closing the session cancels it,
//! which aborts the in-flight API call and stops the sequencer.

mod token;

pub use token::CancellationToken;
