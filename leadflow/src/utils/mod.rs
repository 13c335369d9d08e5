//! Utility functions for identifiers and timestamps.

pub mod timestamps;

pub use timestamps::{elapsed_ms, iso_timestamp, now, Timestamp};

use uuid::Uuid;

/// Generates a new UUID v4.
#[must_use]
pub fn generate_uuid() -> Uuid {
    Uuid::new_v4()
}
