//! Error types for leadflow.
//!
//! Stage-level API failures never escape the sequencer: they are recorded on
//! the stage as `error` status. The types here cover what does escape, i.e.
//! illegal transitions, assignment submission failures, configuration
//! problems and cancellation.

use std::collections::HashMap;
use thiserror::Error;

use crate::core::{StageKey, StageStatus};

/// The main error type for leadflow operations.
#[derive(Debug, Error)]
pub enum LeadflowError {
    /// An illegal state-machine transition was attempted.
    #[error("{0}")]
    Transition(#[from] TransitionError),

    /// The assignment form could not be submitted.
    #[error("{0}")]
    Assignment(#[from] AssignmentError),

    /// Configuration was invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The session was closed while the flow was running.
    #[error("Flow cancelled: {0}")]
    Cancelled(String),
}

/// Errors returned by the lead API client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request could not be sent or the connection failed.
    #[error("{endpoint}: transport error: {message}")]
    Transport {
        /// Endpoint label, e.g. `POST /lead/duplicate-check`.
        endpoint: String,
        /// Underlying error text.
        message: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("{endpoint}: request timed out")]
    Timeout {
        /// Endpoint label.
        endpoint: String,
    },

    /// The backend answered with a non-2xx status.
    #[error("{endpoint}: HTTP {status}: {body}")]
    Status {
        /// Endpoint label.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The response body did not match the expected schema.
    #[error("{endpoint}: could not decode response: {message}")]
    Decode {
        /// Endpoint label.
        endpoint: String,
        /// Decoder error text.
        message: String,
    },
}

impl ApiError {
    /// Creates a transport error.
    #[must_use]
    pub fn transport(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Creates a status error.
    #[must_use]
    pub fn status(endpoint: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            endpoint: endpoint.into(),
            status,
            body: body.into(),
        }
    }

    /// Creates a decode error.
    #[must_use]
    pub fn decode(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Returns the endpoint label.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Transport { endpoint, .. }
            | Self::Timeout { endpoint }
            | Self::Status { endpoint, .. }
            | Self::Decode { endpoint, .. } => endpoint,
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        let kind = match self {
            Self::Transport { .. } => "transport",
            Self::Timeout { .. } => "timeout",
            Self::Status { status, .. } => {
                map.insert("status".to_string(), serde_json::json!(status));
                "status"
            }
            Self::Decode { .. } => "decode",
        };
        map.insert("type".to_string(), serde_json::json!(kind));
        map.insert("endpoint".to_string(), serde_json::json!(self.endpoint()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Error raised when a transition is not legal in the current flow state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The stage is not in a status that allows this transition.
    #[error("Stage '{stage}' is {actual}, expected {expected}")]
    UnexpectedStatus {
        /// The stage.
        stage: StageKey,
        /// Its current status.
        actual: StageStatus,
        /// What the transition requires.
        expected: &'static str,
    },

    /// A stage was started before its predecessor finished.
    #[error("Stage '{stage}' cannot start: '{blocking}' is {status}")]
    OutOfOrder {
        /// The stage that was asked to start.
        stage: StageKey,
        /// The predecessor that has not finished.
        blocking: StageKey,
        /// The predecessor's status.
        status: StageStatus,
    },

    /// The outcome is not valid for the stage.
    #[error("Stage '{stage}' cannot resolve to {outcome}")]
    InvalidOutcome {
        /// The stage.
        stage: StageKey,
        /// The rejected outcome.
        outcome: &'static str,
    },

    /// The outcome carries data produced by a different stage.
    #[error("Stage '{stage}' cannot carry a {payload} payload")]
    PayloadMismatch {
        /// The stage being resolved.
        stage: StageKey,
        /// Kind of the rejected payload.
        payload: &'static str,
    },
}

/// Errors raised by the assignment form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignmentError {
    /// The owner field is empty.
    #[error("Please select an owner before completing the assignment")]
    MissingOwner,

    /// The flow is not waiting for an assignment.
    #[error("Assignment is not awaiting input (stage is {0})")]
    NotAwaitingAssignment(StageStatus),

    /// The assignment update call failed.
    #[error("Failed to assign lead: {0}")]
    Api(#[from] ApiError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A URL could not be parsed.
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),

    /// A numeric setting could not be parsed.
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),

    /// A config file could not be read or parsed.
    #[error("could not load config from {path}: {message}")]
    File {
        /// The file path.
        path: String,
        /// What went wrong.
        message: String,
    },
}
