//! Per-stage state.

use serde::{Deserialize, Serialize};

use super::{StageKey, StagePayload, StageStatus};
use crate::utils::{now, Timestamp};

/// The state of one stage within a flow.
///
/// `error` is set if and only if `status` is [`StageStatus::Error`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageState {
    /// Which stage this is.
    pub stage: StageKey,
    /// Current status.
    pub status: StageStatus,
    /// Stage result, once there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<StagePayload>,
    /// Failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the state last changed.
    pub updated_at: Timestamp,
}

impl StageState {
    /// Creates a pending stage.
    #[must_use]
    pub fn pending(stage: StageKey) -> Self {
        Self {
            stage,
            status: StageStatus::Pending,
            data: None,
            error: None,
            updated_at: now(),
        }
    }

    /// Creates a running stage.
    #[must_use]
    pub fn running(stage: StageKey) -> Self {
        Self {
            status: StageStatus::Running,
            ..Self::pending(stage)
        }
    }

    pub(crate) fn set(
        &mut self,
        status: StageStatus,
        data: Option<StagePayload>,
        error: Option<String>,
    ) {
        debug_assert_eq!(status == StageStatus::Error, error.is_some());
        self.status = status;
        self.data = data;
        self.error = error;
        self.updated_at = now();
    }

    /// Returns true if the stage data came from a manual override.
    #[must_use]
    pub fn is_manual(&self) -> bool {
        self.data.as_ref().is_some_and(StagePayload::is_manual)
    }
}
