//! Assertions over flow state and history.

use crate::core::{StageKey, StageStatus};
use crate::flow::LeadFlow;

/// Asserts that a stage has the expected status.
pub fn assert_stage_status(flow: &LeadFlow, stage: StageKey, expected: StageStatus) {
    let actual = flow.status(stage);
    assert_eq!(
        actual, expected,
        "Expected {} to be {:?}, got {:?}",
        stage, expected, actual
    );
}

/// Asserts that a stage was completed by a manual override.
pub fn assert_manual_override(flow: &LeadFlow, stage: StageKey) {
    let state = flow.stage(stage);
    assert_eq!(state.status, StageStatus::Success, "{stage} was not overridden");
    assert!(
        state.is_manual(),
        "Expected {} to carry manual data, got {:?}",
        stage,
        state.data
    );
}

/// Asserts that the automated history followed the stage order.
///
/// Each stage must go `pending -> running -> terminal` and must not start
/// before its predecessor reached a terminal status. Manual overrides and
/// the final assignment are ignored.
pub fn assert_stage_order(flow: &LeadFlow) {
    let mut current: Option<StageKey> = None;

    for record in flow.history().iter().filter(|r| !r.manual) {
        match record.to {
            StageStatus::Running => {
                assert_eq!(
                    record.from,
                    StageStatus::Pending,
                    "{} started from {:?}",
                    record.stage,
                    record.from
                );
                let expected = current.map_or(Some(StageKey::RecordCreated), StageKey::next);
                assert_eq!(
                    Some(record.stage),
                    expected,
                    "{} started out of order",
                    record.stage
                );
                current = Some(record.stage);
            }
            _ if record.from == StageStatus::Running => {
                assert_eq!(
                    Some(record.stage),
                    current,
                    "{} resolved while not running",
                    record.stage
                );
            }
            // Assignment submission: manual -> success.
            _ => {}
        }
    }
}
