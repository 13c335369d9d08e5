//! Mapping of lead API responses to stage outcomes.

use crate::api::{
    CheckResult, DuplicateCheckResponse, EnrichmentResponse, EnrichmentStatus, ScoreCard,
    ValidationResponse,
};
use crate::core::{StageKey, StagePayload};

use super::StageOutcome;

/// Maps a failed backend call to the stage's static error. The cause is
/// logged by the caller, not shown on the stage.
#[must_use]
pub fn api_failure(stage: StageKey) -> StageOutcome {
    StageOutcome::error(stage.failure_message())
}

/// No duplicates is a success; any match is a warning carrying the matches.
#[must_use]
pub fn duplicate_check(response: DuplicateCheckResponse) -> StageOutcome {
    let duplicates = response.duplicates;
    if duplicates.is_empty() {
        StageOutcome::Success(StagePayload::Duplicates { duplicates })
    } else {
        StageOutcome::Warning(StagePayload::Duplicates { duplicates })
    }
}

/// `Completed` is a success, `Partial` a warning, anything else an error.
#[must_use]
pub fn enrichment(response: EnrichmentResponse) -> StageOutcome {
    let EnrichmentResponse {
        enrichment_status,
        enriched_fields,
    } = response;

    match enrichment_status {
        EnrichmentStatus::Completed => StageOutcome::Success(StagePayload::Enrichment {
            status: EnrichmentStatus::Completed,
            enriched_fields,
        }),
        EnrichmentStatus::Partial => StageOutcome::Warning(StagePayload::Enrichment {
            status: EnrichmentStatus::Partial,
            enriched_fields,
        }),
        EnrichmentStatus::Unrecognized(value) => StageOutcome::Error {
            message: format!("Unrecognized enrichment status '{value}'"),
            data: Some(StagePayload::Enrichment {
                status: EnrichmentStatus::Unrecognized(value),
                enriched_fields,
            }),
        },
    }
}

/// Any failed check is an error; otherwise any warning (or unrecognised
/// value) is a warning; otherwise success. An empty result set succeeds.
#[must_use]
pub fn validation(response: ValidationResponse) -> StageOutcome {
    let results = response.validation_results;

    let failed: Vec<&str> = results
        .iter()
        .filter(|(_, result)| **result == CheckResult::Failed)
        .map(|(name, _)| name.as_str())
        .collect();

    if !failed.is_empty() {
        let message = format!("Validation failed: {}", failed.join(", "));
        return StageOutcome::Error {
            message,
            data: Some(StagePayload::Validation { results }),
        };
    }

    let inconclusive = results
        .values()
        .any(|result| matches!(result, CheckResult::Warning | CheckResult::Unrecognized(_)));

    let payload = StagePayload::Validation { results };
    if inconclusive {
        StageOutcome::Warning(payload)
    } else {
        StageOutcome::Success(payload)
    }
}

/// A decoded score card is always a success.
#[must_use]
pub fn scoring(card: ScoreCard) -> StageOutcome {
    StageOutcome::Success(StagePayload::Score(card))
}
