// src/lifecycle/policy.rs

//! Policy rules consulted by the engine: due-date comparison, resubmission
//! eligibility and grading bounds.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::LifecycleError;
use crate::models::{assignment::Assignment, submission::SubmissionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Timeliness {
    OnTime,
    Late,
}

impl Timeliness {
    pub fn submitted_state(self) -> SubmissionState {
        match self {
            Timeliness::OnTime => SubmissionState::SubmittedOnTime,
            Timeliness::Late => SubmissionState::SubmittedLate,
        }
    }
}

/// `Late` iff `submitted_at` is strictly after the due date.
/// Both sides are `DateTime<Utc>`, so there is no timezone ambiguity at the boundary.
pub fn compute_timeliness(assignment: &Assignment, submitted_at: DateTime<Utc>) -> Timeliness {
    match assignment.due_at {
        Some(due_at) if submitted_at > due_at => Timeliness::Late,
        _ => Timeliness::OnTime,
    }
}

/// Whether the due date has passed at `now`. Used for missing detection.
pub fn is_past_due(assignment: &Assignment, now: DateTime<Utc>) -> bool {
    compute_timeliness(assignment, now) == Timeliness::Late
}

/// A student with a record may submit again only when the assignment allows it.
pub fn check_resubmission(assignment: &Assignment, has_record: bool) -> Result<(), LifecycleError> {
    if has_record && !assignment.allow_resubmission {
        return Err(LifecycleError::ResubmissionNotAllowed(assignment.id));
    }
    Ok(())
}

/// Inclusive bounds `0 <= score <= max_score`. NaN is rejected.
pub fn check_score(assignment: &Assignment, score: f64) -> Result<(), LifecycleError> {
    if !(0.0..=assignment.max_score).contains(&score) {
        return Err(LifecycleError::ScoreOutOfRange {
            score,
            max: assignment.max_score,
        });
    }
    Ok(())
}

/// Blank text counts as absent.
pub fn normalize_text(content: Option<String>) -> Option<String> {
    content.filter(|c| !c.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn assignment(due_at: Option<DateTime<Utc>>) -> Assignment {
        Assignment {
            id: 1,
            lesson_id: 1,
            title: "Essay".to_string(),
            description: None,
            due_at,
            max_score: 100.0,
            is_published: true,
            allow_resubmission: false,
        }
    }

    fn due() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 20, 23, 59, 59).unwrap()
    }

    #[test]
    fn test_timeliness_boundary_is_on_time() {
        let a = assignment(Some(due()));

        assert_eq!(compute_timeliness(&a, due() - Duration::seconds(1)), Timeliness::OnTime);
        assert_eq!(compute_timeliness(&a, due()), Timeliness::OnTime);
        assert_eq!(compute_timeliness(&a, due() + Duration::seconds(1)), Timeliness::Late);
    }

    #[test]
    fn test_timeliness_compares_instants_across_offsets() {
        let a = assignment(Some(due()));
        // 2024-01-21T01:00:00+02:00 is 2024-01-20T23:00:00Z.
        let local = chrono::FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 21, 1, 0, 0)
            .unwrap();

        assert_eq!(
            compute_timeliness(&a, local.with_timezone(&Utc)),
            Timeliness::OnTime
        );
    }

    #[test]
    fn test_no_due_date_is_never_late() {
        let a = assignment(None);
        let far_future = Utc.with_ymd_and_hms(2999, 1, 1, 0, 0, 0).unwrap();

        assert_eq!(compute_timeliness(&a, far_future), Timeliness::OnTime);
        assert!(!is_past_due(&a, far_future));
    }

    #[test]
    fn test_check_score_bounds() {
        let a = assignment(Some(due()));

        assert!(check_score(&a, 0.0).is_ok());
        assert!(check_score(&a, 100.0).is_ok());
        assert_eq!(
            check_score(&a, 100.01),
            Err(LifecycleError::ScoreOutOfRange { score: 100.01, max: 100.0 })
        );
        assert!(check_score(&a, -0.5).is_err());
        assert!(check_score(&a, f64::NAN).is_err());
    }

    #[test]
    fn test_check_resubmission() {
        let mut a = assignment(Some(due()));

        assert!(check_resubmission(&a, false).is_ok());
        assert_eq!(
            check_resubmission(&a, true),
            Err(LifecycleError::ResubmissionNotAllowed(1))
        );

        a.allow_resubmission = true;
        assert!(check_resubmission(&a, true).is_ok());
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text(None), None);
        assert_eq!(normalize_text(Some("   \n".to_string())), None);
        assert_eq!(normalize_text(Some(" x ".to_string())), Some(" x ".to_string()));
    }
}
