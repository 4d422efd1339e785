use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::enrollment::EnrollmentStatus;

/// Lowest grade that passes a course (vigesimal scale).
pub const PASSING_GRADE: Decimal = Decimal::from_parts(105, 0, 0, false, 1);

pub const MAX_GRADE: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// True if the grade is at or above [`PASSING_GRADE`].
pub fn is_passing(grade: Decimal) -> bool {
    grade >= PASSING_GRADE
}

/// Enrollment status a grade moves its enrollment to.
pub fn status_for_grade(grade: Decimal) -> EnrollmentStatus {
    if is_passing(grade) {
        EnrollmentStatus::Passed
    } else {
        EnrollmentStatus::Failed
    }
}

/// True if the grade lies on the 0–20 scale.
pub fn is_valid_grade(grade: Decimal) -> bool {
    grade >= Decimal::ZERO && grade <= MAX_GRADE
}

/// The grade recorded for one enrollment. Each enrollment has at most one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Evaluation {
    pub id: i64,
    pub enrollment_id: i64,
    pub grade: Decimal,
    pub passed: bool,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct EvaluationDetail {
    pub id: i64,
    pub enrollment_id: i64,
    pub grade: Decimal,
    pub passed: bool,
    pub evaluated_at: DateTime<Utc>,
    pub student_name: String,
    pub course_name: String,
    pub cycle: i32,
}

/// An enrollment still waiting for its grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PendingEvaluation {
    pub enrollment_id: i64,
    pub student_name: String,
    pub course_name: String,
    pub cycle: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_constants() {
        assert_eq!(PASSING_GRADE, dec!(10.5));
        assert_eq!(MAX_GRADE, dec!(20));
    }

    #[test]
    fn test_pass_threshold() {
        assert!(is_passing(dec!(10.5)));
        assert!(is_passing(dec!(20)));
        assert!(!is_passing(dec!(10.49)));
        assert!(!is_passing(dec!(0)));
    }

    #[test]
    fn test_status_for_grade() {
        assert_eq!(status_for_grade(dec!(14)), EnrollmentStatus::Passed);
        assert_eq!(status_for_grade(dec!(10.4)), EnrollmentStatus::Failed);
    }

    #[test]
    fn test_grade_bounds() {
        assert!(is_valid_grade(dec!(0)));
        assert!(is_valid_grade(dec!(20.00)));
        assert!(!is_valid_grade(dec!(20.01)));
        assert!(!is_valid_grade(dec!(-1)));
    }
}
