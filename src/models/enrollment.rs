use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Academic state of an enrollment.
///
/// An enrollment starts as `MATRICULADO` and moves to `APROBADO` or
/// `DESAPROBADO` when graded. Removing the grade moves it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "enrollment_status")]
pub enum EnrollmentStatus {
    #[sqlx(rename = "MATRICULADO")]
    #[serde(rename = "MATRICULADO")]
    Enrolled,
    #[sqlx(rename = "APROBADO")]
    #[serde(rename = "APROBADO")]
    Passed,
    #[sqlx(rename = "DESAPROBADO")]
    #[serde(rename = "DESAPROBADO")]
    Failed,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Enrolled => "MATRICULADO",
            EnrollmentStatus::Passed => "APROBADO",
            EnrollmentStatus::Failed => "DESAPROBADO",
        }
    }

    /// True once a grade has been recorded.
    pub fn is_graded(&self) -> bool {
        !matches!(self, EnrollmentStatus::Enrolled)
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A student's registration in a course for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub cycle: i32,
    pub enrolled_at: DateTime<Utc>,
    pub status: EnrollmentStatus,
}

/// Enrollment joined with the names it refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct EnrollmentDetail {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub cycle: i32,
    pub enrolled_at: DateTime<Utc>,
    pub status: EnrollmentStatus,
    pub student_name: String,
    pub course_name: String,
    pub course_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrollmentData {
    pub student_id: i64,
    pub course_id: i64,
    pub cycle: i32,
}
