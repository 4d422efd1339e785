use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use std::fmt;

/// Students and enrollments per cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CycleSummary {
    pub cycle: i32,
    pub total_students: i64,
    pub total_enrollments: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CourseDemand {
    pub code: String,
    pub course_name: String,
    pub cycle: i32,
    pub credits: i32,
    pub total_enrollments: i64,
    pub unique_students: i64,
}

/// Grade statistics over every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PerformanceStats {
    pub total_evaluations: i64,
    pub average_grade: Option<Decimal>,
    pub max_grade: Option<Decimal>,
    pub min_grade: Option<Decimal>,
    pub total_passed: i64,
    pub total_failed: i64,
    pub pass_percentage: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CoursePerformance {
    pub code: String,
    pub course_name: String,
    pub evaluations: i64,
    pub average_grade: Option<Decimal>,
    pub passed: i64,
    pub failed: i64,
    pub pass_percentage: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicPerformance {
    pub general_stats: PerformanceStats,
    pub by_course: Vec<CoursePerformance>,
}

/// One enrollment of a recent cycle with its grade, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CycleGradeRow {
    pub cycle: i32,
    pub student_name: String,
    pub code: String,
    pub course_name: String,
    pub grade: Option<Decimal>,
    pub passed: Option<bool>,
    pub evaluated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct LatestCycleGradeRow {
    pub student_name: String,
    pub dni: String,
    pub code: String,
    pub course_name: String,
    pub credits: i32,
    pub grade: Option<Decimal>,
    pub passed: Option<bool>,
    pub evaluated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestCycleGrades {
    pub cycle: i32,
    pub grades: Vec<LatestCycleGradeRow>,
}

/// Outcome of an enrollment as shown in grade reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradeStatus {
    #[serde(rename = "APROBADO")]
    Passed,
    #[serde(rename = "DESAPROBADO")]
    Failed,
    #[serde(rename = "SIN EVALUAR")]
    NotEvaluated,
}

impl GradeStatus {
    pub fn from_passed(passed: Option<bool>) -> Self {
        match passed {
            Some(true) => GradeStatus::Passed,
            Some(false) => GradeStatus::Failed,
            None => GradeStatus::NotEvaluated,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GradeStatus::Passed => "APROBADO",
            GradeStatus::Failed => "DESAPROBADO",
            GradeStatus::NotEvaluated => "SIN EVALUAR",
        }
    }
}

impl fmt::Display for GradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw row behind the grades-by-cycle report.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct GradeRecord {
    pub cycle: i32,
    pub student_name: String,
    pub code: String,
    pub course_name: String,
    pub credits: i32,
    pub grade: Option<Decimal>,
    pub passed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeStatusRow {
    pub cycle: i32,
    pub student_name: String,
    pub code: String,
    pub course_name: String,
    pub credits: i32,
    pub grade: Option<Decimal>,
    pub status: GradeStatus,
}

impl From<GradeRecord> for GradeStatusRow {
    fn from(record: GradeRecord) -> Self {
        Self {
            cycle: record.cycle,
            student_name: record.student_name,
            code: record.code,
            course_name: record.course_name,
            credits: record.credits,
            grade: record.grade,
            status: GradeStatus::from_passed(record.passed),
        }
    }
}

/// Grades report for either one cycle or every cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GradesByCycle {
    Single {
        cycle: i32,
        total_records: usize,
        grades: Vec<GradeStatusRow>,
    },
    All {
        total_cycles: usize,
        total_records: usize,
        by_cycle: BTreeMap<i32, Vec<GradeStatusRow>>,
    },
}

impl GradesByCycle {
    pub fn single(cycle: i32, records: Vec<GradeRecord>) -> Self {
        let grades: Vec<GradeStatusRow> = records.into_iter().map(GradeStatusRow::from).collect();
        GradesByCycle::Single {
            cycle,
            total_records: grades.len(),
            grades,
        }
    }

    /// Groups rows by cycle, preserving the input order within each cycle.
    pub fn grouped(records: Vec<GradeRecord>) -> Self {
        let total_records = records.len();
        let mut by_cycle: BTreeMap<i32, Vec<GradeStatusRow>> = BTreeMap::new();
        for record in records {
            by_cycle
                .entry(record.cycle)
                .or_default()
                .push(GradeStatusRow::from(record));
        }
        GradesByCycle::All {
            total_cycles: by_cycle.len(),
            total_records,
            by_cycle,
        }
    }

    pub fn total_records(&self) -> usize {
        match self {
            GradesByCycle::Single { total_records, .. } | GradesByCycle::All { total_records, .. } => {
                *total_records
            }
        }
    }
}
