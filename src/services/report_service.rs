use crate::error::Result;
use crate::models::{
    AcademicPerformance, CourseDemand, CycleGradeRow, CycleSummary, GradesByCycle,
    LatestCycleGrades,
};
use crate::repositories::ReportRepository;
use sqlx::PgPool;

/// How many recent cycles the recent-grades report covers.
pub const RECENT_CYCLES: i64 = 3;

/// Service for the read-only academic reports.
pub struct ReportService {
    report_repo: ReportRepository,
}

impl ReportService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            report_repo: ReportRepository::new(pool),
        }
    }

    pub async fn students_per_cycle(&self) -> Result<Vec<CycleSummary>> {
        self.report_repo.students_per_cycle().await
    }

    pub async fn most_demanded_courses(&self) -> Result<Vec<CourseDemand>> {
        self.report_repo.most_demanded_courses().await
    }

    pub async fn academic_performance(&self) -> Result<AcademicPerformance> {
        let general_stats = self.report_repo.performance_stats().await?;
        let by_course = self.report_repo.performance_by_course().await?;

        Ok(AcademicPerformance {
            general_stats,
            by_course,
        })
    }

    /// Grades of the most recent cycles. Empty if nobody is enrolled.
    pub async fn recent_cycle_grades(&self) -> Result<Vec<CycleGradeRow>> {
        let cycles = self.report_repo.latest_cycles(RECENT_CYCLES).await?;
        if cycles.is_empty() {
            return Ok(Vec::new());
        }
        self.report_repo.grades_for_cycles(&cycles).await
    }

    /// Grades of the latest cycle, or `None` if nobody is enrolled.
    pub async fn latest_cycle_grades(&self) -> Result<Option<LatestCycleGrades>> {
        let Some(cycle) = self.report_repo.latest_cycles(1).await?.into_iter().next() else {
            return Ok(None);
        };

        let grades = self.report_repo.grades_for_cycle(cycle).await?;
        Ok(Some(LatestCycleGrades { cycle, grades }))
    }

    pub async fn grades_by_cycle(&self, cycle: Option<i32>) -> Result<GradesByCycle> {
        let records = self.report_repo.grade_records(cycle).await?;

        Ok(match cycle {
            Some(cycle) => GradesByCycle::single(cycle, records),
            None => GradesByCycle::grouped(records),
        })
    }
}
