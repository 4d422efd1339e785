use crate::error::{AppError, Result};
use crate::models::{
    CourseDemand, CoursePerformance, CycleGradeRow, CycleSummary, GradeRecord,
    LatestCycleGradeRow, PerformanceStats,
};
use crate::observability::{get_metrics, LatencyTimer};
use sqlx::PgPool;

/// Read-only aggregate queries behind the reports module.
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn students_per_cycle(&self) -> Result<Vec<CycleSummary>> {
        let timer = LatencyTimer::new();
        let result = sqlx::query_as::<_, CycleSummary>(
            r#"
            SELECT m.cycle,
                   COUNT(DISTINCT m.student_id) AS total_students,
                   COUNT(m.id) AS total_enrollments
            FROM enrollments m
            INNER JOIN students a ON m.student_id = a.id
            GROUP BY m.cycle
            ORDER BY m.cycle
            "#,
        )
        .fetch_all(&self.pool)
        .await;

        get_metrics().record_db_query("students_per_cycle", timer.elapsed_ms(), result.is_ok());
        let rows = result.map_err(AppError::Database)?;
        Ok(rows)
    }

    /// Active courses with at least one enrollment, most demanded first.
    pub async fn most_demanded_courses(&self) -> Result<Vec<CourseDemand>> {
        let timer = LatencyTimer::new();
        let result = sqlx::query_as::<_, CourseDemand>(
            r#"
            SELECT c.code,
                   c.name AS course_name,
                   c.cycle,
                   c.credits,
                   COUNT(m.id) AS total_enrollments,
                   COUNT(DISTINCT m.student_id) AS unique_students
            FROM courses c
            LEFT JOIN enrollments m ON c.id = m.course_id
            WHERE c.active = TRUE
            GROUP BY c.id, c.code, c.name, c.cycle, c.credits
            HAVING COUNT(m.id) > 0
            ORDER BY total_enrollments DESC, c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await;

        get_metrics().record_db_query("most_demanded_courses", timer.elapsed_ms(), result.is_ok());
        let rows = result.map_err(AppError::Database)?;
        Ok(rows)
    }

    /// Overall grade statistics. Aggregates are NULL when nothing is graded.
    pub async fn performance_stats(&self) -> Result<PerformanceStats> {
        let timer = LatencyTimer::new();
        let result = sqlx::query_as::<_, PerformanceStats>(
            r#"
            SELECT COUNT(*) AS total_evaluations,
                   ROUND(AVG(grade), 2) AS average_grade,
                   MAX(grade) AS max_grade,
                   MIN(grade) AS min_grade,
                   COUNT(*) FILTER (WHERE passed) AS total_passed,
                   COUNT(*) FILTER (WHERE NOT passed) AS total_failed,
                   ROUND(COUNT(*) FILTER (WHERE passed) * 100.0 / NULLIF(COUNT(*), 0), 2)
                       AS pass_percentage
            FROM evaluations
            "#,
        )
        .fetch_one(&self.pool)
        .await;

        get_metrics().record_db_query("performance_stats", timer.elapsed_ms(), result.is_ok());
        let row = result.map_err(AppError::Database)?;
        Ok(row)
    }

    pub async fn performance_by_course(&self) -> Result<Vec<CoursePerformance>> {
        let timer = LatencyTimer::new();
        let result = sqlx::query_as::<_, CoursePerformance>(
            r#"
            SELECT c.code,
                   c.name AS course_name,
                   COUNT(e.id) AS evaluations,
                   ROUND(AVG(e.grade), 2) AS average_grade,
                   COUNT(e.id) FILTER (WHERE e.passed) AS passed,
                   COUNT(e.id) FILTER (WHERE NOT e.passed) AS failed,
                   ROUND(COUNT(e.id) FILTER (WHERE e.passed) * 100.0 / NULLIF(COUNT(e.id), 0), 2)
                       AS pass_percentage
            FROM courses c
            INNER JOIN enrollments m ON c.id = m.course_id
            INNER JOIN evaluations e ON m.id = e.enrollment_id
            GROUP BY c.id, c.code, c.name
            ORDER BY pass_percentage DESC NULLS LAST, c.code
            "#,
        )
        .fetch_all(&self.pool)
        .await;

        get_metrics().record_db_query("performance_by_course", timer.elapsed_ms(), result.is_ok());
        let rows = result.map_err(AppError::Database)?;
        Ok(rows)
    }

    /// Most recent cycles that have enrollments, newest first.
    pub async fn latest_cycles(&self, limit: i64) -> Result<Vec<i32>> {
        let rows: Vec<(i32,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT cycle
            FROM enrollments
            ORDER BY cycle DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    pub async fn grades_for_cycles(&self, cycles: &[i32]) -> Result<Vec<CycleGradeRow>> {
        let timer = LatencyTimer::new();
        let result = sqlx::query_as::<_, CycleGradeRow>(
            r#"
            SELECT m.cycle,
                   a.first_name || ' ' || a.last_name AS student_name,
                   c.code,
                   c.name AS course_name,
                   e.grade,
                   e.passed,
                   e.evaluated_at
            FROM enrollments m
            INNER JOIN students a ON m.student_id = a.id
            INNER JOIN courses c ON m.course_id = c.id
            LEFT JOIN evaluations e ON m.id = e.enrollment_id
            WHERE m.cycle = ANY($1)
            ORDER BY m.cycle DESC, a.last_name, c.code
            "#,
        )
        .bind(cycles)
        .fetch_all(&self.pool)
        .await;

        get_metrics().record_db_query("grades_for_cycles", timer.elapsed_ms(), result.is_ok());
        let rows = result.map_err(AppError::Database)?;
        Ok(rows)
    }

    pub async fn grades_for_cycle(&self, cycle: i32) -> Result<Vec<LatestCycleGradeRow>> {
        let timer = LatencyTimer::new();
        let result = sqlx::query_as::<_, LatestCycleGradeRow>(
            r#"
            SELECT a.first_name || ' ' || a.last_name AS student_name,
                   a.dni,
                   c.code,
                   c.name AS course_name,
                   c.credits,
                   e.grade,
                   e.passed,
                   e.evaluated_at
            FROM enrollments m
            INNER JOIN students a ON m.student_id = a.id
            INNER JOIN courses c ON m.course_id = c.id
            LEFT JOIN evaluations e ON m.id = e.enrollment_id
            WHERE m.cycle = $1
            ORDER BY a.last_name, c.code
            "#,
        )
        .bind(cycle)
        .fetch_all(&self.pool)
        .await;

        get_metrics().record_db_query("grades_for_cycle", timer.elapsed_ms(), result.is_ok());
        let rows = result.map_err(AppError::Database)?;
        Ok(rows)
    }

    /// Grade records for one cycle, or for every cycle when `cycle` is `None`.
    pub async fn grade_records(&self, cycle: Option<i32>) -> Result<Vec<GradeRecord>> {
        let timer = LatencyTimer::new();
        let result = sqlx::query_as::<_, GradeRecord>(
            r#"
            SELECT m.cycle,
                   a.first_name || ' ' || a.last_name AS student_name,
                   c.code,
                   c.name AS course_name,
                   c.credits,
                   e.grade,
                   e.passed
            FROM enrollments m
            INNER JOIN students a ON m.student_id = a.id
            INNER JOIN courses c ON m.course_id = c.id
            LEFT JOIN evaluations e ON m.id = e.enrollment_id
            WHERE ($1::int IS NULL OR m.cycle = $1)
            ORDER BY m.cycle, a.last_name, c.code
            "#,
        )
        .bind(cycle)
        .fetch_all(&self.pool)
        .await;

        get_metrics().record_db_query("grade_records", timer.elapsed_ms(), result.is_ok());
        let rows = result.map_err(AppError::Database)?;
        Ok(rows)
    }
}
