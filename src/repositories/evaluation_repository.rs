use crate::error::{AppError, Result};
use crate::models::{Evaluation, EvaluationDetail, PendingEvaluation};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

/// Repository for Evaluation operations.
///
/// Writes take an open transaction because every grade change also moves the
/// status of its enrollment.
pub struct EvaluationRepository {
    pool: PgPool,
}

impl EvaluationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists every evaluation with student, course and cycle, newest first.
    pub async fn list_detailed(&self) -> Result<Vec<EvaluationDetail>> {
        let rows = sqlx::query_as::<_, EvaluationDetail>(
            r#"
            SELECT e.id, e.enrollment_id, e.grade, e.passed, e.evaluated_at,
                   a.first_name || ' ' || a.last_name AS student_name,
                   c.name AS course_name,
                   m.cycle
            FROM evaluations e
            INNER JOIN enrollments m ON e.enrollment_id = m.id
            INNER JOIN students a ON m.student_id = a.id
            INNER JOIN courses c ON m.course_id = c.id
            ORDER BY e.evaluated_at DESC, e.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    /// Lists enrollments that have no evaluation yet.
    pub async fn list_pending(&self) -> Result<Vec<PendingEvaluation>> {
        let rows = sqlx::query_as::<_, PendingEvaluation>(
            r#"
            SELECT m.id AS enrollment_id,
                   a.first_name || ' ' || a.last_name AS student_name,
                   c.name AS course_name,
                   m.cycle
            FROM enrollments m
            INNER JOIN students a ON m.student_id = a.id
            INNER JOIN courses c ON m.course_id = c.id
            LEFT JOIN evaluations e ON m.id = e.enrollment_id
            WHERE e.id IS NULL
            ORDER BY m.cycle, a.last_name, c.code
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    pub async fn exists_for_enrollment(
        tx: &mut Transaction<'_, Postgres>,
        enrollment_id: i64,
    ) -> Result<bool> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM evaluations WHERE enrollment_id = $1)",
        )
        .bind(enrollment_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(row.0)
    }

    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        enrollment_id: i64,
        grade: Decimal,
        passed: bool,
    ) -> Result<Evaluation> {
        let row = sqlx::query_as::<_, Evaluation>(
            r#"
            INSERT INTO evaluations (enrollment_id, grade, passed)
            VALUES ($1, $2, $3)
            RETURNING id, enrollment_id, grade, passed, evaluated_at
            "#,
        )
        .bind(enrollment_id)
        .bind(grade)
        .bind(passed)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Returns `None` if the evaluation does not exist.
    pub async fn update_grade(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        grade: Decimal,
        passed: bool,
    ) -> Result<Option<Evaluation>> {
        let row = sqlx::query_as::<_, Evaluation>(
            r#"
            UPDATE evaluations
            SET grade = $2, passed = $3, evaluated_at = NOW()
            WHERE id = $1
            RETURNING id, enrollment_id, grade, passed, evaluated_at
            "#,
        )
        .bind(id)
        .bind(grade)
        .bind(passed)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Deletes the evaluation and returns the enrollment it belonged to.
    pub async fn delete(tx: &mut Transaction<'_, Postgres>, id: i64) -> Result<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as(
            "DELETE FROM evaluations WHERE id = $1 RETURNING enrollment_id",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(row.map(|r| r.0))
    }
}
