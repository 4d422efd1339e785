use crate::error::{AppError, Result};
use crate::models::{Enrollment, EnrollmentData, EnrollmentDetail, EnrollmentStatus};
use sqlx::{PgPool, Postgres, Transaction};

/// Repository for Enrollment operations.
pub struct EnrollmentRepository {
    pool: PgPool,
}

impl EnrollmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists all enrollments with student and course names, newest first.
    pub async fn list_detailed(&self) -> Result<Vec<EnrollmentDetail>> {
        let rows = sqlx::query_as::<_, EnrollmentDetail>(
            r#"
            SELECT m.id, m.student_id, m.course_id, m.cycle, m.enrolled_at, m.status,
                   a.first_name || ' ' || a.last_name AS student_name,
                   c.name AS course_name,
                   c.code AS course_code
            FROM enrollments m
            INNER JOIN students a ON m.student_id = a.id
            INNER JOIN courses c ON m.course_id = c.id
            ORDER BY m.enrolled_at DESC, m.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    pub async fn find_detailed_by_id(&self, id: i64) -> Result<Option<EnrollmentDetail>> {
        let row = sqlx::query_as::<_, EnrollmentDetail>(
            r#"
            SELECT m.id, m.student_id, m.course_id, m.cycle, m.enrolled_at, m.status,
                   a.first_name || ' ' || a.last_name AS student_name,
                   c.name AS course_name,
                   c.code AS course_code
            FROM enrollments m
            INNER JOIN students a ON m.student_id = a.id
            INNER JOIN courses c ON m.course_id = c.id
            WHERE m.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Checks for an enrollment of the student in the course for the cycle.
    pub async fn exists(&self, data: &EnrollmentData) -> Result<bool> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM enrollments
                WHERE student_id = $1 AND course_id = $2 AND cycle = $3
            )
            "#,
        )
        .bind(data.student_id)
        .bind(data.course_id)
        .bind(data.cycle)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.0)
    }

    pub async fn create(&self, data: &EnrollmentData) -> Result<Enrollment> {
        let row = sqlx::query_as::<_, Enrollment>(
            r#"
            INSERT INTO enrollments (student_id, course_id, cycle, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, student_id, course_id, cycle, enrolled_at, status
            "#,
        )
        .bind(data.student_id)
        .bind(data.course_id)
        .bind(data.cycle)
        .bind(EnrollmentStatus::Enrolled)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM enrollments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    /// Locks the enrollment row for the rest of the transaction.
    pub async fn find_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<Option<Enrollment>> {
        let row = sqlx::query_as::<_, Enrollment>(
            r#"
            SELECT id, student_id, course_id, cycle, enrolled_at, status
            FROM enrollments
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn set_status(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        status: EnrollmentStatus,
    ) -> Result<()> {
        sqlx::query("UPDATE enrollments SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&mut **tx)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }
}
