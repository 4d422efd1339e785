use crate::error::{AppError, Result};
use crate::models::{Course, CourseData};
use sqlx::PgPool;

/// Repository for Course operations.
pub struct CourseRepository {
    pool: PgPool,
}

impl CourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_active(&self) -> Result<Vec<Course>> {
        let rows = sqlx::query_as::<_, Course>(
            r#"
            SELECT id, code, name, credits, cycle, active, created_at
            FROM courses
            WHERE active = TRUE
            ORDER BY cycle, code
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    pub async fn find_active_by_id(&self, id: i64) -> Result<Option<Course>> {
        let row = sqlx::query_as::<_, Course>(
            r#"
            SELECT id, code, name, credits, cycle, active, created_at
            FROM courses
            WHERE id = $1 AND active = TRUE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn create(&self, data: &CourseData) -> Result<Course> {
        let row = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (code, name, credits, cycle, active)
            VALUES ($1, $2, $3, $4, TRUE)
            RETURNING id, code, name, credits, cycle, active, created_at
            "#,
        )
        .bind(&data.code)
        .bind(&data.name)
        .bind(data.credits)
        .bind(data.cycle)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn exists_by_code(&self, code: &str) -> Result<bool> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(SELECT 1 FROM courses WHERE code = $1)
            "#,
        )
        .bind(code)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.0)
    }
}
