use crate::error::{AppError, Result};
use crate::models::{Student, StudentData};
use sqlx::PgPool;

/// Repository for Student CRUD operations.
pub struct StudentRepository {
    pool: PgPool,
}

impl StudentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists every active student.
    pub async fn list_active(&self) -> Result<Vec<Student>> {
        let rows = sqlx::query_as::<_, Student>(
            r#"
            SELECT id, first_name, last_name, age, dni, email, phone, current_cycle, active, created_at
            FROM students
            WHERE active = TRUE
            ORDER BY last_name, first_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    /// Finds an active student by id.
    pub async fn find_active_by_id(&self, id: i64) -> Result<Option<Student>> {
        let row = sqlx::query_as::<_, Student>(
            r#"
            SELECT id, first_name, last_name, age, dni, email, phone, current_cycle, active, created_at
            FROM students
            WHERE id = $1 AND active = TRUE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn create(&self, data: &StudentData) -> Result<Student> {
        let row = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (first_name, last_name, age, dni, email, phone, current_cycle, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
            RETURNING id, first_name, last_name, age, dni, email, phone, current_cycle, active, created_at
            "#,
        )
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(data.age)
        .bind(&data.dni)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(data.current_cycle)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Replaces every editable field. Returns `None` if the id does not exist.
    pub async fn update(&self, id: i64, data: &StudentData) -> Result<Option<Student>> {
        let row = sqlx::query_as::<_, Student>(
            r#"
            UPDATE students
            SET first_name = $2, last_name = $3, age = $4, dni = $5,
                email = $6, phone = $7, current_cycle = $8
            WHERE id = $1
            RETURNING id, first_name, last_name, age, dni, email, phone, current_cycle, active, created_at
            "#,
        )
        .bind(id)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(data.age)
        .bind(&data.dni)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(data.current_cycle)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Soft delete: marks the student inactive.
    pub async fn deactivate(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE students
            SET active = FALSE
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    /// Checks whether another student already uses the DNI.
    pub async fn dni_taken(&self, dni: &str, exclude_id: Option<i64>) -> Result<bool> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(SELECT 1 FROM students WHERE dni = $1 AND ($2::bigint IS NULL OR id <> $2))
            "#,
        )
        .bind(dni)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.0)
    }
}
