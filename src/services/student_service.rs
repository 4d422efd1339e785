use crate::error::{AppError, Result};
use crate::models::student::DNI_LENGTH;
use crate::models::{course::CYCLE_RANGE, Student, StudentData};
use crate::repositories::StudentRepository;
use sqlx::PgPool;

/// Service for student management operations.
pub struct StudentService {
    student_repo: StudentRepository,
}

impl StudentService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            student_repo: StudentRepository::new(pool),
        }
    }

    pub async fn list_active(&self) -> Result<Vec<Student>> {
        self.student_repo.list_active().await
    }

    /// Gets an active student, or `NotFound` for unknown and inactive ids.
    pub async fn get_student(&self, id: i64) -> Result<Student> {
        self.student_repo
            .find_active_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student {} not found", id)))
    }

    pub async fn create_student(&self, data: StudentData) -> Result<Student> {
        validate_student(&data)?;

        if self.student_repo.dni_taken(&data.dni, None).await? {
            return Err(AppError::Conflict(format!(
                "A student with DNI {} already exists",
                data.dni
            )));
        }

        self.student_repo.create(&data).await
    }

    pub async fn update_student(&self, id: i64, data: StudentData) -> Result<Student> {
        validate_student(&data)?;

        if self.student_repo.dni_taken(&data.dni, Some(id)).await? {
            return Err(AppError::Conflict(format!(
                "A student with DNI {} already exists",
                data.dni
            )));
        }

        self.student_repo
            .update(id, &data)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student {} not found", id)))
    }

    /// Soft delete. The row stays so enrollments keep their history.
    pub async fn deactivate_student(&self, id: i64) -> Result<()> {
        if !self.student_repo.deactivate(id).await? {
            return Err(AppError::NotFound(format!("Student {} not found", id)));
        }
        Ok(())
    }
}

/// Checks the fields every student write must satisfy.
pub fn validate_student(data: &StudentData) -> Result<()> {
    if data.first_name.trim().is_empty() {
        return Err(AppError::Validation("First name cannot be empty".to_string()));
    }

    if data.last_name.trim().is_empty() {
        return Err(AppError::Validation("Last name cannot be empty".to_string()));
    }

    if data.dni.chars().count() != DNI_LENGTH {
        return Err(AppError::Validation(format!(
            "DNI must be exactly {} characters",
            DNI_LENGTH
        )));
    }

    if !CYCLE_RANGE.contains(&data.current_cycle) {
        return Err(AppError::Validation(format!(
            "Current cycle must be between {} and {}",
            CYCLE_RANGE.start(),
            CYCLE_RANGE.end()
        )));
    }

    Ok(())
}
