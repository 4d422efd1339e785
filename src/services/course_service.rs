use crate::error::{AppError, Result};
use crate::models::course::{CREDITS_RANGE, CYCLE_RANGE};
use crate::models::{Course, CourseData};
use crate::repositories::CourseRepository;
use sqlx::PgPool;

/// Service for the course catalog.
pub struct CourseService {
    course_repo: CourseRepository,
}

impl CourseService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            course_repo: CourseRepository::new(pool),
        }
    }

    pub async fn list_active(&self) -> Result<Vec<Course>> {
        self.course_repo.list_active().await
    }

    pub async fn create_course(&self, data: CourseData) -> Result<Course> {
        validate_course(&data)?;

        if self.course_repo.exists_by_code(&data.code).await? {
            return Err(AppError::Conflict(format!(
                "Course with code '{}' already exists",
                data.code
            )));
        }

        self.course_repo.create(&data).await
    }
}

pub fn validate_course(data: &CourseData) -> Result<()> {
    if data.code.trim().is_empty() {
        return Err(AppError::Validation("Course code cannot be empty".to_string()));
    }

    if data.name.trim().is_empty() {
        return Err(AppError::Validation("Course name cannot be empty".to_string()));
    }

    if !CREDITS_RANGE.contains(&data.credits) {
        return Err(AppError::Validation(format!(
            "Credits must be between {} and {}",
            CREDITS_RANGE.start(),
            CREDITS_RANGE.end()
        )));
    }

    if !CYCLE_RANGE.contains(&data.cycle) {
        return Err(AppError::Validation(format!(
            "Cycle must be between {} and {}",
            CYCLE_RANGE.start(),
            CYCLE_RANGE.end()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(credits: i32, cycle: i32) -> CourseData {
        CourseData {
            code: "MAT101".to_string(),
            name: "Matemática I".to_string(),
            credits,
            cycle,
        }
    }

    #[test]
    fn test_valid_course() {
        assert!(validate_course(&data(4, 1)).is_ok());
        assert!(validate_course(&data(1, 10)).is_ok());
    }

    #[test]
    fn test_credits_out_of_range() {
        assert!(matches!(validate_course(&data(0, 1)), Err(AppError::Validation(_))));
        assert!(matches!(validate_course(&data(6, 1)), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_cycle_out_of_range() {
        assert!(validate_course(&data(3, 0)).is_err());
        assert!(validate_course(&data(3, 11)).is_err());
    }

    #[test]
    fn test_blank_code() {
        let mut d = data(3, 2);
        d.code = " ".to_string();
        assert!(validate_course(&d).is_err());
    }
}
