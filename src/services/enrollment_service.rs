use crate::error::{AppError, Result};
use crate::models::{Enrollment, EnrollmentData, EnrollmentDetail};
use crate::observability::get_metrics;
use crate::repositories::{CourseRepository, EnrollmentRepository, StudentRepository};
use sqlx::PgPool;

/// Service for enrolling students in courses.
pub struct EnrollmentService {
    enrollment_repo: EnrollmentRepository,
    student_repo: StudentRepository,
    course_repo: CourseRepository,
}

impl EnrollmentService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            enrollment_repo: EnrollmentRepository::new(pool.clone()),
            student_repo: StudentRepository::new(pool.clone()),
            course_repo: CourseRepository::new(pool),
        }
    }

    pub async fn list(&self) -> Result<Vec<EnrollmentDetail>> {
        self.enrollment_repo.list_detailed().await
    }

    pub async fn get_enrollment(&self, id: i64) -> Result<EnrollmentDetail> {
        self.enrollment_repo
            .find_detailed_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Enrollment {} not found", id)))
    }

    /// Enrolls an active student in an active course for one cycle.
    pub async fn create_enrollment(&self, data: EnrollmentData) -> Result<Enrollment> {
        self.student_repo
            .find_active_by_id(data.student_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Student {} not found or inactive",
                    data.student_id
                ))
            })?;

        self.course_repo
            .find_active_by_id(data.course_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Course {} not found or inactive", data.course_id))
            })?;

        if self.enrollment_repo.exists(&data).await? {
            return Err(AppError::Conflict(format!(
                "Student {} is already enrolled in course {} for cycle {}",
                data.student_id, data.course_id, data.cycle
            )));
        }

        let enrollment = self.enrollment_repo.create(&data).await?;
        get_metrics().record_enrollment_created(enrollment.cycle);

        Ok(enrollment)
    }

    /// Hard delete. Its evaluation, if any, goes with it.
    pub async fn delete_enrollment(&self, id: i64) -> Result<()> {
        if !self.enrollment_repo.delete(id).await? {
            return Err(AppError::NotFound(format!("Enrollment {} not found", id)));
        }
        Ok(())
    }
}
