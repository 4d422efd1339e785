use crate::error::{AppError, Result};
use crate::models::evaluation::{is_passing, is_valid_grade, status_for_grade, MAX_GRADE};
use crate::models::{EnrollmentStatus, Evaluation, EvaluationDetail, PendingEvaluation};
use crate::observability::get_metrics;
use crate::repositories::{EnrollmentRepository, EvaluationRepository};
use rust_decimal::Decimal;
use sqlx::PgPool;

/// Service for recording grades.
///
/// Every write changes the evaluation and the status of its enrollment in a
/// single database transaction.
pub struct EvaluationService {
    pool: PgPool,
    evaluation_repo: EvaluationRepository,
}

impl EvaluationService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            evaluation_repo: EvaluationRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn list(&self) -> Result<Vec<EvaluationDetail>> {
        self.evaluation_repo.list_detailed().await
    }

    pub async fn list_pending(&self) -> Result<Vec<PendingEvaluation>> {
        self.evaluation_repo.list_pending().await
    }

    /// Grades an enrollment. Each enrollment can be graded once.
    pub async fn create_evaluation(&self, enrollment_id: i64, grade: Decimal) -> Result<Evaluation> {
        validate_grade(grade)?;

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        EnrollmentRepository::find_for_update(&mut tx, enrollment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Enrollment {} not found", enrollment_id)))?;

        if EvaluationRepository::exists_for_enrollment(&mut tx, enrollment_id).await? {
            return Err(AppError::Conflict(format!(
                "Enrollment {} already has an evaluation",
                enrollment_id
            )));
        }

        let passed = is_passing(grade);
        let evaluation = EvaluationRepository::insert(&mut tx, enrollment_id, grade, passed).await?;
        EnrollmentRepository::set_status(&mut tx, enrollment_id, status_for_grade(grade)).await?;

        tx.commit().await.map_err(AppError::Database)?;

        get_metrics().record_evaluation(passed);
        Ok(evaluation)
    }

    pub async fn update_evaluation(&self, id: i64, grade: Decimal) -> Result<Evaluation> {
        validate_grade(grade)?;

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let passed = is_passing(grade);
        let evaluation = EvaluationRepository::update_grade(&mut tx, id, grade, passed)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Evaluation {} not found", id)))?;
        EnrollmentRepository::set_status(&mut tx, evaluation.enrollment_id, status_for_grade(grade))
            .await?;

        tx.commit().await.map_err(AppError::Database)?;

        get_metrics().record_evaluation(passed);
        Ok(evaluation)
    }

    /// Removes a grade and puts its enrollment back to `MATRICULADO`.
    pub async fn delete_evaluation(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let enrollment_id = EvaluationRepository::delete(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Evaluation {} not found", id)))?;
        EnrollmentRepository::set_status(&mut tx, enrollment_id, EnrollmentStatus::Enrolled).await?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }
}

pub fn validate_grade(grade: Decimal) -> Result<()> {
    if !is_valid_grade(grade) {
        return Err(AppError::Validation(format!(
            "Grade must be between 0 and {}",
            MAX_GRADE
        )));
    }

    if grade.scale() > 2 && grade.round_dp(2) != grade {
        return Err(AppError::Validation(
            "Grade cannot have more than two decimal places".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_grade_bounds() {
        assert!(validate_grade(dec!(0)).is_ok());
        assert!(validate_grade(dec!(20)).is_ok());
        assert!(validate_grade(dec!(10.5)).is_ok());
        assert!(matches!(validate_grade(dec!(-0.5)), Err(AppError::Validation(_))));
        assert!(matches!(validate_grade(dec!(20.01)), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_grade_precision() {
        assert!(validate_grade(dec!(14.75)).is_ok());
        assert!(validate_grade(dec!(14.750)).is_ok());
        assert!(validate_grade(dec!(14.755)).is_err());
    }
}
