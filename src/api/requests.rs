use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::api::responses::ValidationErrorDetail;
use crate::models::evaluation::is_valid_grade;
use crate::models::{CourseData, EnrollmentData, StudentData};

/// Body of `POST /api/alumnos` and `PUT /api/alumnos/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct StudentRequest {
    #[validate(required, length(min = 1, max = 100, message = "first_name is required"))]
    pub first_name: Option<String>,
    #[validate(required, length(min = 1, max = 100, message = "last_name is required"))]
    pub last_name: Option<String>,
    #[validate(range(min = 0, max = 120, message = "age must be between 0 and 120"))]
    pub age: Option<i32>,
    #[validate(required, length(equal = 8, message = "dni must be exactly 8 characters"))]
    pub dni: Option<String>,
    #[validate(email(message = "email is not a valid address"))]
    pub email: Option<String>,
    #[validate(length(max = 20, message = "phone must be at most 20 characters"))]
    pub phone: Option<String>,
    #[validate(range(min = 1, max = 10, message = "current_cycle must be between 1 and 10"))]
    pub current_cycle: Option<i32>,
}

impl StudentRequest {
    /// Converts a validated request. New students start in cycle 1.
    pub fn into_data(self) -> StudentData {
        StudentData {
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            age: self.age,
            dni: self.dni.unwrap_or_default(),
            email: self.email,
            phone: self.phone,
            current_cycle: self.current_cycle.unwrap_or(1),
        }
    }
}

/// Body of `POST /api/cursos`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CourseRequest {
    #[validate(required, length(min = 1, max = 20, message = "code is required"))]
    pub code: Option<String>,
    #[validate(required, length(min = 1, max = 100, message = "name is required"))]
    pub name: Option<String>,
    #[validate(required, range(min = 1, max = 5, message = "credits must be between 1 and 5"))]
    pub credits: Option<i32>,
    #[validate(required, range(min = 1, max = 10, message = "cycle must be between 1 and 10"))]
    pub cycle: Option<i32>,
}

impl CourseRequest {
    pub fn into_data(self) -> CourseData {
        CourseData {
            code: self.code.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            credits: self.credits.unwrap_or_default(),
            cycle: self.cycle.unwrap_or_default(),
        }
    }
}

/// Body of `POST /api/matriculas`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct EnrollmentRequest {
    #[validate(required(message = "student_id is required"))]
    pub student_id: Option<i64>,
    #[validate(required(message = "course_id is required"))]
    pub course_id: Option<i64>,
    #[validate(required, range(min = 1, max = 10, message = "cycle must be between 1 and 10"))]
    pub cycle: Option<i32>,
}

impl EnrollmentRequest {
    pub fn into_data(self) -> EnrollmentData {
        EnrollmentData {
            student_id: self.student_id.unwrap_or_default(),
            course_id: self.course_id.unwrap_or_default(),
            cycle: self.cycle.unwrap_or_default(),
        }
    }
}

/// Body of `POST /api/evaluaciones`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateEvaluationRequest {
    #[validate(required(message = "enrollment_id is required"))]
    pub enrollment_id: Option<i64>,
    #[validate(required(message = "grade is required"), custom = "validate_grade_range")]
    pub grade: Option<Decimal>,
}

/// Body of `PUT /api/evaluaciones/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateEvaluationRequest {
    #[validate(required(message = "grade is required"), custom = "validate_grade_range")]
    pub grade: Option<Decimal>,
}

fn validate_grade_range(grade: &Decimal) -> Result<(), ValidationError> {
    if is_valid_grade(*grade) {
        Ok(())
    } else {
        let mut error = ValidationError::new("range");
        error.message = Some("grade must be between 0 and 20".into());
        Err(error)
    }
}

/// Query string of `GET /api/reportes/notas_por_ciclo`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GradesByCycleQuery {
    pub ciclo: Option<i32>,
}

/// Flattens validator errors into response details, sorted by field.
pub fn validation_details(errors: &ValidationErrors) -> Vec<ValidationErrorDetail> {
    let mut details: Vec<ValidationErrorDetail> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, kinds)| {
            kinds.iter().map(move |error| ValidationErrorDetail {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field)),
            })
        })
        .collect();
    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}
