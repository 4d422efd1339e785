pub mod course_repository;
pub mod enrollment_repository;
pub mod evaluation_repository;
pub mod report_repository;
pub mod student_repository;

pub use course_repository::CourseRepository;
pub use enrollment_repository::EnrollmentRepository;
pub use evaluation_repository::EvaluationRepository;
pub use report_repository::ReportRepository;
pub use student_repository::StudentRepository;

use sqlx::PgPool;

/// Database connection pool type alias.
pub type DbPool = PgPool;
