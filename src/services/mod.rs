pub mod course_service;
pub mod enrollment_service;
pub mod evaluation_service;
pub mod report_service;
pub mod student_service;

pub use course_service::CourseService;
pub use enrollment_service::EnrollmentService;
pub use evaluation_service::EvaluationService;
pub use report_service::ReportService;
pub use student_service::StudentService;
