pub mod course;
pub mod enrollment;
pub mod evaluation;
pub mod report;
pub mod student;

pub use course::{Course, CourseData};
pub use enrollment::{Enrollment, EnrollmentData, EnrollmentDetail, EnrollmentStatus};
pub use evaluation::{Evaluation, EvaluationDetail, PendingEvaluation, PASSING_GRADE};
pub use report::{
    AcademicPerformance, CourseDemand, CoursePerformance, CycleGradeRow, CycleSummary,
    GradeRecord, GradeStatus, GradeStatusRow, GradesByCycle, LatestCycleGradeRow,
    LatestCycleGrades, PerformanceStats,
};
pub use student::{Student, StudentData};
