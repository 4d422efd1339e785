mod common;

use academic_records::error::AppError;
use academic_records::models::{EnrollmentData, EnrollmentStatus, GradeStatus, GradesByCycle};
use academic_records::services::{
    CourseService, EnrollmentService, EvaluationService, ReportService, StudentService,
};
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_student_lifecycle() {
    let pool = common::setup_test_db().await;
    let service = StudentService::new(pool.clone());

    let student = common::create_student(&pool, "Lucía", "Quispe").await;
    assert!(student.active);
    assert_eq!(student.current_cycle, 1);

    let found = service.get_student(student.id).await.expect("Failed to get student");
    assert_eq!(found.dni, student.dni);

    let mut changes = common::student_data("Lucía", "Quispe Mamani");
    changes.dni = student.dni.clone();
    changes.current_cycle = 3;
    let updated = service
        .update_student(student.id, changes)
        .await
        .expect("Failed to update student");
    assert_eq!(updated.last_name, "Quispe Mamani");
    assert_eq!(updated.current_cycle, 3);

    service
        .deactivate_student(student.id)
        .await
        .expect("Failed to deactivate student");
    assert!(matches!(
        service.get_student(student.id).await,
        Err(AppError::NotFound(_))
    ));
    let active = service.list_active().await.unwrap();
    assert!(active.iter().all(|s| s.id != student.id));

    common::cleanup_student(&pool, student.id).await;
}

#[tokio::test]
async fn test_student_dni_conflict() {
    let pool = common::setup_test_db().await;
    let service = StudentService::new(pool.clone());

    let first = common::create_student(&pool, "Ana", "Torres").await;
    let second = common::create_student(&pool, "Rosa", "Torres").await;

    let mut duplicate = common::student_data("Pedro", "Rojas");
    duplicate.dni = first.dni.clone();
    assert!(matches!(
        service.create_student(duplicate.clone()).await,
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(
        service.update_student(second.id, duplicate).await,
        Err(AppError::Conflict(_))
    ));

    common::cleanup_student(&pool, first.id).await;
    common::cleanup_student(&pool, second.id).await;
}

#[tokio::test]
async fn test_update_missing_student() {
    let pool = common::setup_test_db().await;
    let result = StudentService::new(pool)
        .update_student(i64::MAX, common::student_data("Nadie", "Nunca"))
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_course_code_conflict() {
    let pool = common::setup_test_db().await;
    let service = CourseService::new(pool.clone());

    let course = common::create_course(&pool, "Cálculo I", 1).await;
    let mut duplicate = academic_records::models::CourseData {
        code: course.code.clone(),
        name: "Cálculo I bis".to_string(),
        credits: 3,
        cycle: 1,
    };
    assert!(matches!(
        service.create_course(duplicate.clone()).await,
        Err(AppError::Conflict(_))
    ));

    duplicate.credits = 0;
    assert!(matches!(
        service.create_course(duplicate).await,
        Err(AppError::Validation(_))
    ));

    let listed = service.list_active().await.unwrap();
    assert!(listed.iter().any(|c| c.id == course.id));

    common::cleanup_course(&pool, course.id).await;
}

#[tokio::test]
async fn test_enrollment_rules() {
    let pool = common::setup_test_db().await;
    let service = EnrollmentService::new(pool.clone());

    let student = common::create_student(&pool, "Carlos", "Huamán").await;
    let course = common::create_course(&pool, "Física I", 2).await;
    let data = EnrollmentData {
        student_id: student.id,
        course_id: course.id,
        cycle: 2,
    };

    let enrollment = service
        .create_enrollment(data.clone())
        .await
        .expect("Failed to enroll");
    assert_eq!(enrollment.status, EnrollmentStatus::Enrolled);

    let detail = service.get_enrollment(enrollment.id).await.unwrap();
    assert_eq!(detail.student_name, "Carlos Huamán");
    assert_eq!(detail.course_code, course.code);

    assert!(matches!(
        service.create_enrollment(data.clone()).await,
        Err(AppError::Conflict(_))
    ));

    // Same course in another cycle is a separate enrollment.
    let retake = service
        .create_enrollment(EnrollmentData { cycle: 3, ..data.clone() })
        .await
        .expect("Failed to enroll in another cycle");

    service.delete_enrollment(retake.id).await.unwrap();
    assert!(matches!(
        service.delete_enrollment(retake.id).await,
        Err(AppError::NotFound(_))
    ));

    common::cleanup_student(&pool, student.id).await;
    common::cleanup_course(&pool, course.id).await;
}

#[tokio::test]
async fn test_enrollment_requires_active_student_and_course() {
    let pool = common::setup_test_db().await;
    let service = EnrollmentService::new(pool.clone());

    let student = common::create_student(&pool, "Elena", "Vargas").await;
    let course = common::create_course(&pool, "Química", 1).await;

    let missing_course = service
        .create_enrollment(EnrollmentData {
            student_id: student.id,
            course_id: i64::MAX,
            cycle: 1,
        })
        .await;
    assert!(matches!(missing_course, Err(AppError::NotFound(_))));

    StudentService::new(pool.clone())
        .deactivate_student(student.id)
        .await
        .unwrap();
    let inactive = service
        .create_enrollment(EnrollmentData {
            student_id: student.id,
            course_id: course.id,
            cycle: 1,
        })
        .await;
    match inactive {
        Err(AppError::NotFound(msg)) => assert!(msg.contains("inactive")),
        other => panic!("expected NotFound, got {:?}", other),
    }

    common::cleanup_student(&pool, student.id).await;
    common::cleanup_course(&pool, course.id).await;
}

#[tokio::test]
async fn test_evaluation_moves_enrollment_status() {
    let pool = common::setup_test_db().await;
    let enrollments = EnrollmentService::new(pool.clone());
    let evaluations = EvaluationService::new(pool.clone());

    let student = common::create_student(&pool, "Jorge", "Salas").await;
    let course = common::create_course(&pool, "Programación I", 1).await;
    let enrollment = enrollments
        .create_enrollment(EnrollmentData {
            student_id: student.id,
            course_id: course.id,
            cycle: 1,
        })
        .await
        .unwrap();

    let pending = evaluations.list_pending().await.unwrap();
    assert!(pending.iter().any(|p| p.enrollment_id == enrollment.id));

    let evaluation = evaluations
        .create_evaluation(enrollment.id, dec!(15.5))
        .await
        .expect("Failed to grade");
    assert!(evaluation.passed);
    assert_eq!(
        enrollments.get_enrollment(enrollment.id).await.unwrap().status,
        EnrollmentStatus::Passed
    );

    let pending = evaluations.list_pending().await.unwrap();
    assert!(pending.iter().all(|p| p.enrollment_id != enrollment.id));

    assert!(matches!(
        evaluations.create_evaluation(enrollment.id, dec!(12)).await,
        Err(AppError::Conflict(_))
    ));

    let updated = evaluations
        .update_evaluation(evaluation.id, dec!(10.4))
        .await
        .unwrap();
    assert!(!updated.passed);
    assert_eq!(
        enrollments.get_enrollment(enrollment.id).await.unwrap().status,
        EnrollmentStatus::Failed
    );

    evaluations.delete_evaluation(evaluation.id).await.unwrap();
    assert_eq!(
        enrollments.get_enrollment(enrollment.id).await.unwrap().status,
        EnrollmentStatus::Enrolled
    );
    assert!(matches!(
        evaluations.delete_evaluation(evaluation.id).await,
        Err(AppError::NotFound(_))
    ));

    common::cleanup_student(&pool, student.id).await;
    common::cleanup_course(&pool, course.id).await;
}

#[tokio::test]
async fn test_evaluation_rejects_bad_input() {
    let pool = common::setup_test_db().await;
    let evaluations = EvaluationService::new(pool.clone());

    assert!(matches!(
        evaluations.create_evaluation(i64::MAX, dec!(14)).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        evaluations.create_evaluation(i64::MAX, dec!(20.5)).await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        evaluations.update_evaluation(i64::MAX, dec!(14)).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_grade_reports_include_new_records() {
    let pool = common::setup_test_db().await;
    let reports = ReportService::new(pool.clone());

    let student = common::create_student(&pool, "Marta", "Condori").await;
    let course = common::create_course(&pool, "Estadística", 4).await;
    let enrollment = EnrollmentService::new(pool.clone())
        .create_enrollment(EnrollmentData {
            student_id: student.id,
            course_id: course.id,
            cycle: 4,
        })
        .await
        .unwrap();

    match reports.grades_by_cycle(Some(4)).await.unwrap() {
        GradesByCycle::Single { cycle, total_records, grades } => {
            assert_eq!(cycle, 4);
            assert_eq!(total_records, grades.len());
            let row = grades.iter().find(|g| g.code == course.code).expect("row present");
            assert_eq!(row.status, GradeStatus::NotEvaluated);
            assert!(row.grade.is_none());
        }
        other => panic!("expected single-cycle report, got {:?}", other),
    }

    EvaluationService::new(pool.clone())
        .create_evaluation(enrollment.id, dec!(9))
        .await
        .unwrap();

    match reports.grades_by_cycle(None).await.unwrap() {
        GradesByCycle::All { by_cycle, total_cycles, .. } => {
            assert_eq!(total_cycles, by_cycle.len());
            let row = by_cycle[&4]
                .iter()
                .find(|g| g.code == course.code)
                .expect("row present");
            assert_eq!(row.status, GradeStatus::Failed);
            assert_eq!(row.grade, Some(dec!(9)));
        }
        other => panic!("expected grouped report, got {:?}", other),
    }

    let latest = reports
        .latest_cycle_grades()
        .await
        .unwrap()
        .expect("at least one enrollment exists");
    assert!(latest.cycle >= 4);

    let demand = reports.most_demanded_courses().await.unwrap();
    let row = demand.iter().find(|d| d.code == course.code).expect("course listed");
    assert_eq!(row.total_enrollments, 1);
    assert_eq!(row.unique_students, 1);

    let performance = reports.academic_performance().await.unwrap();
    assert!(performance.general_stats.total_evaluations >= 1);
    assert!(performance.by_course.iter().any(|c| c.code == course.code));

    let per_cycle = reports.students_per_cycle().await.unwrap();
    assert!(per_cycle.iter().any(|c| c.cycle == 4 && c.total_enrollments >= 1));

    common::cleanup_student(&pool, student.id).await;
    common::cleanup_course(&pool, course.id).await;
}
