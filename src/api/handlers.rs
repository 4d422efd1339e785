use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::{Validate, ValidationErrors};

use crate::api::requests::{
    validation_details, CourseRequest, CreateEvaluationRequest, EnrollmentRequest,
    GradesByCycleQuery, StudentRequest, UpdateEvaluationRequest,
};
use crate::api::responses::{
    ApiResponse, CreatedResponse, ErrorResponse, HealthResponse, MessageResponse, ServiceHealth,
};
use crate::error::AppError;
use crate::models::{
    AcademicPerformance, Course, CourseDemand, CycleGradeRow, CycleSummary, EnrollmentDetail,
    EvaluationDetail, GradesByCycle, PendingEvaluation, Student,
};
use crate::observability::{mask_sensitive, AggregatedHealth, RequestContext, RequestScope};
use crate::services::{
    CourseService, EnrollmentService, EvaluationService, ReportService, StudentService,
};

use super::routes::AppState;

const MODULE_STUDENTS: &str = "alumnos";
const MODULE_COURSES: &str = "cursos";
const MODULE_ENROLLMENTS: &str = "matriculas";
const MODULE_EVALUATIONS: &str = "evaluaciones";
const MODULE_REPORTS: &str = "reportes";

type ErrorReply = (StatusCode, Json<ApiResponse<()>>);
type HandlerResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ErrorReply>;

fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::Validation(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Turns a service error into a response, logging it under the scope's module.
/// Client errors are logged as WARN, everything else as ERROR.
fn reject(scope: &mut RequestScope<'_>, err: AppError) -> ErrorReply {
    let status = status_for(&err);
    scope.set_status(status);

    if status.is_server_error() {
        tracing::error!(
            error = %err,
            path = scope.context().path(),
            correlation_id = scope.context().correlation_id(),
            "Request failed"
        );
        scope.error(format!("Excepción: {}", err));
        return (
            status,
            Json(ApiResponse::<()>::error(ErrorResponse::new(
                "INTERNAL_ERROR",
                "An internal error occurred",
            ))),
        );
    }

    let code = err.code();
    let message = match err {
        AppError::Validation(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => msg,
        other => other.to_string(),
    };
    scope.warn(&message);

    (status, Json(ApiResponse::<()>::error(ErrorResponse::new(code, message))))
}

fn invalid(scope: &mut RequestScope<'_>, errors: ValidationErrors) -> ErrorReply {
    let details = validation_details(&errors);
    scope.set_status(StatusCode::BAD_REQUEST);

    let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
    scope.warn(format!("Datos inválidos: {}", fields.join(", ")));

    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error(
            ErrorResponse::new("VALIDATION_ERROR", "Request validation failed")
                .with_details(details),
        )),
    )
}

/// Body or query string that could not be parsed at all.
fn malformed(scope: &mut RequestScope<'_>, detail: String) -> ErrorReply {
    scope.set_status(StatusCode::BAD_REQUEST);
    scope.warn(format!("Request sin datos JSON o datos inválidos: {}", detail));

    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error(ErrorResponse::new(
            "INVALID_REQUEST",
            detail,
        ))),
    )
}

// ============================================================================
// Health & Metrics
// ============================================================================

/// Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let db_healthy = sqlx::query("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .is_ok();

    let log_healthy = state
        .health_checker
        .as_ref()
        .map(|checker| checker.check_log_dir().status.is_healthy())
        .unwrap_or(true);

    let response = HealthResponse {
        status: if db_healthy && log_healthy { "healthy".to_string() } else { "degraded".to_string() },
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        services: ServiceHealth {
            database: db_healthy,
            request_log: log_healthy,
        },
    };

    Json(ApiResponse::success(response))
}

/// Detailed health of every dependency.
pub async fn detailed_health_check(
    State(state): State<AppState>,
) -> Result<Json<AggregatedHealth>, StatusCode> {
    match &state.health_checker {
        Some(checker) => Ok(Json(checker.check_all().await)),
        None => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}

/// Readiness check endpoint.
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    let ready = match &state.health_checker {
        Some(checker) => checker.is_ready().await,
        None => sqlx::query("SELECT 1").fetch_one(&state.pool).await.is_ok(),
    };

    if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Liveness check endpoint.
pub async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

/// Prometheus scrape endpoint.
pub async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics_handle {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::SERVICE_UNAVAILABLE, "Metrics not initialized".to_string()),
    }
}

// ============================================================================
// Student Handlers
// ============================================================================

/// List active students.
pub async fn list_students(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> HandlerResult<Vec<Student>> {
    let mut scope = state.logger.scope(&ctx, MODULE_STUDENTS);
    scope.info("=== INICIO: Listar alumnos activos ===");

    let students = StudentService::new(state.pool.clone())
        .list_active()
        .await
        .map_err(|e| reject(&mut scope, e))?;

    scope.set_status(StatusCode::OK);
    scope.info(format!("Se encontraron {} alumnos activos", students.len()));
    scope.info("=== FIN: Listar alumnos activos ===");
    Ok((StatusCode::OK, Json(ApiResponse::success(students))))
}

/// Get one active student.
pub async fn get_student(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> HandlerResult<Student> {
    let mut scope = state.logger.scope(&ctx, MODULE_STUDENTS);
    scope.info(format!("=== INICIO: Obtener alumno ID {} ===", id));

    let student = StudentService::new(state.pool.clone())
        .get_student(id)
        .await
        .map_err(|e| reject(&mut scope, e))?;

    scope.set_status(StatusCode::OK);
    scope.info(format!("Alumno encontrado: {}", student.full_name()));
    scope.info("=== FIN: Obtener alumno ===");
    Ok((StatusCode::OK, Json(ApiResponse::success(student))))
}

/// Register a student.
pub async fn create_student(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<StudentRequest>, JsonRejection>,
) -> HandlerResult<CreatedResponse> {
    let mut scope = state.logger.scope(&ctx, MODULE_STUDENTS);
    scope.info("=== INICIO: Crear nuevo alumno ===");
    let Json(request) =
        payload.map_err(|rejection| malformed(&mut scope, rejection.body_text()))?;

    if let Err(errors) = request.validate() {
        return Err(invalid(&mut scope, errors));
    }

    let data = request.into_data();
    scope.info(format!(
        "Registrando alumno: {} (DNI {})",
        data.full_name(),
        mask_sensitive(&data.dni, 2)
    ));

    let student = StudentService::new(state.pool.clone())
        .create_student(data)
        .await
        .map_err(|e| reject(&mut scope, e))?;

    scope.set_status(StatusCode::CREATED);
    scope.info(format!("Alumno creado exitosamente con ID: {}", student.id));
    scope.info("=== FIN: Crear nuevo alumno ===");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CreatedResponse::new(
            student.id,
            "Student created",
        ))),
    ))
}

/// Replace a student's data.
pub async fn update_student(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    payload: Result<Json<StudentRequest>, JsonRejection>,
) -> HandlerResult<Student> {
    let mut scope = state.logger.scope(&ctx, MODULE_STUDENTS);
    scope.info(format!("=== INICIO: Actualizar alumno ID {} ===", id));
    let Json(request) =
        payload.map_err(|rejection| malformed(&mut scope, rejection.body_text()))?;

    if let Err(errors) = request.validate() {
        return Err(invalid(&mut scope, errors));
    }

    let student = StudentService::new(state.pool.clone())
        .update_student(id, request.into_data())
        .await
        .map_err(|e| reject(&mut scope, e))?;

    scope.set_status(StatusCode::OK);
    scope.info(format!("Alumno ID {} actualizado correctamente", id));
    scope.info("=== FIN: Actualizar alumno ===");
    Ok((StatusCode::OK, Json(ApiResponse::success(student))))
}

/// Deactivate a student.
pub async fn delete_student(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> HandlerResult<MessageResponse> {
    let mut scope = state.logger.scope(&ctx, MODULE_STUDENTS);
    scope.info(format!("=== INICIO: Eliminar alumno ID {} ===", id));

    StudentService::new(state.pool.clone())
        .deactivate_student(id)
        .await
        .map_err(|e| reject(&mut scope, e))?;

    scope.set_status(StatusCode::OK);
    scope.info(format!("Alumno ID {} desactivado (eliminación lógica)", id));
    scope.info("=== FIN: Eliminar alumno ===");
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(MessageResponse::new("Student deactivated"))),
    ))
}

// ============================================================================
// Course Handlers
// ============================================================================

/// List active courses.
pub async fn list_courses(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> HandlerResult<Vec<Course>> {
    let mut scope = state.logger.scope(&ctx, MODULE_COURSES);
    scope.info("=== INICIO: Listar cursos activos ===");

    let courses = CourseService::new(state.pool.clone())
        .list_active()
        .await
        .map_err(|e| reject(&mut scope, e))?;

    scope.set_status(StatusCode::OK);
    scope.info(format!("Se encontraron {} cursos activos", courses.len()));
    scope.info("=== FIN: Listar cursos activos ===");
    Ok((StatusCode::OK, Json(ApiResponse::success(courses))))
}

/// Create a course.
pub async fn create_course(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<CourseRequest>, JsonRejection>,
) -> HandlerResult<CreatedResponse> {
    let mut scope = state.logger.scope(&ctx, MODULE_COURSES);
    scope.info("=== INICIO: Crear nuevo curso ===");
    let Json(request) =
        payload.map_err(|rejection| malformed(&mut scope, rejection.body_text()))?;

    if let Err(errors) = request.validate() {
        return Err(invalid(&mut scope, errors));
    }

    let course = CourseService::new(state.pool.clone())
        .create_course(request.into_data())
        .await
        .map_err(|e| reject(&mut scope, e))?;

    scope.set_status(StatusCode::CREATED);
    scope.info(format!(
        "Curso creado: {} - {} (ID {})",
        course.code, course.name, course.id
    ));
    scope.info("=== FIN: Crear nuevo curso ===");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CreatedResponse::new(course.id, "Course created"))),
    ))
}

// ============================================================================
// Enrollment Handlers
// ============================================================================

/// List every enrollment, newest first.
pub async fn list_enrollments(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> HandlerResult<Vec<EnrollmentDetail>> {
    let mut scope = state.logger.scope(&ctx, MODULE_ENROLLMENTS);
    scope.info("=== INICIO: Listar matrículas ===");

    let enrollments = EnrollmentService::new(state.pool.clone())
        .list()
        .await
        .map_err(|e| reject(&mut scope, e))?;

    scope.set_status(StatusCode::OK);
    scope.info(format!("Se encontraron {} matrículas", enrollments.len()));
    scope.info("=== FIN: Listar matrículas ===");
    Ok((StatusCode::OK, Json(ApiResponse::success(enrollments))))
}

pub async fn get_enrollment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> HandlerResult<EnrollmentDetail> {
    let mut scope = state.logger.scope(&ctx, MODULE_ENROLLMENTS);
    scope.info(format!("=== INICIO: Obtener matrícula ID {} ===", id));

    let enrollment = EnrollmentService::new(state.pool.clone())
        .get_enrollment(id)
        .await
        .map_err(|e| reject(&mut scope, e))?;

    scope.set_status(StatusCode::OK);
    scope.info(format!(
        "Matrícula encontrada: {} en {}",
        enrollment.student_name, enrollment.course_code
    ));
    scope.info("=== FIN: Obtener matrícula ===");
    Ok((StatusCode::OK, Json(ApiResponse::success(enrollment))))
}

/// Enroll a student in a course.
pub async fn create_enrollment(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<EnrollmentRequest>, JsonRejection>,
) -> HandlerResult<CreatedResponse> {
    let mut scope = state.logger.scope(&ctx, MODULE_ENROLLMENTS);
    scope.info("=== INICIO: Crear matrícula ===");
    let Json(request) =
        payload.map_err(|rejection| malformed(&mut scope, rejection.body_text()))?;

    if let Err(errors) = request.validate() {
        return Err(invalid(&mut scope, errors));
    }

    let data = request.into_data();
    scope.info(format!(
        "Matriculando alumno {} en curso {} (ciclo {})",
        data.student_id, data.course_id, data.cycle
    ));

    let enrollment = EnrollmentService::new(state.pool.clone())
        .create_enrollment(data)
        .await
        .map_err(|e| reject(&mut scope, e))?;

    scope.set_status(StatusCode::CREATED);
    scope.info(format!("Matrícula creada con ID: {}", enrollment.id));
    scope.info("=== FIN: Crear matrícula ===");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CreatedResponse::new(
            enrollment.id,
            "Enrollment created",
        ))),
    ))
}

pub async fn delete_enrollment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> HandlerResult<MessageResponse> {
    let mut scope = state.logger.scope(&ctx, MODULE_ENROLLMENTS);
    scope.info(format!("=== INICIO: Eliminar matrícula ID {} ===", id));

    EnrollmentService::new(state.pool.clone())
        .delete_enrollment(id)
        .await
        .map_err(|e| reject(&mut scope, e))?;

    scope.set_status(StatusCode::OK);
    scope.info(format!("Matrícula ID {} eliminada", id));
    scope.info("=== FIN: Eliminar matrícula ===");
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(MessageResponse::new("Enrollment deleted"))),
    ))
}

// ============================================================================
// Evaluation Handlers
// ============================================================================

/// List every evaluation, newest first.
pub async fn list_evaluations(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> HandlerResult<Vec<EvaluationDetail>> {
    let mut scope = state.logger.scope(&ctx, MODULE_EVALUATIONS);
    scope.info("=== INICIO: Listar evaluaciones ===");

    let evaluations = EvaluationService::new(state.pool.clone())
        .list()
        .await
        .map_err(|e| reject(&mut scope, e))?;

    scope.set_status(StatusCode::OK);
    scope.info(format!("Se encontraron {} evaluaciones", evaluations.len()));
    scope.info("=== FIN: Listar evaluaciones ===");
    Ok((StatusCode::OK, Json(ApiResponse::success(evaluations))))
}

/// List enrollments that still have no grade.
pub async fn list_pending_evaluations(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> HandlerResult<Vec<PendingEvaluation>> {
    let mut scope = state.logger.scope(&ctx, MODULE_EVALUATIONS);
    scope.info("=== INICIO: Listar matrículas pendientes de evaluación ===");

    let pending = EvaluationService::new(state.pool.clone())
        .list_pending()
        .await
        .map_err(|e| reject(&mut scope, e))?;

    scope.set_status(StatusCode::OK);
    scope.info(format!("{} matrículas pendientes de evaluación", pending.len()));
    scope.info("=== FIN: Listar pendientes ===");
    Ok((StatusCode::OK, Json(ApiResponse::success(pending))))
}

/// Grade an enrollment.
pub async fn create_evaluation(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<CreateEvaluationRequest>, JsonRejection>,
) -> HandlerResult<CreatedResponse> {
    let mut scope = state.logger.scope(&ctx, MODULE_EVALUATIONS);
    scope.info("=== INICIO: Registrar evaluación ===");
    let Json(request) =
        payload.map_err(|rejection| malformed(&mut scope, rejection.body_text()))?;

    if let Err(errors) = request.validate() {
        return Err(invalid(&mut scope, errors));
    }
    let (Some(enrollment_id), Some(grade)) = (request.enrollment_id, request.grade) else {
        return Err(reject(
            &mut scope,
            AppError::Validation("enrollment_id and grade are required".to_string()),
        ));
    };

    let evaluation = EvaluationService::new(state.pool.clone())
        .create_evaluation(enrollment_id, grade)
        .await
        .map_err(|e| reject(&mut scope, e))?;

    scope.set_status(StatusCode::CREATED);
    scope.info(format!(
        "Evaluación registrada: matrícula {} nota {} ({})",
        enrollment_id,
        evaluation.grade,
        if evaluation.passed { "APROBADO" } else { "DESAPROBADO" }
    ));
    scope.info("=== FIN: Registrar evaluación ===");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CreatedResponse::new(
            evaluation.id,
            "Evaluation recorded",
        ))),
    ))
}

/// Change a grade.
pub async fn update_evaluation(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateEvaluationRequest>, JsonRejection>,
) -> HandlerResult<MessageResponse> {
    let mut scope = state.logger.scope(&ctx, MODULE_EVALUATIONS);
    scope.info(format!("=== INICIO: Actualizar evaluación ID {} ===", id));
    let Json(request) =
        payload.map_err(|rejection| malformed(&mut scope, rejection.body_text()))?;

    if let Err(errors) = request.validate() {
        return Err(invalid(&mut scope, errors));
    }
    let Some(grade) = request.grade else {
        return Err(reject(&mut scope, AppError::Validation("grade is required".to_string())));
    };

    let evaluation = EvaluationService::new(state.pool.clone())
        .update_evaluation(id, grade)
        .await
        .map_err(|e| reject(&mut scope, e))?;

    scope.set_status(StatusCode::OK);
    scope.info(format!(
        "Evaluación ID {} actualizada: nota {} ({})",
        id,
        evaluation.grade,
        if evaluation.passed { "APROBADO" } else { "DESAPROBADO" }
    ));
    scope.info("=== FIN: Actualizar evaluación ===");
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(MessageResponse::new("Evaluation updated"))),
    ))
}

/// Remove a grade; its enrollment goes back to `MATRICULADO`.
pub async fn delete_evaluation(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> HandlerResult<MessageResponse> {
    let mut scope = state.logger.scope(&ctx, MODULE_EVALUATIONS);
    scope.info(format!("=== INICIO: Eliminar evaluación ID {} ===", id));

    EvaluationService::new(state.pool.clone())
        .delete_evaluation(id)
        .await
        .map_err(|e| reject(&mut scope, e))?;

    scope.set_status(StatusCode::OK);
    scope.info(format!("Evaluación ID {} eliminada, matrícula restablecida", id));
    scope.info("=== FIN: Eliminar evaluación ===");
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(MessageResponse::new("Evaluation deleted"))),
    ))
}

// ============================================================================
// Report Handlers
// ============================================================================

pub async fn report_students_per_cycle(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> HandlerResult<Vec<CycleSummary>> {
    let mut scope = state.logger.scope(&ctx, MODULE_REPORTS);
    scope.info("=== INICIO: Reporte alumnos por ciclo ===");

    let rows = ReportService::new(state.pool.clone())
        .students_per_cycle()
        .await
        .map_err(|e| reject(&mut scope, e))?;

    scope.set_status(StatusCode::OK);
    scope.info(format!("Reporte generado: {} ciclos con alumnos", rows.len()));
    scope.info("=== FIN: Reporte alumnos por ciclo ===");
    Ok((StatusCode::OK, Json(ApiResponse::success(rows))))
}

pub async fn report_most_demanded_courses(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> HandlerResult<Vec<CourseDemand>> {
    let mut scope = state.logger.scope(&ctx, MODULE_REPORTS);
    scope.info("=== INICIO: Reporte cursos más demandados ===");

    let rows = ReportService::new(state.pool.clone())
        .most_demanded_courses()
        .await
        .map_err(|e| reject(&mut scope, e))?;

    scope.set_status(StatusCode::OK);
    scope.info(format!("Reporte generado: {} cursos con matrículas", rows.len()));
    scope.info("=== FIN: Reporte cursos más demandados ===");
    Ok((StatusCode::OK, Json(ApiResponse::success(rows))))
}

pub async fn report_academic_performance(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> HandlerResult<AcademicPerformance> {
    let mut scope = state.logger.scope(&ctx, MODULE_REPORTS);
    scope.info("=== INICIO: Reporte rendimiento académico ===");

    let report = ReportService::new(state.pool.clone())
        .academic_performance()
        .await
        .map_err(|e| reject(&mut scope, e))?;

    scope.set_status(StatusCode::OK);
    scope.info(format!(
        "Reporte generado: {} cursos evaluados",
        report.by_course.len()
    ));
    scope.info("=== FIN: Reporte rendimiento académico ===");
    Ok((StatusCode::OK, Json(ApiResponse::success(report))))
}

pub async fn report_recent_cycle_grades(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> HandlerResult<Vec<CycleGradeRow>> {
    let mut scope = state.logger.scope(&ctx, MODULE_REPORTS);
    scope.info("=== INICIO: Notas de 3 últimos ciclos ===");

    let rows = ReportService::new(state.pool.clone())
        .recent_cycle_grades()
        .await
        .map_err(|e| reject(&mut scope, e))?;

    scope.set_status(StatusCode::OK);
    scope.info(format!("Notas de 3 últimos ciclos: {} registros", rows.len()));
    scope.info("=== FIN: Notas de 3 últimos ciclos ===");
    Ok((StatusCode::OK, Json(ApiResponse::success(rows))))
}

/// Grades of the latest cycle as `{cycle, grades}`, or `[]` with no enrollments.
pub async fn report_latest_cycle_grades(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> HandlerResult<serde_json::Value> {
    let mut scope = state.logger.scope(&ctx, MODULE_REPORTS);
    scope.info("=== INICIO: Notas del último ciclo ===");

    let report = ReportService::new(state.pool.clone())
        .latest_cycle_grades()
        .await
        .map_err(|e| reject(&mut scope, e))?;

    let body = match report {
        Some(report) => {
            scope.info(format!(
                "Notas del último ciclo ({}): {} registros",
                report.cycle,
                report.grades.len()
            ));
            serde_json::to_value(&report)
                .map_err(|e| reject(&mut scope, AppError::Internal(e.into())))?
        }
        None => {
            scope.info("No hay matrículas registradas");
            serde_json::Value::Array(Vec::new())
        }
    };

    scope.set_status(StatusCode::OK);
    scope.info("=== FIN: Notas del último ciclo ===");
    Ok((StatusCode::OK, Json(ApiResponse::success(body))))
}

/// Grades for `?ciclo=N`, or every cycle grouped when the parameter is absent.
pub async fn report_grades_by_cycle(
    State(state): State<AppState>,
    ctx: RequestContext,
    query: Result<Query<GradesByCycleQuery>, QueryRejection>,
) -> HandlerResult<GradesByCycle> {
    let mut scope = state.logger.scope(&ctx, MODULE_REPORTS);
    scope.info("=== INICIO: Notas por ciclo (general) ===");
    let Query(query) =
        query.map_err(|rejection| malformed(&mut scope, rejection.body_text()))?;

    let report = ReportService::new(state.pool.clone())
        .grades_by_cycle(query.ciclo)
        .await
        .map_err(|e| reject(&mut scope, e))?;

    scope.set_status(StatusCode::OK);
    scope.info(format!(
        "Reporte general generado: {} registros",
        report.total_records()
    ));
    scope.info("=== FIN: Notas por ciclo (general) ===");
    Ok((StatusCode::OK, Json(ApiResponse::success(report))))
}
