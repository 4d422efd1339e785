use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::{handlers, middleware::request_context_middleware};
use crate::observability::{HealthChecker, RequestLogger};
use crate::repositories::DbPool;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub logger: Arc<RequestLogger>,
    pub metrics_handle: Option<PrometheusHandle>,
    pub health_checker: Option<Arc<HealthChecker>>,
}

impl AppState {
    pub fn new(pool: DbPool, logger: Arc<RequestLogger>) -> Self {
        Self {
            pool,
            logger,
            metrics_handle: None,
            health_checker: None,
        }
    }

    /// Adds metrics handle to the state.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Adds health checker to the state.
    pub fn with_health_checker(mut self, checker: Arc<HealthChecker>) -> Self {
        self.health_checker = Some(checker);
        self
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Students
        .route(
            "/alumnos",
            get(handlers::list_students).post(handlers::create_student),
        )
        .route(
            "/alumnos/:id",
            get(handlers::get_student)
                .put(handlers::update_student)
                .delete(handlers::delete_student),
        )
        // Courses
        .route(
            "/cursos",
            get(handlers::list_courses).post(handlers::create_course),
        )
        // Enrollments
        .route(
            "/matriculas",
            get(handlers::list_enrollments).post(handlers::create_enrollment),
        )
        .route(
            "/matriculas/:id",
            get(handlers::get_enrollment).delete(handlers::delete_enrollment),
        )
        // Evaluations
        .route(
            "/evaluaciones",
            get(handlers::list_evaluations).post(handlers::create_evaluation),
        )
        .route("/evaluaciones/pendientes", get(handlers::list_pending_evaluations))
        .route(
            "/evaluaciones/:id",
            put(handlers::update_evaluation).delete(handlers::delete_evaluation),
        )
        // Reports
        .route("/reportes/alumnos_ciclo", get(handlers::report_students_per_cycle))
        .route("/reportes/cursos_demandados", get(handlers::report_most_demanded_courses))
        .route("/reportes/rendimiento", get(handlers::report_academic_performance))
        .route("/reportes/notas_3_ultimos_ciclos", get(handlers::report_recent_cycle_grades))
        .route("/reportes/notas_ultimo_ciclo", get(handlers::report_latest_cycle_grades))
        .route("/reportes/notas_por_ciclo", get(handlers::report_grades_by_cycle))
        .route_layer(middleware::from_fn(request_context_middleware))
}

/// Creates the main API router with all routes.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/health/detailed", get(handlers::detailed_health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/live", get(handlers::liveness_check))
        // Metrics endpoint
        .route("/metrics", get(handlers::metrics_endpoint))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
