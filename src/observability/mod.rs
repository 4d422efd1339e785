pub mod context;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod request_log;

pub use context::{RequestContext, RequestId, REQUEST_ID_HEADER};
pub use health::{AggregatedHealth, DependencyHealth, HealthChecker, HealthStatus};
pub use logging::{init_logging, mask_sensitive, LogConfig, LogFormat};
pub use metrics::{get_metrics, init_metrics, LatencyTimer, Metrics, METRICS};
pub use request_log::{
    FileLogSink, LogEntry, LogLevel, LogSink, LogWriteError, RequestLogger, RequestScope,
    TimingRegistry, TransactionIdGenerator, CENTRAL_LOG_FILE,
};
