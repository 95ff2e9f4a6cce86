//! Structured logging with request correlation, and Prometheus metrics.

pub mod logging;
pub mod metrics;

pub use self::logging::{
    current_request_id, init_logging, request_logging_middleware, LogConfig, LogFormat,
    REQUEST_ID_HEADER,
};

pub use self::metrics::{http_metrics_middleware, init_metrics, metrics_handler, MetricsError};
