use std::sync::Arc;

/// Logging capability consumed by the framework core.
///
/// Message builders are closures so that disabled levels cost nothing: the
/// string is only assembled when the sink actually wants it. The core calls
/// the logger at route registration, lookup, group merges and failures; it
/// must be safe to call from any task.
pub trait Logger: Send + Sync {
    /// Log at debug level.
    fn debug(&self, message: &dyn Fn() -> String);
    /// Log at info level.
    fn info(&self, message: &dyn Fn() -> String);
    /// Log at warn level.
    fn warn(&self, message: &dyn Fn() -> String);
    /// Log at error level.
    fn error(&self, message: &dyn Fn() -> String);
}

/// The default logger: forwards to the `tracing` ecosystem.
///
/// Each call is guarded by `tracing::enabled!` so the message closure never
/// runs when the level is filtered out. Install a `tracing_subscriber` to see
/// the output.
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &dyn Fn() -> String) {
        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::debug!("{}", message());
        }
    }

    fn info(&self, message: &dyn Fn() -> String) {
        if tracing::enabled!(tracing::Level::INFO) {
            tracing::info!("{}", message());
        }
    }

    fn warn(&self, message: &dyn Fn() -> String) {
        if tracing::enabled!(tracing::Level::WARN) {
            tracing::warn!("{}", message());
        }
    }

    fn error(&self, message: &dyn Fn() -> String) {
        if tracing::enabled!(tracing::Level::ERROR) {
            tracing::error!("{}", message());
        }
    }
}

/// A logger that drops everything.
pub struct NopLogger;

impl Logger for NopLogger {
    fn debug(&self, _message: &dyn Fn() -> String) {}
    fn info(&self, _message: &dyn Fn() -> String) {}
    fn warn(&self, _message: &dyn Fn() -> String) {}
    fn error(&self, _message: &dyn Fn() -> String) {}
}

pub(crate) type SharedLogger = Arc<dyn Logger>;
