//! Logging setup.
//!
//! All modules log through the `tracing` macros. The host wires a sink in
//! one of two ways: a process-wide callback registered once with
//! [`set_logging_callback`] (the embedding API path), or a rotating log
//! file via [`setup_file_logging`]. The callback registry is the one piece
//! of process-wide state in the crate; it may receive records from any
//! thread and serialises internally.

use std::fmt::Write as _;
use std::fs;
use std::sync::OnceLock;

use camino::Utf8PathBuf;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_appender::rolling;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

/// Severity passed to the host's sink callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<&Level> for LogLevel {
    fn from(level: &Level) -> Self {
        match *level {
            Level::TRACE => LogLevel::Trace,
            Level::DEBUG => LogLevel::Debug,
            Level::INFO => LogLevel::Info,
            Level::WARN => LogLevel::Warn,
            Level::ERROR => LogLevel::Error,
        }
    }
}

type LogSink = Box<dyn Fn(LogLevel, &str) + Send + Sync>;

static LOG_SINK: OnceLock<LogSink> = OnceLock::new();

/// Forwards every event's level and formatted message to the registered
/// sink callback. A no-op until a sink is registered.
struct CallbackLayer;

impl<S: Subscriber> Layer<S> for CallbackLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if let Some(sink) = LOG_SINK.get() {
            let mut visitor = MessageVisitor::default();
            event.record(&mut visitor);
            sink(LogLevel::from(event.metadata().level()), &visitor.message);
        }
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        }
    }
}

/// Register the host's sink callback and install the forwarding
/// subscriber. The registry is initialised once before the first query;
/// re-registration is not supported and returns `InvalidArgument`.
pub fn set_logging_callback<F>(callback: F) -> Result<()>
where
    F: Fn(LogLevel, &str) + Send + Sync + 'static,
{
    if LOG_SINK.set(Box::new(callback)).is_err() {
        return Err(Error::InvalidArgument(
            "a logging callback is already registered".into(),
        ));
    }

    // If file logging already installed a subscriber, its CallbackLayer
    // starts forwarding now; otherwise install a minimal one.
    let _ = tracing_subscriber::registry().with(CallbackLayer).try_init();
    tracing::info!("Logging callback registered");
    Ok(())
}

/// Setup logging with a daily rotating file appender.
///
/// # Arguments
/// * `log_dir` - Directory for log files (e.g., "logs")
/// * `log_prefix` - Prefix for log files (e.g., "plugsort")
/// * `debug_mode` - If true, use debug level; otherwise use info level
///
/// # Returns
/// A guard that must be held for the duration of the program to keep
/// logging active
pub fn setup_file_logging(
    log_dir: &str,
    log_prefix: &str,
    debug_mode: bool,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    // Create log directory if it doesn't exist
    let log_path = Utf8PathBuf::from(log_dir);
    if !log_path.exists() {
        fs::create_dir_all(&log_path).map_err(|e| Error::io(&log_path, &e))?;
    }

    // Create daily rotating file appender
    let file_appender = rolling::daily(log_dir, log_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Determine log level based on debug mode
    let env_filter = if debug_mode {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false) // No ANSI codes in log files
                .with_target(true),
        )
        .with(CallbackLayer)
        .try_init()
        .map_err(|e| Error::InvalidArgument(format!("logging already initialised: {e}")))?;

    tracing::info!(
        "Logging initialized: dir={}, prefix={}, debug={}",
        log_dir,
        log_prefix,
        debug_mode
    );

    Ok(guard)
}
