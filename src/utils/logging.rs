use std::fmt;
use std::fmt::Write;
use std::path::PathBuf;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::Layer as FmtLayer;
use tracing_subscriber::{prelude::*, registry::Registry, EnvFilter};

use super::app_config::config;
use super::error::Result;

pub mod prelude {
    pub use tracing::{debug, error, info, trace, warn};
    pub use tracing::{debug_span, error_span, info_span, trace_span, warn_span};
    pub use tracing::{event, instrument, span};
}

/// Holds the non-blocking writer guards, needs to live as long as main
pub struct GlobalLoggingContext {
    _worker_guards: Vec<WorkerGuard>,
}

/// Install the global subscriber as described by the `logging` config
/// section (falling back to defaults when the section is absent).
pub fn setup() -> Result<GlobalLoggingContext> {
    let cfg: LoggingConfig = config().get("logging").unwrap_or_default();

    let (writer, guard) = cfg.target.to_writer();
    let s = Registry::default().with(cfg.to_env_filter()).with(
        FmtLayer::default()
            .with_ansi(cfg.target.supports_color())
            .with_target(false)
            .with_timer(ISOTimeFormat)
            .with_writer(writer),
    );
    s.try_init()?;

    Ok(GlobalLoggingContext {
        _worker_guards: vec![guard],
    })
}

struct ISOTimeFormat;

impl FormatTime for ISOTimeFormat {
    fn format_time(&self, w: &mut dyn Write) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

// ====== Logging Config ======

#[derive(Debug, serde::Deserialize)]
#[serde(default)]
struct LoggingConfig {
    /// filter directives, e.g. "info,burstsim=debug"
    directives: String,
    /// environment variable consulted before `directives`
    from_env: String,
    target: LoggingTarget,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directives: "info".into(),
            from_env: "RUST_LOG".into(),
            target: LoggingTarget::Term { name: TermTarget::Stderr },
        }
    }
}

impl LoggingConfig {
    fn to_env_filter(&self) -> EnvFilter {
        match std::env::var(&self.from_env) {
            Ok(dirs) if !dirs.is_empty() => EnvFilter::new(dirs),
            _ => EnvFilter::new(&self.directives),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "lowercase")]
enum LoggingTarget {
    Term { name: TermTarget },
    File { directory: PathBuf, name: PathBuf },
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
enum TermTarget {
    Stdout,
    Stderr,
}

impl LoggingTarget {
    fn supports_color(&self) -> bool {
        match self {
            LoggingTarget::Term { .. } => true,
            LoggingTarget::File { .. } => false,
        }
    }

    fn to_writer(&self) -> (NonBlocking, WorkerGuard) {
        let builder = tracing_appender::non_blocking::NonBlockingBuilder::default().lossy(false);
        match self {
            LoggingTarget::Term { name: TermTarget::Stdout } => builder.finish(std::io::stdout()),
            LoggingTarget::Term { name: TermTarget::Stderr } => builder.finish(std::io::stderr()),
            LoggingTarget::File { directory, name } => builder.finish(
                tracing_appender::rolling::RollingFileAppender::new(Rotation::NEVER, directory, name),
            ),
        }
    }
}
