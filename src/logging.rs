//! Tracing setup with a runtime-adjustable level.

use std::path::Path;

use once_cell::sync::OnceCell;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use crate::model::LogLevel;

static FILTER_HANDLE: OnceCell<reload::Handle<EnvFilter, Registry>> = OnceCell::new();

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
const CRATE_TARGET: &str = "zh_flag_fix";

/// Install the global subscriber.
///
/// Logs go to stderr, or to `log_file` when given. `RUST_LOG` overrides
/// `level`. The returned guard must be kept alive to flush file output.
pub fn init(level: LogLevel, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(level)));
    let (filter, handle) = reload::Layer::new(filter);
    let timer = ChronoLocal::new(TIME_FORMAT.to_string());

    let (result, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| "zh-flag-fix.log".into());
            if let Err(e) = std::fs::create_dir_all(dir) {
                eprintln!("Failed to create log directory {}: {e}", dir.display());
            }
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let result = tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_timer(timer)
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .try_init();
            (result, Some(guard))
        }
        None => {
            let result = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_timer(timer).with_writer(std::io::stderr))
                .try_init();
            (result, None)
        }
    };

    match result {
        Ok(()) => {
            let _ = FILTER_HANDLE.set(handle);
        }
        Err(e) => eprintln!("Logging already initialized: {e}"),
    }
    guard
}

/// Change the active level. No-op before [`init`].
pub fn set_verbosity(level: LogLevel) {
    let Some(handle) = FILTER_HANDLE.get() else {
        return;
    };
    if let Err(e) = handle.modify(|filter| *filter = EnvFilter::new(directives(level))) {
        warn!(error = %e, "Failed to update log level");
    }
}

/// Whether `RUST_LOG` is set and takes precedence over configured levels.
pub fn env_override() -> bool {
    std::env::var_os(EnvFilter::DEFAULT_ENV).is_some()
}

/// `level` applies to this crate only; dependencies stay at `warn`.
fn directives(level: LogLevel) -> String {
    format!("warn,{}={}", CRATE_TARGET, level.as_filter())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_is_scoped_to_this_crate() {
        assert_eq!(directives(LogLevel::Debug), "warn,zh_flag_fix=debug");
        assert_eq!(directives(LogLevel::Error), "warn,zh_flag_fix=error");
        let filter = EnvFilter::new(directives(LogLevel::Trace)).to_string();
        assert!(filter.contains("zh_flag_fix=trace"), "{filter}");
    }
}
