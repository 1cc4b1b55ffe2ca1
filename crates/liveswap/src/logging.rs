use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Filter directives used when `RUST_LOG` is unset.
///
/// The file watcher backend is held at `warn` so `--log-level debug` shows
/// liveswap's own decisions rather than every inotify/FSEvents record.
fn default_directives(level: LogLevel) -> String {
    let level = level.directive();
    match level {
        "error" | "warn" => level.to_string(),
        _ => format!("{level},notify=warn"),
    }
}

/// Send library logs to stderr; stdout is reserved for command output.
///
/// A valid `RUST_LOG` takes precedence over `level`.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_thread_names(true)
        .with_target(false);

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(err) = installed {
        eprintln!("warning: logging not initialised: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_levels_quiet_the_watcher_backend() {
        assert_eq!(default_directives(LogLevel::Info), "info,notify=warn");
        assert_eq!(default_directives(LogLevel::Trace), "trace,notify=warn");
    }

    #[test]
    fn quiet_levels_need_no_override() {
        assert_eq!(default_directives(LogLevel::Warn), "warn");
        assert_eq!(default_directives(LogLevel::Error), "error");
    }

    #[test]
    fn defaults_parse_as_filters() {
        for level in [LogLevel::Error, LogLevel::Debug] {
            assert!(EnvFilter::try_new(default_directives(level)).is_ok());
        }
    }
}
