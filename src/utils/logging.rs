use crate::utils::config::LogFormat;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive used for a run.
///
/// `RUST_LOG` wins over everything; otherwise `--verbose` forces debug
/// output for this crate and the configured level applies.
pub fn filter_directive(configured: &str, verbose: bool) -> String {
    if let Ok(from_env) = std::env::var(EnvFilter::DEFAULT_ENV) {
        if !from_env.trim().is_empty() {
            return from_env;
        }
    }
    if verbose {
        "promptool=debug,info".to_string()
    } else {
        configured.to_string()
    }
}

/// Install the global subscriber. Logs go to stderr.
///
/// Calling this twice is harmless; the second call is ignored.
pub fn init(configured: &str, format: LogFormat, verbose: bool) {
    let filter = EnvFilter::try_new(filter_directive(configured, verbose))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_verbose() {
        if std::env::var(EnvFilter::DEFAULT_ENV).is_ok() {
            return;
        }
        assert_eq!(filter_directive("warn", false), "warn");
        assert!(filter_directive("warn", true).contains("promptool=debug"));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init("info", LogFormat::Pretty, false);
        init("info", LogFormat::Json, true);
    }
}
