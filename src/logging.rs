//! Logging setup for the `optiya` binary

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Filter directive for a bare level, scoped to this crate
pub fn default_directive(level: &str) -> String {
    format!("optiya_console={},optiya={}", level, level)
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over the configured level. Output goes to stderr so it
/// never mixes with command output on stdout. `verbose` forces debug.
pub fn init(config: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.level.as_str() };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    let fmt_layer = match config.format.as_str() {
        "json" => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
        "compact" => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed(),
        other => {
            if other != "pretty" {
                eprintln!("Warning: Unknown log format '{}', using pretty", other);
            }
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .boxed()
        }
    };

    // A second init (tests, embedding) is not fatal
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_parses() {
        let directive = default_directive("info");
        assert_eq!(directive, "optiya_console=info,optiya=info");
        assert!(EnvFilter::try_new(directive).is_ok());
    }
}
