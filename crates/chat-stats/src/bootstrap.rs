use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map one of the `--log-level` names onto a `tracing` level directive.
///
/// `tracing` has no level above `error`, so `CRITICAL` shares it.
pub fn filter_directive(log_level: &str) -> &'static str {
    match log_level {
        "DEBUG" => "debug",
        "WARNING" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Output goes to stderr; stdout is reserved for the printed monthly table.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::new(filter_directive(log_level));

    let layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()?;

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_level_names() {
        assert_eq!(filter_directive("DEBUG"), "debug");
        assert_eq!(filter_directive("INFO"), "info");
        assert_eq!(filter_directive("WARNING"), "warn");
        assert_eq!(filter_directive("ERROR"), "error");
        assert_eq!(filter_directive("CRITICAL"), "error");
    }

    #[test]
    fn test_every_accepted_level_is_a_valid_filter() {
        for level in stats_core::settings::LOG_LEVELS {
            assert!(EnvFilter::try_new(filter_directive(level)).is_ok(), "{level}");
        }
    }

    #[test]
    fn test_setup_logging_twice_is_error() {
        // The first call may race with other tests; the second must fail
        // because a global subscriber is already installed.
        let _ = setup_logging("INFO");
        assert!(setup_logging("DEBUG").is_err());
    }
}
