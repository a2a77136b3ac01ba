//! Diagnostic logging setup.
//!
//! Logs go to stderr so stdout can carry rendered HTML. `STREAMDOWN_LOG`
//! takes an `EnvFilter` directive and overrides the `-v` flags.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "STREAMDOWN_LOG";

fn default_directive(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("warn,streamdown={level}")
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_crate_level_only() {
        assert_eq!(default_directive(0), "warn,streamdown=warn");
        assert_eq!(default_directive(2), "warn,streamdown=debug");
        assert_eq!(default_directive(9), "warn,streamdown=trace");
    }

    #[test]
    fn init_twice_does_not_panic() {
        init(0);
        init(1);
    }
}
