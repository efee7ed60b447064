use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

const CRATE_TARGET: &str = "wallet_oracle";

/// Level for this crate's own diagnostics. Oracle degradation is logged at
/// warn, so it stays visible without `--verbose`.
fn crate_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging(verbose: bool) {
    let level = crate_level(verbose);
    let app_filter = Targets::new().with_target(CRATE_TARGET, level);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time())
        .with(app_filter)
        .with(env_filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_level() {
        assert_eq!(crate_level(true), LevelFilter::DEBUG);
        assert_eq!(crate_level(false), LevelFilter::WARN);
        assert_eq!(crate_level(false).to_string().to_lowercase(), "warn");
    }
}
