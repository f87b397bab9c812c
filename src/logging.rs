//! Log setup for the `orgl` binary.
//!
//! Logs go to stderr so that stdout stays clean for results and `--json`.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn,org_lookup=info";
const VERBOSE_FILTER: &str = "info,org_lookup=debug";

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `verbose` selects between the
/// default and debug filters. Calling this twice is harmless.
pub fn init_logging(verbose: bool) {
    let fallback = if verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
