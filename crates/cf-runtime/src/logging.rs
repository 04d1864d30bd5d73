//! Logging bring-up.
//!
//! The core logs through `tracing`. This module installs the process-wide
//! subscriber: a `fmt` layer on stderr, filtered by `CF_LOG` when set and
//! by the Environment `log_level` otherwise.
//!
//! Both entry points are safe to call repeatedly. Only the first call in a
//! process has an effect.

use std::io::IsTerminal;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "CF_LOG";

static PANIC_HOOK: Once = Once::new();

/// Builds the filter: `CF_LOG` if it parses, otherwise `level`.
#[must_use]
pub fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level))
}

/// Installs the global subscriber.
///
/// Returns `false` if a subscriber was already installed (by an earlier
/// call, a test harness, or the embedding application).
pub fn init(level: &str) -> bool {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter_for(level))
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(level, "logging initialised");
    }
    installed
}

/// Routes panics through `tracing::error!` before the default report.
pub fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map_or_else(|| "?".to_string(), ToString::to_string);
            tracing::error!(location = %location, "panic: {info}");
            previous(info);
        }));
        tracing::debug!("panic hook installed");
    });
}
