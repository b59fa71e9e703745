//! Logger setup for tests.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Install `env_logger` as the global logger.
///
/// Defaults to `warn` unless `RUST_LOG` says otherwise. Safe to call from
/// every test: a second call leaves the first logger in place.
pub fn init_logging() {
    let env = Env::default().default_filter_or(LevelFilter::Warn.to_string());
    let mut builder = Builder::from_env(env);
    builder.is_test(true);
    let _ = builder.try_init();
}
