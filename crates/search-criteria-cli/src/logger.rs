//! Logger setup for the `searchq` binary.

/// Installs the global logger. `RUST_LOG` wins over `--verbose`.
pub fn init_logger(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}
