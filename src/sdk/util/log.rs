use env_logger::{Builder, Env};

/// Installs the global logger. `RUST_LOG` wins over the `info` default; a
/// second call leaves the first logger in place.
pub fn init_logging() {
    let env = Env::default().default_filter_or("info");
    if let Err(err) = Builder::from_env(env)
        .format_timestamp_secs()
        .format_module_path(false)
        .try_init()
    {
        log::debug!("Logger already installed: {}", err);
    }
}
