use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset; lapin is chatty at info.
pub const DEFAULT_FILTER: &str = "info,lapin=warn";

/// Installs the global fmt subscriber. Safe to call more than once.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_err()
    {
        tracing::debug!("Tracing subscriber already installed");
    }
}
