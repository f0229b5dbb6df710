use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global `fmt` subscriber once. An explicit `level` wins over
/// `RUST_LOG`; without either the filter is `info`.
pub fn install_tracing_subscriber(level: Option<&str>) {
    static INSTALLED: OnceLock<()> = OnceLock::new();
    INSTALLED.get_or_init(|| {
        let filter = match level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        };
        let _ = fmt().with_env_filter(filter).try_init();
    });
}
