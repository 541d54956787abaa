use std::sync::Once;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

static INIT: Once = Once::new();

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
/// Later calls are no-ops.
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let registry = tracing_subscriber::registry().with(env_filter);
        let installed = match config.format {
            LogFormat::Compact => registry
                .with(fmt::layer().with_target(false).compact())
                .try_init(),
            LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        };

        if let Err(err) = installed {
            eprintln!("logging was already initialised: {err}");
        }
    });
}
