//! Tracing setup for the authorizer service.
//!
//! Configures a tracing subscriber with environment filtering and formatted
//! output. In tests, subscriber initialization is adapted to tolerate repeat
//! installs.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initializes tracing for the service.
///
/// Uses `RUST_LOG` style environment filtering, defaulting to `info` when
/// unset or invalid.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer();
    let registry = tracing_subscriber::registry().with(filter).with(fmt_layer);
    init_subscriber(registry);
}

fn init_subscriber<S>(subscriber: S)
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    #[cfg(test)]
    {
        let _ = subscriber.try_init();
    }
    #[cfg(not(test))]
    {
        subscriber.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_is_idempotent_in_tests() {
        init_tracing();
        init_tracing();
    }
}
