//! Global tracing subscriber setup. Only the binary calls this.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Environment;

/// Level filter used when `RUST_LOG` is not set.
#[must_use]
pub fn default_filter(environment: Environment) -> &'static str {
    match environment {
        Environment::Local | Environment::Dev => "accounts_service=debug,tower_http=debug,info",
        Environment::Prod => "info",
    }
}

/// Install the global subscriber: pretty output in `local`, JSON elsewhere.
/// `RUST_LOG` overrides the level filter.
pub fn init(environment: Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(environment).into());

    let registry = tracing_subscriber::registry().with(filter);
    match environment {
        Environment::Local => registry.with(tracing_subscriber::fmt::layer()).init(),
        Environment::Dev | Environment::Prod => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prod_is_quieter_than_dev() {
        assert_eq!(default_filter(Environment::Prod), "info");
        assert!(default_filter(Environment::Dev).contains("debug"));
        assert!(default_filter(Environment::Local).contains("debug"));
    }
}
