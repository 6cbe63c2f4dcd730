use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Installs the global subscriber: Bunyan JSON to stdout, filtered by
/// `RUST_LOG` or `default_filter`.
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place and return `Ok`.
pub fn init_tracing(name: &str, default_filter: &str) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))?;

    let formatting_layer = BunyanFormattingLayer::new(name.to_string(), std::io::stdout);
    let subscriber = Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer);

    if subscriber.try_init().is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_ok() {
        assert!(init_tracing("parkchat-test", "warn").is_ok());
        assert!(init_tracing("parkchat-test", "warn").is_ok());
    }
}
