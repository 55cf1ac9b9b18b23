use std::error::Error;
use tracing::subscriber::set_global_default;
use tracing::Subscriber;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Bunyan JSON on stdout, filtered by `RUST_LOG` or `default_filter`.
pub fn get_subscriber(default_filter: &str) -> impl Subscriber + Send + Sync {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let formatting_layer = BunyanFormattingLayer::new(PKG_NAME.into(), std::io::stdout);
    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
}

/// Installs the subscriber and forwards `log` records (reqwest, hyper) to it.
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) -> Result<(), Box<dyn Error>> {
    LogTracer::init()?;
    set_global_default(subscriber)?;
    Ok(())
}
