use tracing::Level;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Initializes the global tracing subscriber. Log lines go to stderr so
/// the stdout progress stream (`--stream`) stays machine-readable.
pub fn init_logging() {
    let env_filter = EnvFilter::from_default_env()
        .add_directive(Level::INFO.into())
        .add_directive("aidgrid=debug".parse().expect("static directive parses"));

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set up tracing subscriber");
}
