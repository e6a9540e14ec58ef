//! Log output for the CLI

use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber filtered by `RUST_LOG`
///
/// Without `RUST_LOG` the level is `info`, or `debug` with `--debug`.
/// `--json` switches to one JSON object per event.
pub fn init_tracing(debug: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = result {
        eprintln!("Failed to initialize logging: {e}");
    }
}
