mod cli;

use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();
    std::process::exit(cli::run_from_env());
}

/// Warnings only unless `RUST_LOG` asks for more; events go to stderr so
/// stdout stays clean for JSON and slice listings.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
