mod cli;
mod error;
mod relaunch;
mod run;

use authflow_core::Layers;
use clap::Parser;
use cli::Cli;
use std::path::Path;
use tracing_subscriber::EnvFilter;

// Plain main: the xvfb supervisor must run before any tokio runtime exists,
// since a re-exec replaces this process's work entirely.
fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Loaded before the supervisor so a background mode configured only in
    // a file still triggers the relaunch.
    let layers = match Layers::load(cli.config_dir.as_deref(), &cli.config_files, Path::new(".env"))
    {
        Ok(layers) => layers,
        Err(err) => error::handle_error(err.into()),
    };

    match relaunch::supervise(cli.background_headed, &layers) {
        Ok(None) => {}
        Ok(Some(code)) => std::process::exit(code),
        Err(err) => error::handle_error(err.into()),
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => error::handle_error(err.into()),
    };

    if let Err(err) = runtime.block_on(run::run(cli, layers)) {
        error::handle_error(err);
    }
}
