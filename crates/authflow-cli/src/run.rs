use anyhow::Result;
use authflow_browser::{BrowserDriver, DriverError, LaunchSpec, PlaywrightDriver};
use authflow_core::{
    CliOverrides, Config, ConsoleCodeProvider, FlowError, FlowOptions, HttpFetcher, Layers,
    LoginFlow,
};
use chrono::Local;
use tracing::info;

use crate::cli::Cli;

pub async fn run(cli: Cli, layers: Layers) -> Result<()> {
    let overrides = CliOverrides {
        headless: if cli.headless {
            Some(true)
        } else if cli.headed {
            Some(false)
        } else {
            None
        },
        background_headed: cli.background_headed,
        no_keep_open: cli.no_keep_open,
    };
    let mut config = Config::build(&layers, &overrides)?;
    info!(mode = %config.exec_mode(), url = %config.login_url, "starting login flow");

    // One artifacts directory per run, so screenshots never mix.
    config.artifacts_dir = config
        .artifacts_dir
        .join(format!("run_{}", Local::now().format("%Y%m%d_%H%M%S")));

    let mut spec = LaunchSpec::new(&config.user_data_dir, &config.artifacts_dir);
    spec.headless = config.headless;
    spec.sandbox = config.sandbox;

    let driver = PlaywrightDriver::launch(&spec)
        .await
        .map_err(driver_launch_error)?;

    let codes = ConsoleCodeProvider::default();
    let fetcher = HttpFetcher::new();
    let flow = LoginFlow::new(&config, &driver, &codes, &fetcher);

    let outcome = flow
        .run(FlowOptions {
            resume: cli.resume,
            run_downloads: cli.download,
        })
        .await;

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(err) => {
            // Leave the browser up on failure so the page can be inspected.
            if config.keep_browser_open {
                eprintln!("Flow failed; browser left open. Press Ctrl+C to exit.");
                tokio::signal::ctrl_c().await.ok();
            }
            driver.close().await.ok();
            return Err(err.into());
        }
    };

    info!(state = %outcome.state, "flow finished");
    if let Some(summary) = &outcome.downloads {
        println!(
            "Downloads: {} of {} succeeded",
            summary.succeeded, summary.attempted
        );
        for (label, reason) in &summary.failed {
            println!("  failed: {label}: {reason}");
        }
    }

    if config.keep_browser_open {
        println!("Browser session stays open. Press Ctrl+C to exit.");
        tokio::signal::ctrl_c().await.ok();
    }
    driver.close().await.ok();
    Ok(())
}

/// A missing Node or Playwright runtime is a setup problem, not a flow
/// failure, and should exit with the configuration status.
fn driver_launch_error(err: DriverError) -> FlowError {
    match err {
        DriverError::NotReady(reason) => FlowError::Config(reason),
        other => FlowError::Driver(other),
    }
}
