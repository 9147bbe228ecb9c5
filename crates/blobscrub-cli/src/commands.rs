use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use blobscrub_core::{CancellationToken, ScrubResult, ScrubResults, Scrubber};
use blobscrub_store::{LocalImageStore, StoreController};
use colored::Colorize;
use tracing::{info, warn, Level};

use crate::cli::*;
use crate::config::{HttpConfig, ScrubConfig, StorageConfig};

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Scrub(args) => cmd_scrub(args, cli.verbose, cli.format).await,
        Command::Verify(args) => cmd_verify(args, cli.verbose),
    }
}

async fn cmd_scrub(args: ScrubArgs, verbose: bool, format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config(&args.config, verbose)?;

    if server_is_running(&config.http).await? {
        bail!(
            "registry is serving on {}; stop it before scrubbing",
            config.http.probe_url()
        );
    }

    let controller = build_controller(&config.storage);
    let cancel = CancellationToken::new();
    let (results, outcome) = scrub_until_interrupted(controller, cancel).await?;

    let stdout = io::stdout().lock();
    match format {
        OutputFormat::Text => results.write_table(stdout)?,
        OutputFormat::Json => results.write_json(stdout)?,
    }
    print_summary(&results);

    outcome.context("scrub did not complete")
}

fn cmd_verify(args: VerifyArgs, verbose: bool) -> anyhow::Result<()> {
    let config = load_config(&args.config, verbose)?;
    let mut out = io::stdout().lock();
    writeln!(out, "{} {} is valid", "✓".green().bold(), args.config.display())?;
    writeln!(out, "  Storage: {}", config.storage.root_directory.display())?;
    for (route, sub) in &config.storage.sub_paths {
        writeln!(out, "  {} {}", route.yellow(), sub.root_directory.display())?;
    }
    writeln!(out, "  Registry: {}", config.http.probe_url().cyan())?;
    Ok(())
}

fn load_config(path: &Path, verbose: bool) -> anyhow::Result<ScrubConfig> {
    let config = ScrubConfig::load(path)?;
    init_logging(verbose, config.log.level()?);
    Ok(config)
}

fn init_logging(verbose: bool, configured: Option<Level>) {
    let level = if verbose {
        Level::DEBUG
    } else {
        configured.unwrap_or(Level::WARN)
    };
    // A subscriber may already be installed by the embedding process.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .try_init();
}

/// Any HTTP response at all means a registry is serving the store.
async fn server_is_running(http: &HttpConfig) -> anyhow::Result<bool> {
    let client = reqwest::Client::builder()
        .timeout(PROBE_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;
    let url = http.probe_url();
    match client.get(&url).send().await {
        Ok(resp) => {
            warn!(%url, status = %resp.status(), "registry answered probe");
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}

fn build_controller(storage: &StorageConfig) -> StoreController {
    let mut controller = StoreController::new(Arc::new(LocalImageStore::new(&storage.root_directory)));
    for (route, sub) in &storage.sub_paths {
        controller = controller.with_sub_store(route.clone(), Arc::new(LocalImageStore::new(&sub.root_directory)));
    }
    controller
}

/// Run the scrub on a blocking thread; Ctrl-C cancels it and the rows
/// computed so far are still returned.
async fn scrub_until_interrupted(
    controller: StoreController,
    cancel: CancellationToken,
) -> anyhow::Result<(ScrubResults, ScrubResult<()>)> {
    let scrubber = Scrubber::with_cancellation(cancel.clone());
    let mut task = tokio::task::spawn_blocking(move || {
        let mut results = ScrubResults::new();
        let outcome = scrubber.scrub_all(&controller, &mut results);
        (results, outcome)
    });

    let joined = tokio::select! {
        joined = &mut task => joined,
        Ok(()) = tokio::signal::ctrl_c() => {
            info!("interrupted, finishing current image");
            cancel.cancel();
            task.await
        }
    };
    joined.context("scrub task panicked")
}

fn print_summary(results: &ScrubResults) {
    let affected = results.affected().count();
    let counts = format!("{} images, {} affected", results.len(), affected);
    if affected == 0 {
        eprintln!("{} {}", "✓".green().bold(), counts.green());
    } else {
        eprintln!("{} {}", "✗".red().bold(), counts.red().bold());
    }
}
