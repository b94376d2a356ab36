//! ReelTime - session tracking for DaVinci Resolve projects
//!
//! Main entry point for the command-line application.

use anyhow::Context;
use clap::Parser;
use reeltime_domain::ProjectTotal;
use reeltime_infra::InstanceLock;
use reeltime_lib::cli::{Cli, Commands};
use reeltime_lib::utils::logging::{error_label, init_tracing};
use reeltime_lib::AppContext;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("reeltime error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // .env is optional; REELTIME_* variables may also come from the shell
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = AppContext::load_config(cli.config.clone(), cli.debug)
        .context("failed to load configuration")?;
    init_tracing(&config.logging)?;

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Err(e) => tracing::debug!(error = %e, "No .env loaded"),
    }

    let ctx = AppContext::new_with_config(config).await.map_err(|e| {
        anyhow::anyhow!("failed to initialise application context ({}): {e}", error_label(&e))
    })?;

    match cli.command {
        Commands::Run => run_tracking(&ctx).await,
        Commands::Stats { since, json } => {
            let totals = ctx.project_totals(since).await.context("failed to compute totals")?;
            print_totals(&totals, json)
        }
        Commands::Recover => {
            // A running tracker owns its open session; never close it here.
            let _lock = InstanceLock::acquire_for_database(ctx.db.path())?;
            let report = ctx.recover().await.context("crash recovery failed")?;
            println!(
                "closed {} orphaned session(s), removed {} unpromoted record(s)",
                report.closed.len(),
                report.deleted.len()
            );
            for session in &report.closed {
                println!(
                    "  {}  {}  ended {}",
                    session.id,
                    session.project_name,
                    session.ended_at.map(|ts| ts.to_rfc3339()).unwrap_or_default()
                );
            }
            Ok(())
        }
    }
}

async fn run_tracking(ctx: &AppContext) -> anyhow::Result<()> {
    let runtime = ctx.start_tracking().await.context("failed to start tracking")?;
    tracing::info!(user_id = ctx.user_id(), "ReelTime tracking; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await.context("failed to listen for Ctrl-C")?;
    tracing::info!("Interrupt received");

    runtime.shutdown().await.context("tracking did not shut down cleanly")?;
    Ok(())
}

fn print_totals(totals: &[ProjectTotal], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(totals)?);
        return Ok(());
    }

    if totals.is_empty() {
        println!("No sessions recorded.");
        return Ok(());
    }

    let width = totals.iter().map(|t| t.project_name.len()).max().unwrap_or(0).max(7);
    println!("{:<width$}  {:>8}  {:>10}", "PROJECT", "SESSIONS", "TOTAL");
    for total in totals {
        println!(
            "{:<width$}  {:>8}  {:>10}",
            total.project_name,
            total.session_count,
            total.formatted_total()
        );
    }
    Ok(())
}
