///
/// This module implements the CLI interface for canvas-avatars: command parsing,
/// the startup gates, and user-visible console output.
///
/// All decision logic (client building, the per-client upload sequence) lives in
/// the [`canvas-avatars-core`] crate. This module wires the real collaborators
/// (settings file, roster CSV, Canvas HTTP client, audit log) into it.
///
/// ## How To Use
/// - From the shell: `canvas-avatars upload --config Settings/settings.json`.
/// - Programmatically: call [`run`] with a constructed [`Cli`].
///
/// [`canvas-avatars-core`]: ../../canvas-avatars-core/
use crate::canvas::CanvasClient;
use crate::checks::check_paths;
use crate::load_config::{load_config, locate_settings};
use crate::logging;
use crate::roster::read_roster;
use anyhow::Result;
use canvas_avatars_core::synchronise::{synchronise, Progress, SynchroniseError};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI for canvas-avatars: batch-upload roster avatars into Canvas.
#[derive(Parser)]
#[clap(
    name = "canvas-avatars",
    version,
    about = "Match roster entries to image files and set them as Canvas avatars"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload every roster image and set it as the matching user's avatar
    Upload {
        /// Path to a JSON or YAML settings file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Directory searched for a settings file when --config is not given
        #[clap(long, default_value = "Settings")]
        settings_dir: PathBuf,
    },
}

fn print_progress(progress: Progress) {
    match progress {
        Progress::ClientCreated {
            external_id,
            image_name,
        } => println!("Creating User: {external_id}\tWith Image: {image_name}"),
        Progress::ClientsBuilt { accepted, .. } => println!("Total of {accepted} users created"),
        Progress::ClientFinished { done, total, .. } => {
            println!("Finished {done} of {total} users")
        }
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Upload {
            config,
            settings_dir,
        } => {
            let config_path = match config {
                Some(path) => path,
                None => locate_settings(&settings_dir)?,
            };
            let settings = match load_config(&config_path) {
                Ok(settings) => settings,
                Err(e) => {
                    println!("Failed to load settings: {e:#}. Exiting application");
                    return Err(e);
                }
            };

            logging::init(&settings.log_path());
            settings.trace_loaded();

            if let Err(e) = check_paths(&settings) {
                let message = format!("FILE: {e}. Exiting program");
                tracing::error!(error = %e, "{message}");
                println!("{message}");
                return Err(e.into());
            }
            tracing::info!("File checks complete, starting client generation");

            let records = read_roster(&settings.roster_path())?;
            let images_dir = settings.images_dir();
            let domain = settings.domain.clone();
            let token = settings.access_token.clone();

            let result = synchronise(
                &records,
                &images_dir,
                || async move { CanvasClient::connect(&domain, &token).await },
                print_progress,
            )
            .await;

            match result {
                Ok(report) => {
                    tracing::info!(
                        command = "upload",
                        uploaded = report.uploaded(),
                        skipped = report.skipped(),
                        failed = report.failed(),
                        "Upload complete"
                    );
                    println!(
                        "Upload complete: {} uploaded, {} skipped, {} failed",
                        report.uploaded(),
                        report.skipped(),
                        report.failed()
                    );
                    Ok(())
                }
                Err(e @ SynchroniseError::NoClients { .. }) => {
                    tracing::error!(command = "upload", error = %e, "No users were found, exiting");
                    println!("No users were created. Closing application");
                    Err(e.into())
                }
                Err(e @ SynchroniseError::Connect(_)) => {
                    tracing::error!(command = "upload", error = %e, "Error connecting to Canvas, exiting");
                    println!("Error connecting to Canvas: {e}. Quitting application");
                    Err(e.into())
                }
            }
        }
    }
}
