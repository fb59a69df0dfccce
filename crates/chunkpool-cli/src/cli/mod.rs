//! CLI for the chunkpool uploader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use chunkpool_core::config;
use std::path::PathBuf;

use commands::{run_completions, run_config, run_man, run_restore, run_upload, UploadArgs};

/// Top-level CLI for the chunkpool uploader.
#[derive(Debug, Parser)]
#[command(name = "chunkpool")]
#[command(about = "chunkpool: bounded-concurrency chunked uploader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Split files into content-addressed chunks and upload them into a store.
    Upload {
        /// Files to upload.
        #[arg(required = true, value_name = "FILE")]
        paths: Vec<PathBuf>,
        /// Chunk store directory (default: `store_dir` from config).
        #[arg(long, value_name = "DIR")]
        dest: Option<PathBuf>,
        /// Chunk size in bytes (default: `chunk_size` from config).
        #[arg(long, value_name = "BYTES")]
        chunk_size: Option<usize>,
        /// Run up to N chunk uploads concurrently (default: `max_jobs` from config).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
        /// Promote waiting chunks from the command loop instead of on submit/completion.
        #[arg(long)]
        manual_cycle: bool,
    },

    /// Reassemble a file from its manifest.
    Restore {
        /// Manifest id (the file's SHA-256, as printed by `upload`).
        manifest: String,
        /// Output path.
        out: PathBuf,
        /// Chunk store directory (default: `store_dir` from config).
        #[arg(long, value_name = "DIR")]
        dest: Option<PathBuf>,
    },

    /// Show the config file path and effective settings.
    Config,

    /// Print shell completions to stdout.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },

    /// Print a roff man page to stdout.
    Man,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        match cli.command {
            CliCommand::Completions { shell } => return run_completions(shell),
            CliCommand::Man => return run_man(),
            _ => {}
        }

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Upload {
                paths,
                dest,
                chunk_size,
                jobs,
                manual_cycle,
            } => {
                let args = UploadArgs {
                    paths,
                    dest,
                    chunk_size,
                    jobs,
                    manual_cycle,
                };
                run_upload(&cfg, args).await?
            }
            CliCommand::Restore {
                manifest,
                out,
                dest,
            } => run_restore(&cfg, &manifest, &out, dest).await?,
            CliCommand::Config => run_config(&cfg)?,
            CliCommand::Completions { .. } | CliCommand::Man => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
