//! CLI for verifying recovery images against their chunklists.

mod commands;
mod progress;

use anyhow::Result;
use chunkcheck_core::config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_completions, run_digest, run_inspect, run_man, run_verify, VerifyArgs};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "chunkcheck")]
#[command(about = "Verify disk images against signed chunklists", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Authenticate a chunklist and verify an image against it.
    Verify {
        /// Disk image to verify.
        image: Option<PathBuf>,

        /// Chunklist for the image. Defaults to the image path with a .chunklist extension.
        chunklist: Option<PathBuf>,

        /// Directory holding the image pair when no paths are given.
        #[arg(short = 'o', long = "outdir", value_name = "DIR", conflicts_with = "image")]
        dir: Option<PathBuf>,

        /// Basename of the pair in the directory (<NAME>.dmg and <NAME>.chunklist).
        #[arg(short = 'n', long, value_name = "NAME", conflicts_with = "image")]
        basename: Option<String>,

        /// Print the verdict as JSON on stdout.
        #[arg(long)]
        json: bool,

        /// Do not print per-chunk progress.
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show the header and chunk table of a chunklist (signature is not checked).
    Inspect {
        /// Path to the chunklist.
        chunklist: PathBuf,

        /// List every chunk with its size and hash.
        #[arg(long)]
        chunks: bool,
    },

    /// Print the running digest (header + chunk table) of a chunklist.
    Digest {
        /// Path to the chunklist.
        chunklist: PathBuf,
    },

    /// Generate shell completions on stdout.
    Completions {
        /// Target shell.
        shell: clap_complete::Shell,
    },

    /// Render the man page on stdout.
    Man,
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Verify {
                image,
                chunklist,
                dir,
                basename,
                json,
                quiet,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                run_verify(
                    &cfg,
                    VerifyArgs {
                        image,
                        chunklist,
                        dir,
                        basename,
                        json,
                        quiet,
                    },
                )?;
            }
            CliCommand::Inspect { chunklist, chunks } => run_inspect(&chunklist, chunks)?,
            CliCommand::Digest { chunklist } => run_digest(&chunklist)?,
            CliCommand::Completions { shell } => run_completions(shell)?,
            CliCommand::Man => run_man()?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
