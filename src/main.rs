// SPDX-License-Identifier: PMPL-1.0-or-later

//! covenant: workspace dependency constraints, checked and explained

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use covenant::check::{self, CheckOptions};
use covenant::constraints::Constraints;
use covenant::workspace::WorkspaceInfo;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "covenant")]
#[command(version = "0.4.0")]
#[command(about = "Dependency constraint enforcement for multi-package workspaces")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the workspace satisfies its constraints
    Check {
        /// Directory to start workspace discovery from
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Suppress the stdout report
        #[arg(short, long)]
        quiet: bool,

        /// Additional report sink, FORMAT:PATH or a bare path (repeatable)
        #[arg(short, long, value_name = "TARGET")]
        output: Vec<String>,

        /// Exit 0 even when findings are reported
        #[arg(long)]
        exit_zero: bool,
    },

    /// Generate the standalone constraints program for inspection
    Generate {
        /// Directory to start workspace discovery from
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        out_file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            dir,
            quiet,
            output,
            exit_zero,
        } => {
            let code = check::run(&CheckOptions {
                project_dir: dir,
                quiet,
                outputs: output,
                exit_zero,
            })?;
            if code != 0 {
                std::process::exit(code);
            }
        }

        Commands::Generate { dir, out_file } => {
            let start_dir = match dir {
                Some(dir) => dir,
                None => std::env::current_dir()?,
            };
            let workspace = Arc::new(WorkspaceInfo::load(&start_dir)?);
            let constraints = Constraints::load(workspace)?;
            let full_source = constraints.full_source();

            match out_file {
                Some(path) => {
                    std::fs::write(&path, &full_source)?;
                    eprintln!(
                        "Generated full source at {}",
                        path.display().to_string().truecolor(0, 175, 175).bold()
                    );
                }
                None => print!("{full_source}"),
            }
        }
    }

    Ok(())
}
