//! Pipewright - a front-end asset build pipeline with a dev server.

#![allow(dead_code)]

mod cli;
mod config;
mod core;
mod graph;
mod logger;
mod pipeline;
mod reload;
mod serve;
mod transform;
mod utils;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PipelineConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    logger::set_verbose(cli.verbose);

    let config = PipelineConfig::load(&cli.config)?;

    match &cli.command {
        Commands::Build { php, serve } => cli::build::run(&config, *php, *serve),
        Commands::Dev { php } => cli::dev::run(&config, *php),
    }
}
