//! quern - a static site builder that checks what it built.

mod checker;
mod cli;
mod config;
mod core;
mod generator;
mod graph;
mod logger;
mod navigator;
mod pipeline;
mod resource;
mod serve;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::SiteConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = SiteConfig::load(&cli)?;

    match &cli.command {
        Commands::Build { .. } => cli::build::build_site(&config),
        Commands::Check { seed, .. } => cli::check::check_site(&config, seed),
        Commands::Clean => cli::clean::clean_site(&config),
        Commands::Tree => cli::inspect::print_tree(&config),
        Commands::List => cli::inspect::print_list(&config),
        Commands::Types => {
            cli::inspect::print_types();
            Ok(())
        }
        Commands::Serve => serve::serve(&config),
    }
}
