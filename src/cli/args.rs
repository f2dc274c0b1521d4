//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// quern static site builder CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: quern.toml)
    #[arg(short = 'C', long, global = true, default_value = "quern.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Input directory path (relative to project root)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub input: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Override the site URI links and feeds are resolved against.
    ///
    /// Example: checking a staging build:
    ///   quern check --site-uri "https://staging.example.com"
    #[arg(short = 'U', long = "site-uri", global = true, value_hint = clap::ValueHint::Url)]
    pub site_uri: Option<String>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build the site into the output directory
    #[command(visible_alias = "b")]
    Build {
        /// Crawl the output after building
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        check: Option<bool>,

        /// Also request off-site links while checking
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        external: Option<bool>,
    },

    /// Crawl an existing output directory for broken links and invalid files
    #[command(visible_alias = "c")]
    Check {
        /// Also request off-site links
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        external: Option<bool>,

        /// Extra URI to start crawling from (repeatable)
        #[arg(short, long, value_name = "URI")]
        seed: Vec<String>,
    },

    /// Empty the output directory
    Clean,

    /// Print the navigation tree
    #[command(visible_alias = "t")]
    Tree,

    /// List every resource with its path, URI, type, date and state
    #[command(visible_alias = "l")]
    List,

    /// Print the content types input files can have
    Types,

    /// Serve the output directory
    #[command(visible_alias = "s")]
    Serve,
}
