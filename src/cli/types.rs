use clap::Parser;
use std::path::PathBuf;

use crate::migrate::DEFAULT_VARIABLES;

/// Main CLI parser structure
#[derive(Parser, Debug)]
#[command(name = "bump-upgrade")]
#[command(about = "Upgrade legacy BUMP subsections of a YAML configuration file in place", long_about = None)]
#[command(version)]
pub struct Cli {
    /// YAML file to migrate
    #[arg(value_name = "FILENAME")]
    pub filename: PathBuf,

    /// Variable names resolving 1-based variable indices (vbal_block, dirac points)
    #[arg(long, value_name = "NAME", num_args = 1.., default_values = DEFAULT_VARIABLES)]
    pub variables: Vec<String>,

    /// Log every change made to each subsection
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Show the full backtrace when an error occurs
    #[arg(short, long, default_value_t = false)]
    pub trace: bool,

    /// Enable verbose debugging
    #[arg(short = 'g', long, default_value_t = false)]
    pub debug: bool,
}
