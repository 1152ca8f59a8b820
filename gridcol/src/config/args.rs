//! Command-line argument parsing for grid collocation runs

use clap::Parser;

/// Evaluate Gaussian basis functions on a point grid from a YAML configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "collocation.yaml")]
    pub config_file: String,

    /// Override output file: (default stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Override derivative order (0-3)
    #[arg(short, long)]
    pub derivative: Option<usize>,

    /// Override the number of points per block
    #[arg(long)]
    pub block_size: Option<usize>,

    /// Always use the generic kernels
    #[arg(long)]
    pub generic_only: bool,

    /// Evaluate blocks on the calling thread only
    #[arg(long)]
    pub serial: bool,

    /// Compare the selected kernels against the generic ones
    #[arg(long)]
    pub validate: bool,

    /// Write the collocation arrays as JSON to this path
    #[arg(long)]
    pub results: Option<String>,
}
