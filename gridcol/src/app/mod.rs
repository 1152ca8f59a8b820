mod basis;
mod geometry;
mod grid;
mod report;
mod runner;

pub use basis::{build_basis, BasisRegistry};
pub use geometry::{build_geometry, Geometry};
pub use grid::build_points;
pub use runner::{
    compute_orbitals, run_collocation, selected_kernels, validate_against_generic,
    VALIDATION_THRESHOLD,
};

use self::report::{report_basis, report_orbitals, report_outputs};
use crate::config::{Args, Config};
use crate::io::{setup_output, write_json};
use clap::Parser;
use collocation::Layout;
use color_eyre::eyre::{Result, WrapErr};
use serde::Serialize;
use std::fs;
use tracing::info;

/// Everything a run produces; written as JSON by `--results`.
#[derive(Debug, Serialize)]
pub struct GridResults {
    pub order: usize,
    pub layout: Layout,
    pub n_components: usize,
    pub n_points: usize,
    pub labels: Vec<String>,
    pub kernels: Vec<String>,
    pub arrays: Vec<Vec<f64>>,
    /// `[orbital][point]`
    pub orbitals: Option<Vec<Vec<f64>>>,
    pub max_deviation: Option<f64>,
}

pub struct GridApplication {
    args: Args,
    config: Config,
}

impl GridApplication {
    pub fn from_cli() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    pub fn from_args(args: Args) -> Result<Self> {
        let config = load_config(&args)?;
        Ok(Self { args, config })
    }

    pub fn run(self) -> Result<()> {
        setup_output(self.args.output.as_ref())?;
        info!("Configuration loaded from: {}", self.args.config_file);

        let results = self.compute()?;
        if let Some(path) = &self.args.results {
            write_json(path, &results)?;
        }
        Ok(())
    }

    /// Build basis and grid, collocate, and optionally validate and
    /// evaluate orbitals.
    pub fn compute(&self) -> Result<GridResults> {
        collocation::initialize();

        let geometry = build_geometry(&self.config)?;
        let basis = build_basis(&self.args.config_file, &self.config, &geometry)?;
        let points = build_points(&self.config)?;

        let order = self.config.derivative(&self.args);
        let layout = self.config.layout();
        let options = self.config.collocation_options(&self.args);
        info!(
            "Derivative order {}, {} layout, block size {}, {}",
            order,
            layout.name(),
            options.block_size,
            if options.parallel { "parallel" } else { "serial" }
        );

        let kernels = selected_kernels(&basis, order, options.kernel)?;
        report_basis(&basis, &kernels);

        let arrays = run_collocation(&basis, &points, order, layout, &options)?;
        report_outputs(&arrays);

        let max_deviation = if self.args.validate {
            info!("\nValidating against the generic kernels:");
            let deviation = validate_against_generic(&basis, &points, &arrays, &options)?;
            info!("Validation passed: max relative deviation {:.3e}", deviation);
            Some(deviation)
        } else {
            None
        };

        let orbitals = match &self.config.orbitals {
            Some(rows) => {
                let values = compute_orbitals(&basis, rows, &points, &options)?;
                report_orbitals(&values);
                Some(
                    values
                        .row_iter()
                        .map(|row| row.iter().copied().collect())
                        .collect(),
                )
            }
            None => None,
        };

        Ok(GridResults {
            order,
            layout,
            n_components: arrays.n_components,
            n_points: arrays.n_points,
            labels: arrays.labels().iter().map(|s| s.to_string()).collect(),
            kernels: kernels.iter().map(|k| k.to_string()).collect(),
            arrays: arrays.arrays,
            orbitals,
            max_deviation,
        })
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let config_content = fs::read_to_string(&args.config_file)
        .wrap_err_with(|| format!("Unable to read configuration file: {}", args.config_file))?;

    let config = serde_yml::from_str::<Config>(&config_content)
        .wrap_err("Failed to parse configuration file")?
        .with_defaults();

    Ok(config)
}
