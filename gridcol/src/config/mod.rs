//! Configuration management for grid collocation runs
//!
//! This module handles the YAML configuration structures, their defaults and
//! the command-line overrides.

mod args;

pub use args::Args;

use collocation::{CartesianOrder, CollocationOptions, KernelPolicy, Layout, SphericalOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Atoms that receive shells from `basis_sets`
    #[serde(default)]
    pub geometry: Vec<Atom>,
    /// Element symbol -> NWChem basis file, relative to the configuration file
    #[serde(default)]
    pub basis_sets: HashMap<String, String>,
    /// Use spherical shells for basis-set atoms
    pub spherical: Option<bool>,
    /// Explicit shells, appended after the atom shells
    #[serde(default)]
    pub shells: Vec<ShellConfig>,
    /// Explicit points
    #[serde(default)]
    pub points: Vec<[f64; 3]>,
    /// Regular grid, appended after the explicit points
    pub grid: Option<GridParams>,
    #[serde(default)]
    pub collocation: CollocationParams,
    /// Orbital coefficient rows, one entry per basis function
    pub orbitals: Option<Vec<Vec<f64>>>,
}

/// Atomic position configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct Atom {
    pub element: String,
    pub coords: [f64; 3],
}

/// One contracted shell
#[derive(Debug, Deserialize, Serialize)]
pub struct ShellConfig {
    pub am: i32,
    pub exponents: Vec<f64>,
    pub coefficients: Vec<f64>,
    pub center: [f64; 3],
    pub spherical: Option<bool>,
}

/// Regular grid `origin + (i, j, k) * spacing`
#[derive(Debug, Deserialize, Serialize)]
pub struct GridParams {
    pub origin: [f64; 3],
    pub spacing: [f64; 3],
    pub counts: [usize; 3],
}

/// Collocation parameters
#[derive(Debug, Deserialize, Serialize)]
pub struct CollocationParams {
    pub derivative: Option<usize>,
    pub layout: Option<Layout>,
    pub cartesian_order: Option<CartesianOrder>,
    pub spherical_order: Option<SphericalOrder>,
    pub block_size: Option<usize>,
    pub parallel: Option<bool>,
    pub kernel: Option<KernelPolicy>,
}

impl Default for CollocationParams {
    fn default() -> Self {
        let options = CollocationOptions::default();
        CollocationParams {
            derivative: Some(0),
            layout: Some(Layout::default()),
            cartesian_order: Some(options.cartesian_order),
            spherical_order: Some(options.spherical_order),
            block_size: Some(options.block_size),
            parallel: Some(options.parallel),
            kernel: Some(options.kernel),
        }
    }
}

impl CollocationParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.derivative.is_none() {
            self.derivative = defaults.derivative;
        }
        if self.layout.is_none() {
            self.layout = defaults.layout;
        }
        if self.cartesian_order.is_none() {
            self.cartesian_order = defaults.cartesian_order;
        }
        if self.spherical_order.is_none() {
            self.spherical_order = defaults.spherical_order;
        }
        if self.block_size.is_none() {
            self.block_size = defaults.block_size;
        }
        if self.parallel.is_none() {
            self.parallel = defaults.parallel;
        }
        if self.kernel.is_none() {
            self.kernel = defaults.kernel;
        }
        self
    }
}

impl Config {
    /// Apply defaults to all configuration sections
    pub fn with_defaults(mut self) -> Self {
        self.collocation = self.collocation.with_defaults();
        if self.spherical.is_none() {
            self.spherical = Some(false);
        }
        self
    }

    /// Derivative order, command line first
    pub fn derivative(&self, args: &Args) -> usize {
        args.derivative
            .or(self.collocation.derivative)
            .unwrap_or(0)
    }

    pub fn layout(&self) -> Layout {
        self.collocation.layout.unwrap_or_default()
    }

    /// Library options with the command-line overrides applied
    pub fn collocation_options(&self, args: &Args) -> CollocationOptions {
        let defaults = CollocationOptions::default();
        let params = &self.collocation;
        CollocationOptions {
            cartesian_order: params.cartesian_order.unwrap_or(defaults.cartesian_order),
            spherical_order: params.spherical_order.unwrap_or(defaults.spherical_order),
            kernel: if args.generic_only {
                KernelPolicy::GenericOnly
            } else {
                params.kernel.unwrap_or(defaults.kernel)
            },
            block_size: args
                .block_size
                .or(params.block_size)
                .unwrap_or(defaults.block_size),
            parallel: !args.serial && params.parallel.unwrap_or(defaults.parallel),
        }
    }

    pub fn basis_spherical(&self) -> bool {
        self.spherical.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    const MINIMAL: &str = r#"
shells:
  - am: 1
    exponents: [1.0]
    coefficients: [1.0]
    center: [0.0, 0.0, 0.0]
points:
  - [1.0, 0.0, 0.0]
collocation:
  derivative: 2
  layout: point_major
  cartesian_order: molden
"#;

    #[test]
    fn test_parse_and_defaults() {
        let config: Config = serde_yml::from_str::<Config>(MINIMAL).unwrap().with_defaults();
        assert_eq!(config.shells.len(), 1);
        assert_eq!(config.shells[0].am, 1);
        assert!(config.shells[0].spherical.is_none());
        assert_eq!(config.points, vec![[1.0, 0.0, 0.0]]);
        assert!(config.geometry.is_empty());
        assert_eq!(config.layout(), Layout::PointMajor);
        assert_eq!(config.collocation.block_size, Some(64));
        assert_eq!(config.collocation.kernel, Some(KernelPolicy::Auto));

        let args = Args::parse_from(["gridcol"]);
        assert_eq!(config.derivative(&args), 2);
        let options = config.collocation_options(&args);
        assert_eq!(options.cartesian_order, CartesianOrder::Molden);
        assert!(options.parallel);
    }

    #[test]
    fn test_command_line_overrides() {
        let config: Config = serde_yml::from_str::<Config>(MINIMAL).unwrap().with_defaults();
        let args = Args::parse_from([
            "gridcol",
            "--derivative",
            "1",
            "--block-size",
            "8",
            "--generic-only",
            "--serial",
        ]);
        assert_eq!(config.derivative(&args), 1);
        let options = config.collocation_options(&args);
        assert_eq!(options.block_size, 8);
        assert_eq!(options.kernel, KernelPolicy::GenericOnly);
        assert!(!options.parallel);
    }

    #[test]
    fn test_missing_collocation_section() {
        let config: Config = serde_yml::from_str::<Config>("points: []\n")
            .unwrap()
            .with_defaults();
        assert_eq!(config.collocation.derivative, Some(0));
        assert_eq!(config.layout(), Layout::ComponentMajor);
        assert!(!config.basis_spherical());
    }
}
