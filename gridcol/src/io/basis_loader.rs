//! Basis set loading utilities

use collocation::{BasisSet, ShellKind};
use color_eyre::eyre::{Result, WrapErr};
use nalgebra::Vector3;
use std::fs;
use std::path::{Path, PathBuf};

/// Resolve `file` against the directory of the configuration file
pub fn resolve_relative(config_file: &str, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    Path::new(config_file)
        .parent()
        .map(|dir| dir.join(path))
        .unwrap_or_else(|| path.to_path_buf())
}

/// Read an NWChem basis file
pub fn read_basis_file(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read basis set file: {}", path.display()))
}

/// Shells of `symbol` from NWChem text, placed at `center`
pub fn parse_basis(text: &str, symbol: &str, center: Vector3<f64>, kind: ShellKind) -> Result<BasisSet> {
    BasisSet::from_nwchem(text, symbol, center, kind)
        .wrap_err_with(|| format!("Failed to parse basis set for {}", symbol))
}
