//! Input/Output operations for grid collocation
//!
//! This module handles file I/O, logging setup, and basis set loading.

mod basis_loader;
mod output;

pub use basis_loader::{parse_basis, read_basis_file, resolve_relative};
pub use output::{setup_output, write_json};
