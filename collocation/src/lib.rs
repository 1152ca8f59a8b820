// Gaussian basis function collocation on point grids

pub mod basis;
pub mod cartesian;
pub mod dispatch;
pub mod driver;
pub mod error;
mod helper;
pub mod kernels;
pub mod order;
pub mod output;
pub mod radial;
pub mod shell;
pub mod solid_harmonics;
mod collocation_test;

pub use basis::{collocate_basis, orbitals, BasisSet};
pub use cartesian::evaluate_cartesian;
pub use dispatch::{dispatch_table, DispatchTable, Kernel, KernelId, KernelPolicy};
pub use driver::{collocate, collocate_arrays, CollocationOptions, DEFAULT_BLOCK_SIZE};
pub use error::{CollocationError, Result};
pub use order::{CartesianOrder, SphericalOrder, MAX_DERIVATIVE, OUTPUT_LABELS};
pub use output::{Layout, OutputArrays, OutputBuffers};
pub use radial::radial_derivatives;
pub use shell::{n_cartesian, n_spherical, Primitive, Shell, ShellKind};
pub use solid_harmonics::{cartesian_to_spherical, solid_harmonic_terms, SphericalTerm};

/// Build the shared coefficient tables now instead of on first use.
pub fn initialize() {
    solid_harmonics::warm_up();
}
