use collocation::{BasisSet, KernelId, OutputArrays};
use nalgebra::DMatrix;
use tracing::info;

const SHELL_LETTERS: [char; 10] = ['s', 'p', 'd', 'f', 'g', 'h', 'i', 'k', 'l', 'm'];

fn shell_label(l: u32) -> String {
    SHELL_LETTERS
        .get(l as usize)
        .map(|c| c.to_string())
        .unwrap_or_else(|| format!("L={l}"))
}

pub fn report_basis(basis: &BasisSet, kernels: &[KernelId]) {
    info!(
        "\nBasis: {} shells, {} functions",
        basis.len(),
        basis.n_functions()
    );
    for (idx, ((shell, offset), kernel)) in basis
        .shells()
        .iter()
        .zip(basis.offsets())
        .zip(kernels)
        .enumerate()
    {
        let c = shell.center();
        info!(
            "  Shell {:>3}: {:<4} {:<9} {:>2} prim  functions {:>4}..{:<4} at [{:+.4}, {:+.4}, {:+.4}]  {}",
            idx + 1,
            shell_label(shell.l()),
            format!("{:?}", shell.kind()).to_lowercase(),
            shell.n_primitives(),
            offset,
            offset + shell.n_functions(),
            c.x,
            c.y,
            c.z,
            kernel
        );
    }
}

/// Frobenius norm of every output array.
pub fn output_norms(arrays: &OutputArrays) -> Vec<(&'static str, f64)> {
    arrays
        .labels()
        .iter()
        .zip(&arrays.arrays)
        .map(|(&label, values)| (label, values.iter().map(|v| v * v).sum::<f64>().sqrt()))
        .collect()
}

pub fn report_outputs(arrays: &OutputArrays) {
    info!(
        "\nCollocation: {} components x {} points, {}",
        arrays.n_components,
        arrays.n_points,
        arrays.layout.name()
    );
    for (label, norm) in output_norms(arrays) {
        info!("  {:<8} |F| = {:.10e}", label, norm);
    }
}

pub fn report_orbitals(values: &DMatrix<f64>) {
    info!("\nOrbitals on the grid:");
    for (i, row) in values.row_iter().enumerate() {
        let norm = row.norm();
        let peak = row.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        info!("  Orbital {:>3}: |F| = {:.10e}  max |value| = {:.6e}", i + 1, norm, peak);
    }
}
