use collocation::{
    collocate_basis, dispatch_table, orbitals, BasisSet, CollocationOptions, KernelId, KernelPolicy,
    Layout, OutputArrays,
};
use color_eyre::eyre::{eyre, Result, WrapErr};
use nalgebra::{DMatrix, Vector3};
use tracing::info;

/// Deviations above this fail `--validate`.
pub const VALIDATION_THRESHOLD: f64 = 1e-10;

/// Collocate the whole basis into freshly allocated arrays.
pub fn run_collocation(
    basis: &BasisSet,
    points: &[Vector3<f64>],
    order: usize,
    layout: Layout,
    options: &CollocationOptions,
) -> Result<OutputArrays> {
    let mut arrays = OutputArrays::zeros(order, basis.n_functions(), points.len(), layout)?;
    collocate_basis(basis, points, order, &mut arrays.buffers(), options)
        .wrap_err("Collocation failed")?;
    Ok(arrays)
}

/// Kernel the dispatcher picks for every shell.
pub fn selected_kernels(basis: &BasisSet, order: usize, policy: KernelPolicy) -> Result<Vec<KernelId>> {
    basis
        .shells()
        .iter()
        .map(|shell| {
            dispatch_table()
                .select_for(shell, order, policy)
                .map(|kernel| kernel.id())
                .wrap_err("Kernel selection failed")
        })
        .collect()
}

/// Largest deviation between `arrays` and a generic-only evaluation,
/// relative to the largest magnitude of each output.
pub fn validate_against_generic(
    basis: &BasisSet,
    points: &[Vector3<f64>],
    arrays: &OutputArrays,
    options: &CollocationOptions,
) -> Result<f64> {
    let reference_options = CollocationOptions {
        kernel: KernelPolicy::GenericOnly,
        ..*options
    };
    let reference = run_collocation(basis, points, arrays.order, arrays.layout, &reference_options)?;

    let mut worst = 0.0f64;
    for (label, (got, expected)) in arrays
        .labels()
        .iter()
        .zip(arrays.arrays.iter().zip(&reference.arrays))
    {
        let scale = 1.0 + expected.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        let deviation = got
            .iter()
            .zip(expected)
            .fold(0.0f64, |acc, (a, b)| acc.max((a - b).abs()))
            / scale;
        info!("  {:<8} max relative deviation {:.3e}", label, deviation);
        worst = worst.max(deviation);
    }

    if worst > VALIDATION_THRESHOLD {
        return Err(eyre!(
            "Kernel validation failed: deviation {:.3e} exceeds {:.1e}",
            worst,
            VALIDATION_THRESHOLD
        ));
    }
    Ok(worst)
}

/// Orbital values from coefficient rows (`n_orbitals` rows of
/// `n_functions` values); the result is `n_orbitals x n_points`.
pub fn compute_orbitals(
    basis: &BasisSet,
    rows: &[Vec<f64>],
    points: &[Vector3<f64>],
    options: &CollocationOptions,
) -> Result<DMatrix<f64>> {
    let ncols = rows.first().map_or(0, Vec::len);
    if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != ncols) {
        return Err(eyre!(
            "Orbital {} has {} coefficients, expected {}",
            idx + 1,
            row.len(),
            ncols
        ));
    }
    let coefficients = DMatrix::from_fn(rows.len(), ncols, |i, j| rows[i][j]);
    orbitals(basis, &coefficients, points, options).wrap_err("Orbital evaluation failed")
}
