//! Generic Cartesian angular expansion.
//!
//! Reference path for every (L, derivative order). Each Cartesian component
//! is `x^i y^j z^k S(r^2)` with coordinates relative to the shell centre.
//! Spatial derivatives combine, through the Leibniz rule, the partials of
//! the monomial with the chain-ruled partials of `S`:
//!
//! ```text
//! d^(a,b,c) S = sum_{kx,ky,kz} H(a,kx) H(b,ky) H(c,kz)
//!               (2x)^(a-2kx) (2y)^(b-2ky) (2z)^(c-2kz) S^(a+b+c-kx-ky-kz)
//! H(a,k) = a! / ((a-2k)! k!)
//! ```
//!
//! where `S^(n)` is the n-th derivative with respect to r^2.

extern crate nalgebra as na;

use crate::error::Result;
use crate::helper::{binomial, falling_factorial, hermite_weight, ipow};
use crate::kernels::CartesianBlock;
use crate::order::{check_derivative_order, derivative_index, row_exponents, DERIVATIVE_INDICES};
use crate::radial::radial_derivatives;
use crate::shell::Shell;
use itertools::iproduct;
use na::Vector3;

/// Number of derivative multi-indices with total order <= `order`.
fn n_partials(order: usize) -> usize {
    [1, 4, 10, 20][order]
}

/// Spatial partials of S(r^2) for every multi-index up to `order`, indexed
/// like the output buffers.
pub fn gaussian_partials(x: f64, y: f64, z: f64, radial: &[f64; 4], order: usize) -> [f64; 20] {
    let mut out = [0.0; 20];
    let (tx, ty, tz) = (2.0 * x, 2.0 * y, 2.0 * z);
    for (idx, &(a, b, c)) in DERIVATIVE_INDICES.iter().enumerate().take(n_partials(order)) {
        let mut acc = 0.0;
        for (kx, ky, kz) in iproduct!(0..=a / 2, 0..=b / 2, 0..=c / 2) {
            let weight = hermite_weight(a, kx) * hermite_weight(b, ky) * hermite_weight(c, kz);
            let poly = ipow(tx, a - 2 * kx) * ipow(ty, b - 2 * ky) * ipow(tz, c - 2 * kz);
            let n = (a + b + c - kx - ky - kz) as usize;
            acc += weight * poly * radial[n];
        }
        out[idx] = acc;
    }
    out
}

/// `d^a/dx^a x^i`
#[inline]
fn monomial_partial(i: u32, a: u32, x: f64) -> f64 {
    if a > i {
        0.0
    } else {
        falling_factorial(i, a) * ipow(x, i - a)
    }
}

/// Evaluate every row-order component of angular momentum `l` at one
/// relative position. `out` is `[output][cartesian]` and must hold
/// `n_outputs(order) * n_cartesian(l)` values.
pub fn expand_point(l: u32, x: f64, y: f64, z: f64, radial: &[f64; 4], order: usize, out: &mut [f64]) {
    let partials = gaussian_partials(x, y, z, radial, order);
    let exps = row_exponents(l);
    let ncart = exps.len();

    for (o, &(a, b, c)) in DERIVATIVE_INDICES.iter().enumerate().take(n_partials(order)) {
        for (comp, &(i, j, k)) in exps.iter().enumerate() {
            let mut acc = 0.0;
            for (da, db, dc) in iproduct!(0..=a, 0..=b, 0..=c) {
                let mono = monomial_partial(i, da, x)
                    * monomial_partial(j, db, y)
                    * monomial_partial(k, dc, z);
                if mono == 0.0 {
                    continue;
                }
                let weight = binomial(a, da) * binomial(b, db) * binomial(c, dc);
                acc += weight * mono * partials[derivative_index(a - da, b - db, c - dc)];
            }
            out[o * ncart + comp] = acc;
        }
    }
}

/// Generic block kernel: one point at a time, runtime loops over L.
pub(crate) fn generic_kernel(shell: &Shell, points: &[Vector3<f64>], block: &mut CartesianBlock) {
    let l = shell.l();
    let order = block.order();
    let ncart = block.n_cartesian();
    let nout = block.n_outputs();
    let mut scratch = vec![0.0; nout * ncart];

    block.reset(points.len());
    for (p, point) in points.iter().enumerate() {
        let d = point - shell.center();
        let radial = radial_derivatives(shell.primitives(), d.norm_squared(), order);
        expand_point(l, d.x, d.y, d.z, &radial, order, &mut scratch);
        for o in 0..nout {
            for c in 0..ncart {
                block.set(o, c, p, scratch[o * ncart + c]);
            }
        }
    }
}

/// Row-order Cartesian values and derivatives of `shell` at one point,
/// `[output][cartesian]`, always through the generic path.
pub fn evaluate_cartesian(shell: &Shell, point: &Vector3<f64>, order: usize) -> Result<Vec<f64>> {
    check_derivative_order(order)?;
    let ncart = shell.n_cartesian();
    let mut out = vec![0.0; n_partials(order) * ncart];
    let d = point - shell.center();
    let radial = radial_derivatives(shell.primitives(), d.norm_squared(), order);
    expand_point(shell.l(), d.x, d.y, d.z, &radial, order, &mut out);
    Ok(out)
}
