//! Cartesian to real solid harmonic transform.
//!
//! Each real solid harmonic of degree `L` is a fixed linear combination of
//! the row-order Cartesian monomials of the same degree. The coefficients
//! follow eq. 23 of Pickard, Schaefer and Brooks, J. Chem. Phys. 140, 184101
//! (2014); no extra normalisation is applied, so for example
//! `R_20 = z^2 - x^2/2 - y^2/2`.
//!
//! The table is generated once for `L = 0..=MAX_SOLID_HARMONIC_L` behind a
//! `OnceLock` and is read-only afterwards. Components are stored in
//! Gaussian order (`m = 0, +1, -1, +2, -2, ...`); other orders are
//! permutations of it.

use crate::error::{CollocationError, Result};
use crate::helper::{binomial_exact, factorial, factorial_quotient};
use crate::order::{row_index, SphericalOrder};
use crate::shell::{n_cartesian, n_spherical};
use std::sync::OnceLock;
use tracing::debug;

/// Highest angular momentum with tabulated solid-harmonic coefficients.
pub const MAX_SOLID_HARMONIC_L: u32 = 16;

/// One term of a spherical component: row-order Cartesian index and weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalTerm {
    pub cartesian: usize,
    pub coefficient: f64,
}

/// Coefficient lists for one angular momentum, Gaussian order.
#[derive(Debug, Clone)]
pub struct SolidHarmonics {
    l: u32,
    components: Vec<Vec<SphericalTerm>>,
}

impl SolidHarmonics {
    pub fn l(&self) -> u32 {
        self.l
    }

    /// Terms of Gaussian-order component `idx`.
    pub fn terms(&self, idx: usize) -> &[SphericalTerm] {
        &self.components[idx]
    }

    pub fn n_spherical(&self) -> usize {
        self.components.len()
    }

    /// Term lists rearranged into `order`.
    pub fn ordered(&self, order: SphericalOrder) -> Vec<&[SphericalTerm]> {
        order
            .permutation(self.l)
            .into_iter()
            .map(|idx| self.components[idx].as_slice())
            .collect()
    }
}

fn sign(power: i64) -> f64 {
    if power.rem_euclid(2) == 0 {
        1.0
    } else {
        -1.0
    }
}

/// Generate the coefficients for angular momentum `l`.
///
/// Both inner sums of eq. 23 alternate in sign and cancel heavily at high
/// `L`, so they are accumulated as exact integers; only the final scaling
/// is done in floating point.
fn generate(l: u32) -> SolidHarmonics {
    let li = l as i64;
    let scale = 2f64.powi(l as i32);
    let mut components = Vec::with_capacity(n_spherical(l));

    for m in 0..=li {
        // (row index, real part, imaginary part)
        let mut terms: Vec<(usize, f64, f64)> = Vec::new();

        // sqrt((l - m)! / (l + m)!)
        let rising: i128 = ((li - m + 1)..=(li + m)).map(i128::from).product();
        let mut p1 = (1.0 / rising as f64).sqrt();
        if m > 0 {
            p1 *= std::f64::consts::SQRT_2;
        }

        for lz in 0..=li {
            for ly in 0..=(li - lz) {
                let lx = li - ly - lz;
                let twice_j = lx + ly - m;
                if twice_j < 0 || twice_j % 2 == 1 {
                    continue;
                }
                let j = twice_j / 2;

                let p2: i128 = (j..=((li - m) / 2))
                    .map(|i| {
                        let t = factorial_quotient(
                            (2 * li - 2 * i) as u32,
                            [(li - i) as u32, (i - j) as u32, (li - m - 2 * i) as u32],
                        );
                        if i % 2 == 0 {
                            t
                        } else {
                            -t
                        }
                    })
                    .sum();

                // scaled by j! m!
                let p3: i128 = (0..=j)
                    .filter(|&k| lx >= 2 * k && m + 2 * k >= lx)
                    .map(|k| {
                        let t = binomial_exact(j as u32, k as u32)
                            * binomial_exact(m as u32, (lx - 2 * k) as u32);
                        if k % 2 == 0 {
                            t
                        } else {
                            -t
                        }
                    })
                    .sum();

                let p = p1 * ((p2 * p3) as f64 / (factorial(j as u32) * scale));
                let idx = row_index(lx as u32, ly as u32, lz as u32);
                // odd m - lx feeds the sine (imaginary) part
                if (m - lx).rem_euclid(2) == 1 {
                    terms.push((idx, 0.0, sign((m - lx - 1) / 2) * p));
                } else {
                    terms.push((idx, sign((m - lx) / 2) * p, 0.0));
                }
            }
        }

        components.push(collect_terms(terms.iter().map(|t| (t.0, t.1))));
        if m > 0 {
            components.push(collect_terms(terms.iter().map(|t| (t.0, t.2))));
        }
    }

    SolidHarmonics { l, components }
}

/// Keep the non-vanishing terms; cancellation is exact, so zero means zero.
fn collect_terms<I: Iterator<Item = (usize, f64)>>(terms: I) -> Vec<SphericalTerm> {
    terms
        .filter(|&(_, c)| c != 0.0)
        .map(|(cartesian, coefficient)| SphericalTerm {
            cartesian,
            coefficient,
        })
        .collect()
}

static TABLE: OnceLock<Vec<SolidHarmonics>> = OnceLock::new();

fn table() -> &'static [SolidHarmonics] {
    TABLE.get_or_init(|| {
        debug!(
            "Building solid-harmonic coefficient table up to L = {}",
            MAX_SOLID_HARMONIC_L
        );
        (0..=MAX_SOLID_HARMONIC_L).map(generate).collect()
    })
}

/// Coefficients for angular momentum `l`.
pub fn solid_harmonics(l: u32) -> Result<&'static SolidHarmonics> {
    table().get(l as usize).ok_or_else(|| {
        CollocationError::InvalidBasis(format!(
            "solid-harmonic coefficients are tabulated up to L = {MAX_SOLID_HARMONIC_L}, got {l}"
        ))
    })
}

/// Force table construction. Later lookups never write.
pub fn warm_up() {
    let _ = table();
}

/// Term lists of angular momentum `l` in Gaussian order.
pub fn solid_harmonic_terms(l: u32) -> Result<Vec<&'static [SphericalTerm]>> {
    Ok(solid_harmonics(l)?.ordered(SphericalOrder::Gaussian))
}

/// `sum_t coef_t * value(cart_t)`, accumulated in table order from zero.
/// The driver and [`cartesian_to_spherical`] share this so both give
/// identical results.
#[inline]
pub(crate) fn contract<F: Fn(usize) -> f64>(terms: &[SphericalTerm], value: F) -> f64 {
    let mut acc = 0.0;
    for term in terms {
        acc += term.coefficient * value(term.cartesian);
    }
    acc
}

/// Transform a row-order Cartesian array `[cartesian][point]` (row length
/// `n_points`) into spherical components `[spherical][point]` in `order`.
pub fn cartesian_to_spherical(
    l: u32,
    cart: &[f64],
    n_points: usize,
    out: &mut [f64],
    order: SphericalOrder,
) -> Result<()> {
    let harmonics = solid_harmonics(l)?;
    let ncart = n_cartesian(l);
    let nsph = n_spherical(l);
    if cart.len() < ncart * n_points {
        return Err(CollocationError::BufferSize {
            output: "cartesian input",
            expected: ncart * n_points,
            found: cart.len(),
        });
    }
    if out.len() < nsph * n_points {
        return Err(CollocationError::BufferSize {
            output: "spherical output",
            expected: nsph * n_points,
            found: out.len(),
        });
    }

    for (s, terms) in harmonics.ordered(order).into_iter().enumerate() {
        for p in 0..n_points {
            out[s * n_points + p] = contract(terms, |c| cart[c * n_points + p]);
        }
    }
    Ok(())
}
