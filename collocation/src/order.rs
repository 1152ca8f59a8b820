//! Component and derivative orderings.
//!
//! The canonical ("row") Cartesian order enumerates `(lx, ly, lz)` with
//! `lx` descending and, within equal `lx`, `lz` ascending:
//! `xx, xy, xz, yy, yz, zz` for a d shell. Every kernel works in this order;
//! other orderings are applied as a permutation when the driver writes.
//!
//! Derivative outputs use the same rule on the derivative multi-index, so the
//! second derivatives come out as `xx, xy, xz, yy, yz, zz`.

use crate::error::{CollocationError, Result};
use serde::{Deserialize, Serialize};

/// Highest derivative order any kernel produces.
pub const MAX_DERIVATIVE: usize = 3;

/// Output labels, in buffer order, for derivative orders 0 to 3.
pub const OUTPUT_LABELS: [&str; 20] = [
    "PHI", //
    "PHI_X", "PHI_Y", "PHI_Z", //
    "PHI_XX", "PHI_XY", "PHI_XZ", "PHI_YY", "PHI_YZ", "PHI_ZZ", //
    "PHI_XXX", "PHI_XXY", "PHI_XXZ", "PHI_XYY", "PHI_XYZ", "PHI_XZZ", "PHI_YYY", "PHI_YYZ",
    "PHI_YZZ", "PHI_ZZZ",
];

/// Derivative multi-index `(a, b, c)` of each output buffer.
pub const DERIVATIVE_INDICES: [(u32, u32, u32); 20] = [
    (0, 0, 0),
    (1, 0, 0),
    (0, 1, 0),
    (0, 0, 1),
    (2, 0, 0),
    (1, 1, 0),
    (1, 0, 1),
    (0, 2, 0),
    (0, 1, 1),
    (0, 0, 2),
    (3, 0, 0),
    (2, 1, 0),
    (2, 0, 1),
    (1, 2, 0),
    (1, 1, 1),
    (1, 0, 2),
    (0, 3, 0),
    (0, 2, 1),
    (0, 1, 2),
    (0, 0, 3),
];

/// Number of output buffers needed for a derivative order (1, 4, 10, 20).
pub fn n_outputs(order: usize) -> Result<usize> {
    match order {
        0 => Ok(1),
        1 => Ok(4),
        2 => Ok(10),
        3 => Ok(20),
        _ => Err(CollocationError::UnsupportedDerivativeOrder(order)),
    }
}

pub fn check_derivative_order(order: usize) -> Result<()> {
    n_outputs(order).map(|_| ())
}

/// Position of `(lx, ly, lz)` in row order for `L = lx + ly + lz`.
#[inline]
pub fn row_index(_lx: u32, ly: u32, lz: u32) -> usize {
    let i = (ly + lz) as usize;
    i * (i + 1) / 2 + lz as usize
}

/// Index into the 20 derivative outputs of the multi-index `(a, b, c)`.
#[inline]
pub fn derivative_index(a: u32, b: u32, c: u32) -> usize {
    const OFFSETS: [usize; 4] = [0, 1, 4, 10];
    OFFSETS[(a + b + c) as usize] + row_index(a, b, c)
}

/// Canonical row-order exponents for angular momentum `l`.
pub fn row_exponents(l: u32) -> Vec<(u32, u32, u32)> {
    let mut out = Vec::with_capacity(crate::shell::n_cartesian(l));
    for i in 0..=l {
        let lx = l - i;
        for j in 0..=i {
            out.push((lx, i - j, j));
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartesianOrder {
    #[default]
    Row,
    Molden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SphericalOrder {
    /// m = 0, +1, -1, +2, -2, ...
    #[default]
    Gaussian,
    /// m = -L, ..., 0, ..., +L
    Cca,
}

const MOLDEN_P: [&str; 3] = ["x", "y", "z"];
const MOLDEN_D: [&str; 6] = ["xx", "yy", "zz", "xy", "xz", "yz"];
const MOLDEN_F: [&str; 10] = [
    "xxx", "yyy", "zzz", "xyy", "xxy", "xxz", "xzz", "yzz", "yyz", "xyz",
];
const MOLDEN_G: [&str; 15] = [
    "xxxx", "yyyy", "zzzz", "xxxy", "xxxz", "xyyy", "yyyz", "xzzz", "yzzz", "xxyy", "xxzz", "yyzz",
    "xxyz", "xyyz", "xyzz",
];

fn exponents_from_label(label: &str) -> (u32, u32, u32) {
    label.chars().fold((0, 0, 0), |(x, y, z), ch| match ch {
        'x' => (x + 1, y, z),
        'y' => (x, y + 1, z),
        _ => (x, y, z + 1),
    })
}

impl CartesianOrder {
    pub fn name(&self) -> &'static str {
        match self {
            CartesianOrder::Row => "row",
            CartesianOrder::Molden => "molden",
        }
    }

    /// Exponents of each output component in this order.
    pub fn exponents(&self, l: u32) -> Result<Vec<(u32, u32, u32)>> {
        match self {
            CartesianOrder::Row => Ok(row_exponents(l)),
            CartesianOrder::Molden => {
                let labels: &[&str] = match l {
                    0 => &[""],
                    1 => &MOLDEN_P,
                    2 => &MOLDEN_D,
                    3 => &MOLDEN_F,
                    4 => &MOLDEN_G,
                    _ => {
                        return Err(CollocationError::UnsupportedOrdering {
                            ordering: self.name(),
                            l,
                        })
                    }
                };
                Ok(labels.iter().map(|s| exponents_from_label(s)).collect())
            }
        }
    }

    /// For each output position, the row-order index it reads from.
    pub fn permutation(&self, l: u32) -> Result<Vec<usize>> {
        Ok(self
            .exponents(l)?
            .into_iter()
            .map(|(x, y, z)| row_index(x, y, z))
            .collect())
    }
}

impl SphericalOrder {
    pub fn name(&self) -> &'static str {
        match self {
            SphericalOrder::Gaussian => "gaussian",
            SphericalOrder::Cca => "cca",
        }
    }

    /// Magnetic quantum number of each output position.
    pub fn m_values(&self, l: u32) -> Vec<i32> {
        let l = l as i32;
        match self {
            SphericalOrder::Gaussian => {
                let mut out = vec![0];
                for m in 1..=l {
                    out.push(m);
                    out.push(-m);
                }
                out
            }
            SphericalOrder::Cca => (-l..=l).collect(),
        }
    }

    /// For each output position, the Gaussian-order index it reads from.
    pub fn permutation(&self, l: u32) -> Vec<usize> {
        self.m_values(l)
            .into_iter()
            .map(|m| match m {
                0 => 0,
                m if m > 0 => (2 * m - 1) as usize,
                m => (-2 * m) as usize,
            })
            .collect()
    }
}
