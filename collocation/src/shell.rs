extern crate nalgebra as na;

use crate::error::{CollocationError, Result};
use crate::solid_harmonics::MAX_SOLID_HARMONIC_L;
use na::Vector3;
use serde::{Deserialize, Serialize};

/// Which set of components a shell writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellKind {
    /// (L+1)(L+2)/2 Cartesian monomials x^i y^j z^k.
    Cartesian,
    /// 2L+1 real solid harmonics.
    Spherical,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub exponent: f64,
    pub coefficient: f64,
}

impl Primitive {
    pub fn new(exponent: f64, coefficient: f64) -> Self {
        Self {
            exponent,
            coefficient,
        }
    }
}

/// A contracted Gaussian shell: every component shares the centre, the
/// angular momentum and the radial sum  S(r^2) = sum_p c_p exp(-a_p r^2).
///
/// Coefficients are used as given; no normalisation is folded in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shell {
    l: u32,
    center: Vector3<f64>,
    primitives: Vec<Primitive>,
    kind: ShellKind,
}

pub fn n_cartesian(l: u32) -> usize {
    let l = l as usize;
    (l + 1) * (l + 2) / 2
}

pub fn n_spherical(l: u32) -> usize {
    2 * l as usize + 1
}

impl Shell {
    pub fn new(
        l: i32,
        primitives: Vec<Primitive>,
        center: Vector3<f64>,
        kind: ShellKind,
    ) -> Result<Self> {
        if l < 0 {
            return Err(CollocationError::InvalidBasis(format!(
                "angular momentum must be non-negative, got {l}"
            )));
        }
        if primitives.is_empty() {
            return Err(CollocationError::InvalidBasis(
                "a shell needs at least one primitive".to_string(),
            ));
        }
        for (i, prim) in primitives.iter().enumerate() {
            // NaN fails this comparison as well
            if !(prim.exponent > 0.0) {
                return Err(CollocationError::InvalidBasis(format!(
                    "primitive {i} has non-positive exponent {}",
                    prim.exponent
                )));
            }
        }
        let l = l as u32;
        if kind == ShellKind::Spherical && l > MAX_SOLID_HARMONIC_L {
            return Err(CollocationError::InvalidBasis(format!(
                "spherical shells are available up to L = {MAX_SOLID_HARMONIC_L}, got {l}"
            )));
        }

        Ok(Self {
            l,
            center,
            primitives,
            kind,
        })
    }

    /// Build a shell from parallel exponent / coefficient lists.
    pub fn from_exponents(
        l: i32,
        exponents: &[f64],
        coefficients: &[f64],
        center: Vector3<f64>,
        kind: ShellKind,
    ) -> Result<Self> {
        if exponents.len() != coefficients.len() {
            return Err(CollocationError::InvalidBasis(format!(
                "{} exponents but {} coefficients",
                exponents.len(),
                coefficients.len()
            )));
        }
        let primitives = exponents
            .iter()
            .zip(coefficients)
            .map(|(&a, &c)| Primitive::new(a, c))
            .collect();
        Self::new(l, primitives, center, kind)
    }

    pub fn l(&self) -> u32 {
        self.l
    }

    pub fn center(&self) -> &Vector3<f64> {
        &self.center
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn n_primitives(&self) -> usize {
        self.primitives.len()
    }

    pub fn kind(&self) -> ShellKind {
        self.kind
    }

    pub fn is_spherical(&self) -> bool {
        self.kind == ShellKind::Spherical
    }

    pub fn n_cartesian(&self) -> usize {
        n_cartesian(self.l)
    }

    pub fn n_spherical(&self) -> usize {
        n_spherical(self.l)
    }

    /// Number of output rows this shell produces for its kind.
    pub fn n_functions(&self) -> usize {
        match self.kind {
            ShellKind::Cartesian => self.n_cartesian(),
            ShellKind::Spherical => self.n_spherical(),
        }
    }

    /// Same primitives and centre, other output kind.
    pub fn with_kind(&self, kind: ShellKind) -> Result<Self> {
        Self::new(self.l as i32, self.primitives.clone(), self.center, kind)
    }
}
