extern crate nalgebra as na;

use crate::driver::{collocate, CollocationOptions};
use crate::error::{CollocationError, Result};
use crate::order::check_derivative_order;
use crate::output::{Layout, OutputBuffers};
use crate::shell::{Shell, ShellKind};
use na::{DMatrix, Vector3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Shell letters in angular-momentum order (J is skipped by convention).
const SHELL_LETTERS: &str = "SPDFGHIKLM";

/// An ordered list of shells. Functions are numbered shell by shell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasisSet {
    shells: Vec<Shell>,
}

impl BasisSet {
    pub fn new(shells: Vec<Shell>) -> Self {
        Self { shells }
    }

    pub fn shells(&self) -> &[Shell] {
        &self.shells
    }

    pub fn len(&self) -> usize {
        self.shells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shells.is_empty()
    }

    pub fn push(&mut self, shell: Shell) {
        self.shells.push(shell);
    }

    pub fn extend(&mut self, other: BasisSet) {
        self.shells.extend(other.shells);
    }

    pub fn n_functions(&self) -> usize {
        self.shells.iter().map(Shell::n_functions).sum()
    }

    /// First function index of every shell.
    pub fn offsets(&self) -> Vec<usize> {
        self.shells
            .iter()
            .scan(0, |acc, shell| {
                let start = *acc;
                *acc += shell.n_functions();
                Some(start)
            })
            .collect()
    }

    // Example of nwchem format:
    //
    // BASIS "ao basis" PRINT
    // #BASIS SET: (4s,1p) -> [2s,1p]
    // H    S
    //       1.301000E+01           1.968500E-02
    //       1.962000E+00           1.379770E-01
    //       4.446000E-01           4.781480E-01
    // H    S
    //       1.220000E-01           1.000000E+00
    // H    P
    //       7.270000E-01           1.0000000
    // END
    //
    // "SP" blocks carry one coefficient column per letter; a single letter
    // with several columns is a general contraction and yields one shell
    // per column.

    /// Parse the shells of `element` from NWChem basis text, all placed at
    /// `center`.
    pub fn from_nwchem(text: &str, element: &str, center: Vector3<f64>, kind: ShellKind) -> Result<Self> {
        let mut basis = BasisSet::default();
        let mut current: Option<PendingShell> = None;

        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let upper = line.to_ascii_uppercase();
            if upper.starts_with("BASIS") || upper == "END" {
                if let Some(pending) = current.take() {
                    pending.flush(center, kind, &mut basis)?;
                }
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens[0].chars().all(char::is_alphabetic) {
                if let Some(pending) = current.take() {
                    pending.flush(center, kind, &mut basis)?;
                }
                if tokens.len() < 2 {
                    return Err(parse_error(lineno, "shell header needs an element and a shell type"));
                }
                if tokens[0].eq_ignore_ascii_case(element) {
                    current = Some(PendingShell::new(tokens[1], lineno)?);
                }
                continue;
            }

            // rows of a shell for another element are skipped
            if let Some(pending) = current.as_mut() {
                let row = tokens
                    .iter()
                    .map(|t| parse_nwchem_float(t))
                    .collect::<Option<Vec<f64>>>()
                    .ok_or_else(|| parse_error(lineno, "expected an exponent and coefficients"))?;
                if row.len() < 2 {
                    return Err(parse_error(lineno, "expected an exponent and coefficients"));
                }
                pending.rows.push(row);
            }
        }
        if let Some(pending) = current.take() {
            pending.flush(center, kind, &mut basis)?;
        }

        if basis.is_empty() {
            return Err(CollocationError::InvalidBasis(format!(
                "no shells found for element {element}"
            )));
        }
        debug!(
            "parsed {} shells ({} functions) for {element}",
            basis.len(),
            basis.n_functions()
        );
        Ok(basis)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CollocationError::InvalidBasis(format!("cannot serialize basis: {e}")))
    }

    /// Deserialize and re-run shell validation on every shell.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BasisSet = serde_json::from_str(json)
            .map_err(|e| CollocationError::InvalidBasis(format!("cannot parse basis JSON: {e}")))?;
        raw.shells
            .into_iter()
            .map(|s| Shell::new(s.l() as i32, s.primitives().to_vec(), *s.center(), s.kind()))
            .collect::<Result<Vec<_>>>()
            .map(BasisSet::new)
    }
}

struct PendingShell {
    angular: Vec<u32>,
    rows: Vec<Vec<f64>>,
    line: usize,
}

impl PendingShell {
    fn new(label: &str, line: usize) -> Result<Self> {
        let angular = label
            .to_ascii_uppercase()
            .chars()
            .map(|c| SHELL_LETTERS.find(c).map(|l| l as u32))
            .collect::<Option<Vec<u32>>>()
            .ok_or_else(|| parse_error(line, &format!("unknown shell type {label}")))?;
        Ok(Self {
            angular,
            rows: Vec::new(),
            line,
        })
    }

    fn flush(self, center: Vector3<f64>, kind: ShellKind, basis: &mut BasisSet) -> Result<()> {
        let n_columns = match self.rows.first() {
            Some(row) => row.len() - 1,
            None => return Err(parse_error(self.line, "shell has no primitives")),
        };
        if self.rows.iter().any(|r| r.len() - 1 != n_columns) {
            return Err(parse_error(self.line, "rows have different numbers of coefficients"));
        }
        let angular = if self.angular.len() == 1 {
            vec![self.angular[0]; n_columns]
        } else if self.angular.len() == n_columns {
            self.angular
        } else {
            return Err(parse_error(
                self.line,
                &format!("{} shell letters but {n_columns} coefficient columns", self.angular.len()),
            ));
        };

        let exponents: Vec<f64> = self.rows.iter().map(|r| r[0]).collect();
        for (col, l) in angular.into_iter().enumerate() {
            let coefficients: Vec<f64> = self.rows.iter().map(|r| r[col + 1]).collect();
            basis.push(Shell::from_exponents(l as i32, &exponents, &coefficients, center, kind)?);
        }
        Ok(())
    }
}

fn parse_error(line: usize, msg: &str) -> CollocationError {
    CollocationError::InvalidBasis(format!("line {}: {msg}", line + 1))
}

/// Fortran-style exponents (`1.0D+02`) are accepted.
fn parse_nwchem_float(token: &str) -> Option<f64> {
    token.replace(['D', 'd'], "E").parse().ok()
}

/// Collocate every shell of `basis` into one buffer set of
/// `basis.n_functions()` components, shells stacked in basis order.
///
/// Component-major buffers are cut into disjoint row ranges, one per shell,
/// and the shells run in parallel. Point-major buffers are cut into chunks
/// of whole point rows instead; each chunk runs every shell on its points,
/// each shell writing its column range with the full row stride, and the
/// chunks run in parallel.
pub fn collocate_basis(
    basis: &BasisSet,
    points: &[Vector3<f64>],
    order: usize,
    buffers: &mut OutputBuffers<'_>,
    options: &CollocationOptions,
) -> Result<()> {
    check_derivative_order(order)?;
    if points.is_empty() || basis.is_empty() {
        return Ok(());
    }
    let n_total = basis.n_functions();
    let stride = buffers.validate(order, n_total, points.len())?;
    let layout = buffers.layout();
    debug!(
        "collocate basis: {} shells, {n_total} functions, {} points, {}",
        basis.len(),
        points.len(),
        layout.name()
    );

    match layout {
        Layout::ComponentMajor => {
            let mut per_shell: Vec<Vec<&mut [f64]>> = (0..basis.len())
                .map(|_| Vec::with_capacity(buffers.len()))
                .collect();
            for buf in buffers.buffers_mut().iter_mut() {
                let mut rest: &mut [f64] = &mut buf[..];
                for (s, shell) in basis.shells().iter().enumerate() {
                    let take = if s + 1 == basis.len() {
                        rest.len()
                    } else {
                        shell.n_functions() * stride
                    };
                    let (rows, tail) = std::mem::take(&mut rest).split_at_mut(take);
                    rest = tail;
                    per_shell[s].push(rows);
                }
            }

            let run = |(bufs, shell): (Vec<&mut [f64]>, &Shell)| {
                let mut sub = OutputBuffers::new(Layout::ComponentMajor, bufs).with_stride(stride);
                collocate(shell, points, order, &mut sub, options)
            };
            if options.parallel {
                per_shell
                    .into_par_iter()
                    .zip(basis.shells().par_iter())
                    .try_for_each(run)
            } else {
                per_shell
                    .into_iter()
                    .zip(basis.shells().iter())
                    .try_for_each(run)
            }
        }
        Layout::PointMajor => {
            let block = options.effective_block_size().min(points.len());
            let n_chunks = points.len().div_ceil(block);
            let mut per_chunk: Vec<Vec<&mut [f64]>> = (0..n_chunks)
                .map(|_| Vec::with_capacity(buffers.len()))
                .collect();
            for buf in buffers.buffers_mut().iter_mut() {
                let mut rest: &mut [f64] = &mut buf[..];
                for (b, chunk) in per_chunk.iter_mut().enumerate() {
                    let take = if b + 1 == n_chunks {
                        rest.len()
                    } else {
                        block * stride
                    };
                    let (rows, tail) = std::mem::take(&mut rest).split_at_mut(take);
                    rest = tail;
                    chunk.push(rows);
                }
            }

            let offsets = basis.offsets();
            // a chunk is a single block, so each shell runs inline
            let shell_options = options.serial();
            let run = |(mut bufs, pts): (Vec<&mut [f64]>, &[Vector3<f64>])| -> Result<()> {
                for (shell, &offset) in basis.shells().iter().zip(&offsets) {
                    let cols = bufs.iter_mut().map(|b| &mut b[offset..]).collect();
                    let mut sub = OutputBuffers::new(Layout::PointMajor, cols).with_stride(stride);
                    collocate(shell, pts, order, &mut sub, &shell_options)?;
                }
                Ok(())
            };
            if options.parallel {
                per_chunk
                    .into_par_iter()
                    .zip(points.par_chunks(block))
                    .try_for_each(run)
            } else {
                per_chunk
                    .into_iter()
                    .zip(points.chunks(block))
                    .try_for_each(run)
            }
        }
    }
}

/// Orbital values on the grid: `coefficients` is `n_orbitals x n_functions`,
/// the result `n_orbitals x n_points`.
pub fn orbitals(
    basis: &BasisSet,
    coefficients: &DMatrix<f64>,
    points: &[Vector3<f64>],
    options: &CollocationOptions,
) -> Result<DMatrix<f64>> {
    let n_functions = basis.n_functions();
    if coefficients.ncols() != n_functions {
        return Err(CollocationError::CoefficientShape {
            expected: n_functions,
            found: coefficients.ncols(),
        });
    }

    // column-major n_functions x n_points is exactly the point-major layout
    let mut phi = DMatrix::<f64>::zeros(n_functions, points.len());
    {
        let mut buffers = OutputBuffers::new(Layout::PointMajor, vec![phi.as_mut_slice()]);
        collocate_basis(basis, points, 0, &mut buffers, options)?;
    }
    Ok(coefficients * phi)
}
