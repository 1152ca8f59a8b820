//! Shell collocation driver.
//!
//! `collocate` validates the request, selects a kernel and walks the points
//! in blocks. Every output buffer is cut into per-block views up front, so a
//! block owns exactly the part of each buffer it writes and blocks can run on
//! the rayon pool without sharing anything mutable.

extern crate nalgebra as na;

use crate::dispatch::{dispatch_table, Kernel, KernelPolicy};
use crate::error::Result;
use crate::kernels::CartesianBlock;
use crate::order::{check_derivative_order, CartesianOrder, SphericalOrder};
use crate::output::{split_blocks, BlockView, Layout, OutputArrays, OutputBuffers};
use crate::shell::Shell;
use crate::solid_harmonics::{contract, SphericalTerm};
use na::Vector3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

pub const DEFAULT_BLOCK_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollocationOptions {
    pub cartesian_order: CartesianOrder,
    pub spherical_order: SphericalOrder,
    pub kernel: KernelPolicy,
    pub block_size: usize,
    pub parallel: bool,
}

impl Default for CollocationOptions {
    fn default() -> Self {
        Self {
            cartesian_order: CartesianOrder::default(),
            spherical_order: SphericalOrder::default(),
            kernel: KernelPolicy::default(),
            block_size: DEFAULT_BLOCK_SIZE,
            parallel: true,
        }
    }
}

impl CollocationOptions {
    pub fn serial(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn generic_only(mut self) -> Self {
        self.kernel = KernelPolicy::GenericOnly;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub(crate) fn effective_block_size(&self) -> usize {
        self.block_size.max(1)
    }
}

/// How the row-order Cartesian block becomes output components.
enum Projection {
    /// Output component `i` is Cartesian row `perm[i]`.
    Cartesian(Vec<usize>),
    /// Output component `i` is the contraction of `terms[i]`.
    Spherical(Vec<&'static [SphericalTerm]>),
}

impl Projection {
    fn new(shell: &Shell, kernel: &Kernel, options: &CollocationOptions) -> Result<Self> {
        match kernel.solid_harmonics() {
            Some(harmonics) => Ok(Projection::Spherical(
                harmonics.ordered(options.spherical_order),
            )),
            None => Ok(Projection::Cartesian(
                options.cartesian_order.permutation(shell.l())?,
            )),
        }
    }
}

/// Evaluate one block of points and write it through `views` (one per
/// output).
fn evaluate_block(
    shell: &Shell,
    kernel: &Kernel,
    projection: &Projection,
    points: &[Vector3<f64>],
    scratch: &mut CartesianBlock,
    row: &mut [f64],
    views: &mut [BlockView<'_>],
) {
    kernel.evaluate(shell, points, scratch);
    let n = points.len();

    for (o, view) in views.iter_mut().enumerate() {
        match projection {
            Projection::Cartesian(perm) => {
                for (comp, &src) in perm.iter().enumerate() {
                    view.write(comp, scratch.row(o, src));
                }
            }
            Projection::Spherical(terms) => {
                for (comp, terms) in terms.iter().enumerate() {
                    for (p, value) in row[..n].iter_mut().enumerate() {
                        *value = contract(terms, |c| scratch.get(o, c, p));
                    }
                    view.write(comp, &row[..n]);
                }
            }
        }
    }
}

/// Collocate `shell` on `points` into `buffers`.
///
/// `buffers` must hold one buffer per output of `order` (see
/// [`crate::order::OUTPUT_LABELS`]), each long enough for the shell's
/// component count, the point count and the buffer stride. Nothing is
/// written, and no error raised, for an empty point set.
pub fn collocate(
    shell: &Shell,
    points: &[Vector3<f64>],
    order: usize,
    buffers: &mut OutputBuffers<'_>,
    options: &CollocationOptions,
) -> Result<()> {
    check_derivative_order(order)?;
    if points.is_empty() {
        return Ok(());
    }

    let n_components = shell.n_functions();
    let n_points = points.len();
    let stride = buffers.validate(order, n_components, n_points)?;

    let kernel = dispatch_table().select_for(shell, order, options.kernel)?;
    let projection = Projection::new(shell, &kernel, options)?;

    // scratch is sized by the block, never larger than the batch
    let block = options.effective_block_size().min(n_points);
    let n_blocks = n_points.div_ceil(block);
    let layout = buffers.layout();
    debug!(
        "collocate L = {} ({:?}), order = {order}, {n_points} points in {n_blocks} blocks, kernel {}",
        shell.l(),
        shell.kind(),
        kernel.id()
    );

    // [block][output]
    let mut per_block: Vec<Vec<BlockView<'_>>> = (0..n_blocks)
        .map(|_| Vec::with_capacity(buffers.len()))
        .collect();
    for buf in buffers.buffers_mut().iter_mut() {
        let views = split_blocks(&mut buf[..], layout, stride, n_components, n_points, block);
        for (b, view) in views.into_iter().enumerate() {
            per_block[b].push(view);
        }
    }

    let l = shell.l();
    if options.parallel && n_blocks > 1 {
        trace!("dispatching {n_blocks} blocks to the rayon pool");
        per_block
            .into_par_iter()
            .zip(points.par_chunks(block))
            .for_each_init(
                || (CartesianBlock::new(l, order, block), vec![0.0; block]),
                |(scratch, row), (mut views, pts)| {
                    evaluate_block(shell, &kernel, &projection, pts, scratch, row, &mut views)
                },
            );
    } else {
        let mut scratch = CartesianBlock::new(l, order, block);
        let mut row = vec![0.0; block];
        for (mut views, pts) in per_block.into_iter().zip(points.chunks(block)) {
            evaluate_block(
                shell,
                &kernel,
                &projection,
                pts,
                &mut scratch,
                &mut row,
                &mut views,
            );
        }
    }
    Ok(())
}

/// Collocate into freshly allocated, tightly packed arrays.
pub fn collocate_arrays(
    shell: &Shell,
    points: &[Vector3<f64>],
    order: usize,
    layout: Layout,
    options: &CollocationOptions,
) -> Result<OutputArrays> {
    let mut arrays = OutputArrays::zeros(order, shell.n_functions(), points.len(), layout)?;
    collocate(shell, points, order, &mut arrays.buffers(), options)?;
    Ok(arrays)
}
