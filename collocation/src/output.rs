//! Caller-owned output buffers and their memory layouts.
//!
//! A buffer set holds one `&mut [f64]` per output (`PHI`, `PHI_X`, ...,
//! see [`OUTPUT_LABELS`]) for the requested derivative order. Every buffer
//! shares one layout and one stride:
//!
//! * [`Layout::ComponentMajor`] – `[component][point]`; component rows start
//!   `stride` values apart (`stride >= n_points`).
//! * [`Layout::PointMajor`] – `[point][component]`; point rows start
//!   `stride` values apart (`stride >= n_components`).
//!
//! Values between the end of a row and the start of the next are never
//! touched.

use crate::error::{CollocationError, Result};
use crate::order::{n_outputs, OUTPUT_LABELS};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// `[component][point]`
    #[default]
    ComponentMajor,
    /// `[point][component]`
    PointMajor,
}

impl Layout {
    pub fn name(&self) -> &'static str {
        match self {
            Layout::ComponentMajor => "component_major",
            Layout::PointMajor => "point_major",
        }
    }

    /// (number of rows, values written per row)
    fn rows(&self, n_components: usize, n_points: usize) -> (usize, usize) {
        match self {
            Layout::ComponentMajor => (n_components, n_points),
            Layout::PointMajor => (n_points, n_components),
        }
    }

    /// Minimum buffer length for the given shape and stride.
    pub fn required_len(&self, n_components: usize, n_points: usize, stride: usize) -> usize {
        let (rows, width) = self.rows(n_components, n_points);
        if rows == 0 || width == 0 {
            0
        } else {
            (rows - 1) * stride + width
        }
    }

    /// Tight stride for the given shape.
    pub fn tight_stride(&self, n_components: usize, n_points: usize) -> usize {
        self.rows(n_components, n_points).1
    }
}

/// Borrowed output buffers for one collocation call.
#[derive(Debug)]
pub struct OutputBuffers<'a> {
    layout: Layout,
    stride: Option<usize>,
    buffers: Vec<&'a mut [f64]>,
}

impl<'a> OutputBuffers<'a> {
    /// Buffers in [`OUTPUT_LABELS`] order; stride defaults to tight.
    pub fn new(layout: Layout, buffers: Vec<&'a mut [f64]>) -> Self {
        Self {
            layout,
            stride: None,
            buffers,
        }
    }

    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = Some(stride);
        self
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Stride actually used for a shape: the explicit one or the tight one.
    pub fn stride_for(&self, n_components: usize, n_points: usize) -> usize {
        self.stride
            .unwrap_or_else(|| self.layout.tight_stride(n_components, n_points))
    }

    /// Check count, stride and length of every buffer for a shape.
    pub fn validate(&self, order: usize, n_components: usize, n_points: usize) -> Result<usize> {
        let expected = n_outputs(order)?;
        if self.buffers.len() != expected {
            return Err(CollocationError::BufferCount {
                order,
                expected,
                found: self.buffers.len(),
            });
        }

        let stride = self.stride_for(n_components, n_points);
        let row_width = self.layout.tight_stride(n_components, n_points);
        if stride < row_width {
            return Err(CollocationError::InvalidStride { stride, row_width });
        }

        let required = self.layout.required_len(n_components, n_points, stride);
        for (&label, buf) in OUTPUT_LABELS.iter().zip(&self.buffers) {
            if buf.len() < required {
                return Err(CollocationError::BufferSize {
                    output: label,
                    expected: required,
                    found: buf.len(),
                });
            }
        }
        Ok(stride)
    }

    pub(crate) fn buffers_mut(&mut self) -> &mut [&'a mut [f64]] {
        &mut self.buffers
    }
}

/// Owned, tightly packed arrays for callers that do not manage their own
/// memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputArrays {
    pub order: usize,
    pub n_components: usize,
    pub n_points: usize,
    pub layout: Layout,
    pub arrays: Vec<Vec<f64>>,
}

impl OutputArrays {
    pub fn zeros(order: usize, n_components: usize, n_points: usize, layout: Layout) -> Result<Self> {
        let count = n_outputs(order)?;
        Ok(Self {
            order,
            n_components,
            n_points,
            layout,
            arrays: vec![vec![0.0; n_components * n_points]; count],
        })
    }

    pub fn labels(&self) -> &'static [&'static str] {
        &OUTPUT_LABELS[..self.arrays.len()]
    }

    pub fn buffers(&mut self) -> OutputBuffers<'_> {
        OutputBuffers::new(
            self.layout,
            self.arrays.iter_mut().map(|a| a.as_mut_slice()).collect(),
        )
    }

    /// Array for output `label` (e.g. `"PHI_X"`).
    pub fn get(&self, label: &str) -> Option<&[f64]> {
        OUTPUT_LABELS
            .iter()
            .position(|l| *l == label)
            .and_then(|idx| self.arrays.get(idx))
            .map(|a| a.as_slice())
    }

    /// Value of `component` at `point` in output `output`.
    pub fn value(&self, output: usize, component: usize, point: usize) -> f64 {
        match self.layout {
            Layout::ComponentMajor => self.arrays[output][component * self.n_points + point],
            Layout::PointMajor => self.arrays[output][point * self.n_components + component],
        }
    }
}

/// The part of one output buffer that a single point block writes.
#[derive(Debug)]
pub(crate) enum BlockView<'a> {
    /// One row fragment per component.
    Rows(Vec<&'a mut [f64]>),
    /// Point rows `stride` apart, components contiguous within a row.
    Strided { data: &'a mut [f64], stride: usize },
}

impl BlockView<'_> {
    /// Write `values[p]` as component `component` of the block's point `p`.
    #[inline]
    pub(crate) fn write(&mut self, component: usize, values: &[f64]) {
        match self {
            BlockView::Rows(rows) => rows[component][..values.len()].copy_from_slice(values),
            BlockView::Strided { data, stride } => {
                for (p, &v) in values.iter().enumerate() {
                    data[p * *stride + component] = v;
                }
            }
        }
    }
}

/// Cut one validated buffer into per-block views of `block` points.
pub(crate) fn split_blocks<'a>(
    buf: &'a mut [f64],
    layout: Layout,
    stride: usize,
    n_components: usize,
    n_points: usize,
    block: usize,
) -> Vec<BlockView<'a>> {
    let n_blocks = n_points.div_ceil(block);
    match layout {
        Layout::ComponentMajor => {
            let mut rows: Vec<Vec<&'a mut [f64]>> = (0..n_blocks)
                .map(|_| Vec::with_capacity(n_components))
                .collect();
            let mut rest: &'a mut [f64] = buf;
            for c in 0..n_components {
                let take = if c + 1 == n_components { n_points } else { stride };
                let (row, tail) = std::mem::take(&mut rest).split_at_mut(take);
                rest = tail;
                for (b, chunk) in row[..n_points].chunks_mut(block).enumerate() {
                    rows[b].push(chunk);
                }
            }
            rows.into_iter().map(BlockView::Rows).collect()
        }
        Layout::PointMajor => {
            let mut views = Vec::with_capacity(n_blocks);
            let mut rest: &'a mut [f64] = buf;
            for b in 0..n_blocks {
                let n = block.min(n_points - b * block);
                let take = if b + 1 == n_blocks {
                    (n - 1) * stride + n_components
                } else {
                    block * stride
                };
                let (data, tail) = std::mem::take(&mut rest).split_at_mut(take);
                rest = tail;
                views.push(BlockView::Strided { data, stride });
            }
            views
        }
    }
}
