//! Block kernels.
//!
//! A kernel fills a [`CartesianBlock`] with the row-order Cartesian values
//! (and derivatives) of one shell on a block of points. The generic kernel
//! lives in [`crate::cartesian`]; the const-generic fast kernels live in
//! [`specialized`].

extern crate nalgebra as na;

pub(crate) mod specialized;

use crate::order::MAX_DERIVATIVE;
use crate::shell::{n_cartesian, Shell};
use na::Vector3;

/// Signature shared by every kernel in the dispatch table.
pub type KernelFn = fn(&Shell, &[Vector3<f64>], &mut CartesianBlock);

const OUTPUTS_PER_ORDER: [usize; MAX_DERIVATIVE + 1] = [1, 4, 10, 20];

/// Scratch for one point block, laid out `[output][cartesian][point]` with a
/// fixed row capacity so rows never move between blocks.
#[derive(Debug, Clone)]
pub struct CartesianBlock {
    l: u32,
    order: usize,
    n_outputs: usize,
    n_cartesian: usize,
    capacity: usize,
    n_points: usize,
    data: Vec<f64>,
}

impl CartesianBlock {
    /// `order` must already be validated (0..=3).
    pub fn new(l: u32, order: usize, capacity: usize) -> Self {
        let order = order.min(MAX_DERIVATIVE);
        let n_outputs = OUTPUTS_PER_ORDER[order];
        let n_cartesian = n_cartesian(l);
        let capacity = capacity.max(1);
        Self {
            l,
            order,
            n_outputs,
            n_cartesian,
            capacity,
            n_points: 0,
            data: vec![0.0; n_outputs * n_cartesian * capacity],
        }
    }

    pub fn l(&self) -> u32 {
        self.l
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn n_outputs(&self) -> usize {
        self.n_outputs
    }

    pub fn n_cartesian(&self) -> usize {
        self.n_cartesian
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// Prepare for a block of `n_points` points; panics past capacity.
    pub fn reset(&mut self, n_points: usize) {
        assert!(
            n_points <= self.capacity,
            "block of {n_points} points exceeds scratch capacity {}",
            self.capacity
        );
        self.n_points = n_points;
    }

    #[inline]
    fn offset(&self, output: usize, cart: usize) -> usize {
        (output * self.n_cartesian + cart) * self.capacity
    }

    #[inline]
    pub fn row(&self, output: usize, cart: usize) -> &[f64] {
        let start = self.offset(output, cart);
        &self.data[start..start + self.n_points]
    }

    #[inline]
    pub fn row_mut(&mut self, output: usize, cart: usize) -> &mut [f64] {
        let start = self.offset(output, cart);
        let n = self.n_points;
        &mut self.data[start..start + n]
    }

    #[inline]
    pub fn set(&mut self, output: usize, cart: usize, point: usize, value: f64) {
        let idx = self.offset(output, cart) + point;
        self.data[idx] = value;
    }

    #[inline]
    pub fn get(&self, output: usize, cart: usize, point: usize) -> f64 {
        self.data[self.offset(output, cart) + point]
    }
}
