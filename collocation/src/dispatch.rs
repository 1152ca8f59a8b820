//! Kernel selection.
//!
//! The specialised kernels are monomorphised for every `L <= SPECIALIZED_MAX_L`
//! and every derivative order, and stored in a static function-pointer
//! table. Anything else goes to the generic expander. Both produce row-order
//! Cartesian blocks; a spherical shell additionally carries its
//! solid-harmonic coefficients.

use crate::cartesian::generic_kernel;
use crate::error::Result;
use crate::kernels::specialized::{specialized_kernel, SPECIALIZED_MAX_L};
use crate::kernels::{CartesianBlock, KernelFn};
use crate::order::{check_derivative_order, MAX_DERIVATIVE};
use crate::shell::{Shell, ShellKind};
use crate::solid_harmonics::{solid_harmonics, SolidHarmonics};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelId {
    Generic,
    Specialized { l: u32, order: usize },
}

impl fmt::Display for KernelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelId::Generic => write!(f, "generic"),
            KernelId::Specialized { l, order } => write!(f, "specialized(L={l}, order={order})"),
        }
    }
}

/// Whether the dispatcher may use specialised kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelPolicy {
    #[default]
    Auto,
    GenericOnly,
}

/// A selected kernel, ready to evaluate blocks of one shell.
#[derive(Clone, Copy)]
pub struct Kernel {
    id: KernelId,
    order: usize,
    eval: KernelFn,
    spherical: Option<&'static SolidHarmonics>,
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("id", &self.id)
            .field("order", &self.order)
            .field("spherical", &self.spherical.is_some())
            .finish()
    }
}

impl Kernel {
    pub fn id(&self) -> KernelId {
        self.id
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn solid_harmonics(&self) -> Option<&'static SolidHarmonics> {
        self.spherical
    }

    /// Fill `block` with the row-order Cartesian results for `points`.
    #[inline]
    pub fn evaluate(&self, shell: &Shell, points: &[Vector3<f64>], block: &mut CartesianBlock) {
        (self.eval)(shell, points, block)
    }
}

macro_rules! specialized_row {
    ($l:literal) => {
        [
            specialized_kernel::<$l, 0> as KernelFn,
            specialized_kernel::<$l, 1> as KernelFn,
            specialized_kernel::<$l, 2> as KernelFn,
            specialized_kernel::<$l, 3> as KernelFn,
        ]
    };
}

static SPECIALIZED: [[KernelFn; MAX_DERIVATIVE + 1]; SPECIALIZED_MAX_L as usize + 1] = [
    specialized_row!(0),
    specialized_row!(1),
    specialized_row!(2),
    specialized_row!(3),
    specialized_row!(4),
    specialized_row!(5),
    specialized_row!(6),
    specialized_row!(7),
    specialized_row!(8),
];

/// Read-only view of the kernel table.
#[derive(Debug, Clone, Copy)]
pub struct DispatchTable {
    _private: (),
}

static TABLE: DispatchTable = DispatchTable { _private: () };

pub fn dispatch_table() -> &'static DispatchTable {
    &TABLE
}

impl DispatchTable {
    pub fn max_specialized_l(&self) -> u32 {
        SPECIALIZED_MAX_L
    }

    pub fn has_specialized(&self, l: u32, order: usize) -> bool {
        l <= SPECIALIZED_MAX_L && order <= MAX_DERIVATIVE
    }

    /// Pick the kernel for `(l, order, kind)` under `policy`.
    pub fn select(
        &self,
        l: u32,
        order: usize,
        kind: ShellKind,
        policy: KernelPolicy,
    ) -> Result<Kernel> {
        check_derivative_order(order)?;

        let spherical = match kind {
            ShellKind::Spherical => Some(solid_harmonics(l)?),
            ShellKind::Cartesian => None,
        };

        let (id, eval) = match policy {
            KernelPolicy::Auto if self.has_specialized(l, order) => (
                KernelId::Specialized { l, order },
                SPECIALIZED[l as usize][order],
            ),
            _ => (KernelId::Generic, generic_kernel as KernelFn),
        };
        trace!("L = {l}, order = {order}, {kind:?}: {id}");

        Ok(Kernel {
            id,
            order,
            eval,
            spherical,
        })
    }

    /// Kernel for a shell's own angular momentum and kind.
    pub fn select_for(&self, shell: &Shell, order: usize, policy: KernelPolicy) -> Result<Kernel> {
        self.select(shell.l(), order, shell.kind(), policy)
    }
}
