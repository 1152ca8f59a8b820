use thiserror::Error;

/// Errors raised by shell construction and collocation calls.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollocationError {
    #[error("Invalid basis shell: {0}")]
    InvalidBasis(String),

    #[error("Derivative order {0} is not supported; expected 0, 1, 2 or 3.")]
    UnsupportedDerivativeOrder(usize),

    #[error("Output buffer `{output}` holds {found} values but at least {expected} are required.")]
    BufferSize {
        output: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Derivative order {order} needs {expected} output buffers, but {found} were provided.")]
    BufferCount {
        order: usize,
        expected: usize,
        found: usize,
    },

    #[error("Stride {stride} is smaller than the {row_width} values written per row.")]
    InvalidStride { stride: usize, row_width: usize },

    #[error("{ordering} ordering is not defined for angular momentum {l}.")]
    UnsupportedOrdering { ordering: &'static str, l: u32 },

    #[error("Orbital coefficient matrix has {found} columns but the basis has {expected} functions.")]
    CoefficientShape { expected: usize, found: usize },
}

pub type Result<T> = std::result::Result<T, CollocationError>;
