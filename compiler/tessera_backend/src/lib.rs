//! Backend interface for nest lowering.
//!
//! Nest lowering only needs a narrow slice of a native code generator:
//!
//! - create an iteration space from concrete extents ([`Backend::create_space`])
//! - allocate temporaries ([`Backend::allocate`])
//! - resolve constant data ([`Backend::resolve_constant`])
//! - bind array arguments ([`Backend::wrap_argument`])
//! - register kernels for emission ([`Backend::add_kernel`])
//!
//! [`RecordingBackend`] implements the trait in memory and records every
//! call. It is the backend used by the test suites and by callers that only
//! want to inspect what a lowering pass would emit.

mod kernel;
mod native;
mod recording;

use tessera_ir::{ConstantData, ElementType, Layout, Placement, Predicate};

pub use kernel::Kernel;
pub use native::{
    ArrayOrigin, NativeArray, NativeIndex, NativeSpace, NativeValue, RuntimeArg, SpaceId,
};
pub use recording::{BackendOp, RecordedKernel, RecordingBackend};

/// Failure reported by a backend.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// A space extent was not positive.
    #[error("invalid extent {extent} for dimension {dimension}")]
    InvalidExtent { dimension: usize, extent: i64 },
    /// Constant data does not fill its layout.
    #[error("constant data has {found} elements, layout needs {expected}")]
    ConstantSizeMismatch { expected: u64, found: usize },
    /// The layout's element count does not fit in a `u64`.
    #[error("layout {shape:?} has more than u64::MAX elements")]
    LayoutOverflow { shape: Vec<u64> },
    /// A kernel was registered against a space this backend did not create.
    #[error("unknown space {0:?}")]
    UnknownSpace(SpaceId),
    /// The backend refused the operation.
    #[error("backend rejected {operation}: {reason}")]
    Rejected {
        operation: &'static str,
        reason: String,
    },
}

/// Native code generator as seen by nest lowering.
pub trait Backend {
    /// Create a space with one native index per extent, in order.
    fn create_space(&mut self, extents: &[i64]) -> Result<NativeSpace, BackendError>;

    /// Allocate a fresh temporary array.
    fn allocate(
        &mut self,
        element_type: ElementType,
        layout: &Layout,
    ) -> Result<NativeArray, BackendError>;

    /// Bind a native array to existing constant data.
    fn resolve_constant(
        &mut self,
        element_type: ElementType,
        layout: &Layout,
        data: &ConstantData,
    ) -> Result<NativeArray, BackendError>;

    /// Wrap the runtime buffer passed for an array argument.
    fn wrap_argument(
        &mut self,
        element_type: ElementType,
        layout: &Layout,
        buffer: u32,
    ) -> Result<NativeArray, BackendError>;

    /// Register a kernel for emission inside `space`.
    fn add_kernel(
        &mut self,
        space: &NativeSpace,
        kernel: Kernel,
        predicate: Option<Predicate>,
        placement: Option<Placement>,
    ) -> Result<(), BackendError>;
}
