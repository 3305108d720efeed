//! In-memory backend that records every call.

use tessera_ir::{ConstantData, ElementType, Layout, Placement, Predicate};

use crate::kernel::Kernel;
use crate::native::{ArrayOrigin, NativeArray, NativeSpace, SpaceId};
use crate::{Backend, BackendError};

/// Operations of the [`Backend`] trait, for fault injection.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BackendOp {
    CreateSpace,
    Allocate,
    ResolveConstant,
    WrapArgument,
    AddKernel,
}

impl BackendOp {
    pub fn name(self) -> &'static str {
        match self {
            BackendOp::CreateSpace => "create_space",
            BackendOp::Allocate => "allocate",
            BackendOp::ResolveConstant => "resolve_constant",
            BackendOp::WrapArgument => "wrap_argument",
            BackendOp::AddKernel => "add_kernel",
        }
    }
}

/// A kernel registration as seen by the backend.
#[derive(Clone, Debug)]
pub struct RecordedKernel {
    pub space: SpaceId,
    pub kernel: Kernel,
    pub predicate: Option<Predicate>,
    pub placement: Option<Placement>,
}

/// Backend that hands out sequential ids and keeps a log of what it was asked
/// to do.
///
/// Array ids are unique across the backend's lifetime, so handles produced in
/// different lowering passes never compare equal.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    spaces: Vec<NativeSpace>,
    arrays: Vec<(NativeArray, Layout)>,
    kernels: Vec<RecordedKernel>,
    rejected: Vec<BackendOp>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call of `op` fail with [`BackendError::Rejected`].
    pub fn reject(&mut self, op: BackendOp) {
        if !self.rejected.contains(&op) {
            self.rejected.push(op);
        }
    }

    /// Undo all [`reject`](Self::reject) calls.
    pub fn accept_all(&mut self) {
        self.rejected.clear();
    }

    pub fn spaces(&self) -> &[NativeSpace] {
        &self.spaces
    }

    pub fn kernels(&self) -> &[RecordedKernel] {
        &self.kernels
    }

    /// Every array handed out, with the layout it was created for.
    pub fn arrays(&self) -> &[(NativeArray, Layout)] {
        &self.arrays
    }

    /// Number of arrays handed out with the given origin.
    pub fn count(&self, origin: ArrayOrigin) -> usize {
        self.arrays
            .iter()
            .filter(|(array, _)| array.origin == origin)
            .count()
    }

    fn check(&self, op: BackendOp) -> Result<(), BackendError> {
        if self.rejected.contains(&op) {
            return Err(BackendError::Rejected {
                operation: op.name(),
                reason: "rejected by test configuration".to_string(),
            });
        }
        Ok(())
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "array counts never exceed u32"
    )]
    fn push_array(
        &mut self,
        element_type: ElementType,
        layout: &Layout,
        origin: ArrayOrigin,
    ) -> NativeArray {
        let array = NativeArray {
            id: self.arrays.len() as u32,
            element_type,
            origin,
        };
        self.arrays.push((array, layout.clone()));
        tracing::trace!(id = array.id, ?origin, ?element_type, "recorded array");
        array
    }
}

impl Backend for RecordingBackend {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "space counts never exceed u32"
    )]
    fn create_space(&mut self, extents: &[i64]) -> Result<NativeSpace, BackendError> {
        self.check(BackendOp::CreateSpace)?;
        if let Some((dimension, &extent)) = extents.iter().enumerate().find(|(_, &e)| e <= 0) {
            return Err(BackendError::InvalidExtent { dimension, extent });
        }
        let space = NativeSpace::new(SpaceId::new(self.spaces.len() as u32), extents);
        tracing::trace!(id = ?space.id, ?extents, "recorded space");
        self.spaces.push(space.clone());
        Ok(space)
    }

    fn allocate(
        &mut self,
        element_type: ElementType,
        layout: &Layout,
    ) -> Result<NativeArray, BackendError> {
        self.check(BackendOp::Allocate)?;
        Ok(self.push_array(element_type, layout, ArrayOrigin::Allocated))
    }

    fn resolve_constant(
        &mut self,
        element_type: ElementType,
        layout: &Layout,
        data: &ConstantData,
    ) -> Result<NativeArray, BackendError> {
        self.check(BackendOp::ResolveConstant)?;
        let expected = layout
            .num_elements()
            .ok_or_else(|| BackendError::LayoutOverflow {
                shape: layout.shape().to_vec(),
            })?;
        if data.len() as u64 != expected {
            return Err(BackendError::ConstantSizeMismatch {
                expected,
                found: data.len(),
            });
        }
        Ok(self.push_array(element_type, layout, ArrayOrigin::Constant))
    }

    fn wrap_argument(
        &mut self,
        element_type: ElementType,
        layout: &Layout,
        buffer: u32,
    ) -> Result<NativeArray, BackendError> {
        self.check(BackendOp::WrapArgument)?;
        tracing::trace!(buffer, "wrapping argument buffer");
        Ok(self.push_array(element_type, layout, ArrayOrigin::Argument))
    }

    fn add_kernel(
        &mut self,
        space: &NativeSpace,
        kernel: Kernel,
        predicate: Option<Predicate>,
        placement: Option<Placement>,
    ) -> Result<(), BackendError> {
        self.check(BackendOp::AddKernel)?;
        if !self.spaces.iter().any(|known| known.id == space.id) {
            return Err(BackendError::UnknownSpace(space.id));
        }
        tracing::trace!(name = kernel.name(), space = ?space.id, "recorded kernel");
        self.kernels.push(RecordedKernel {
            space: space.id,
            kernel,
            predicate,
            placement,
        });
        Ok(())
    }
}
