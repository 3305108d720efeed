//! Array handles and their metadata.

use std::fmt;
use std::rc::Rc;

use crate::arena::{CaptureArena, CaptureId, CaptureKind};

/// How a captured array gets its backend counterpart.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArrayRole {
    /// Scratch storage. The backend allocates a fresh buffer per pass.
    Temporary,
    /// Read-only data owned by the front end. The backend resolves a
    /// reference to it.
    Constant,
    /// Read-only function argument, seeded by the caller.
    Input,
    /// Read-write function argument, seeded by the caller.
    InputOutput,
}

impl ArrayRole {
    /// Returns `true` for roles whose backend handle is supplied as a function
    /// argument rather than materialized during capture resolution.
    #[inline]
    pub fn is_argument(self) -> bool {
        matches!(self, ArrayRole::Input | ArrayRole::InputOutput)
    }
}

/// Element type of an array.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float16,
    Float32,
    Float64,
}

/// Dimension order of an array's memory layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LayoutOrder {
    /// Row-major: the first dimension has the largest stride.
    FirstMajor,
    /// Column-major: the last dimension has the largest stride.
    LastMajor,
}

/// Logical shape plus dimension order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Layout {
    shape: Vec<u64>,
    order: LayoutOrder,
}

impl Layout {
    /// Row-major layout of the given shape.
    pub fn first_major(shape: &[u64]) -> Self {
        Layout {
            shape: shape.to_vec(),
            order: LayoutOrder::FirstMajor,
        }
    }

    /// Column-major layout of the given shape.
    pub fn last_major(shape: &[u64]) -> Self {
        Layout {
            shape: shape.to_vec(),
            order: LayoutOrder::LastMajor,
        }
    }

    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    pub fn order(&self) -> LayoutOrder {
        self.order
    }

    /// Total number of elements, or `None` if the count overflows `u64`.
    pub fn num_elements(&self) -> Option<u64> {
        self.shape
            .iter()
            .try_fold(1u64, |count, &extent| count.checked_mul(extent))
    }
}

/// Front-end owned contents of a constant array.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstantData {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

impl ConstantData {
    pub fn len(&self) -> usize {
        match self {
            ConstantData::Int(values) => values.len(),
            ConstantData::Float(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Front-end reference to a data buffer.
///
/// Identity, not value, is the resolution key: cloning keeps the token, while
/// two handles built from identical metadata stay distinct.
#[derive(Clone)]
pub struct ArrayHandle {
    id: CaptureId,
    role: ArrayRole,
    element_type: ElementType,
    layout: Layout,
    data: Option<Rc<ConstantData>>,
}

impl ArrayHandle {
    fn with_role(
        arena: &mut CaptureArena,
        role: ArrayRole,
        element_type: ElementType,
        layout: Layout,
        data: Option<Rc<ConstantData>>,
    ) -> Self {
        ArrayHandle {
            id: arena.alloc(CaptureKind::Array),
            role,
            element_type,
            layout,
            data,
        }
    }

    /// Scratch array allocated by the backend on every lowering pass.
    pub fn temporary(arena: &mut CaptureArena, element_type: ElementType, layout: Layout) -> Self {
        Self::with_role(arena, ArrayRole::Temporary, element_type, layout, None)
    }

    /// Constant array backed by front-end data.
    pub fn constant(
        arena: &mut CaptureArena,
        element_type: ElementType,
        layout: Layout,
        data: ConstantData,
    ) -> Self {
        Self::with_role(
            arena,
            ArrayRole::Constant,
            element_type,
            layout,
            Some(Rc::new(data)),
        )
    }

    /// Read-only function argument.
    pub fn input(arena: &mut CaptureArena, element_type: ElementType, layout: Layout) -> Self {
        Self::with_role(arena, ArrayRole::Input, element_type, layout, None)
    }

    /// Read-write function argument.
    pub fn input_output(
        arena: &mut CaptureArena,
        element_type: ElementType,
        layout: Layout,
    ) -> Self {
        Self::with_role(arena, ArrayRole::InputOutput, element_type, layout, None)
    }

    #[inline]
    pub fn id(&self) -> CaptureId {
        self.id
    }

    #[inline]
    pub fn role(&self) -> ArrayRole {
        self.role
    }

    #[inline]
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Constant contents. `Some` only for [`ArrayRole::Constant`].
    pub fn data(&self) -> Option<&ConstantData> {
        self.data.as_deref()
    }
}

impl fmt::Debug for ArrayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayHandle")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("element_type", &self.element_type)
            .field("shape", &self.layout.shape)
            .finish_non_exhaustive()
    }
}
