//! Native handles handed out by a backend.

use std::fmt;

use smallvec::SmallVec;
use tessera_ir::{ElementType, ScalarValue};

/// Identifier of a native space within one backend.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct SpaceId(u32);

impl SpaceId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        SpaceId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpaceId({})", self.0)
    }
}

/// Native counterpart of one loop index.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NativeIndex {
    pub space: SpaceId,
    pub dimension: u32,
}

impl fmt::Display for NativeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}.i{}", self.space.0, self.dimension)
    }
}

/// How a native array came to exist.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ArrayOrigin {
    Allocated,
    Constant,
    Argument,
}

/// Native array handle.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NativeArray {
    pub id: u32,
    pub element_type: ElementType,
    pub origin: ArrayOrigin,
}

/// Native iteration space: concrete extents and one index per dimension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeSpace {
    pub id: SpaceId,
    pub extents: SmallVec<[i64; 4]>,
    pub indices: SmallVec<[NativeIndex; 4]>,
}

impl NativeSpace {
    /// Build a space whose indices follow the extents in order.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "space rank never exceeds u32"
    )]
    pub fn new(id: SpaceId, extents: &[i64]) -> Self {
        let indices = (0..extents.len())
            .map(|dimension| NativeIndex {
                space: id,
                dimension: dimension as u32,
            })
            .collect();
        NativeSpace {
            id,
            extents: SmallVec::from_slice(extents),
            indices,
        }
    }

    pub fn rank(&self) -> usize {
        self.indices.len()
    }
}

/// Backend-ready value substituted for a capture.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum NativeValue {
    Index(NativeIndex),
    Array(NativeArray),
    Scalar(ScalarValue),
}

impl NativeValue {
    pub fn as_array(&self) -> Option<NativeArray> {
        match self {
            NativeValue::Array(array) => Some(*array),
            _ => None,
        }
    }

    pub fn as_index(&self) -> Option<NativeIndex> {
        match self {
            NativeValue::Index(index) => Some(*index),
            _ => None,
        }
    }
}

/// Runtime argument supplied by the caller of a lowered function.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RuntimeArg {
    /// Buffer slot of an array argument.
    Buffer(u32),
    Scalar(ScalarValue),
}
