//! Loop indices.

use std::fmt;

use crate::arena::{CaptureArena, CaptureId, CaptureKind, NestId};

/// Identity token for one dimension of a nest's iteration space.
///
/// Indices are created together with their nest and are only ever used as
/// identity keys. Two indices of equal extent are still distinct: equality
/// compares the [`CaptureId`], nothing else.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct LoopIndex {
    id: CaptureId,
    owner: NestId,
    dimension: u32,
}

impl LoopIndex {
    /// Create the index for dimension `dimension` of nest `owner`.
    pub fn new(arena: &mut CaptureArena, owner: NestId, dimension: u32) -> Self {
        LoopIndex {
            id: arena.alloc(CaptureKind::Index),
            owner,
            dimension,
        }
    }

    #[inline]
    pub fn id(self) -> CaptureId {
        self.id
    }

    /// The nest this index belongs to.
    #[inline]
    pub fn owner(self) -> NestId {
        self.owner
    }

    /// Position of this index in its nest's shape.
    #[inline]
    pub fn dimension(self) -> u32 {
        self.dimension
    }
}

impl fmt::Debug for LoopIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LoopIndex(n{}.i{}, {:?})",
            self.owner.raw(),
            self.dimension,
            self.id
        )
    }
}

impl fmt::Display for LoopIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.dimension)
    }
}
