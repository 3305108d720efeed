//! Identity tokens for captured values.
//!
//! Capture resolution looks values up by identity, never by structural
//! equality: two arrays with the same element type and layout may still refer
//! to different backend buffers. Rather than relying on object addresses, every
//! identity-bearing handle is stamped with a [`CaptureId`] from a
//! [`CaptureArena`] when it is created.

use std::fmt;

/// Identity token for one capturable value.
///
/// Copy, 4 bytes, O(1) equality and hashing. Used as the key of the per-pass
/// identity map.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct CaptureId(u32);

impl CaptureId {
    /// Create a `CaptureId` from a raw value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        CaptureId(raw)
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Get the index into the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for CaptureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CaptureId({})", self.0)
    }
}

/// Identity token for a nest. Owner of its loop indices.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct NestId(u32);

impl NestId {
    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NestId({})", self.0)
    }
}

/// What kind of handle a [`CaptureId`] was issued for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CaptureKind {
    /// A loop index of some nest.
    Index,
    /// An array handle.
    Array,
    /// A deferred integer.
    Deferred,
    /// An opaque scalar value.
    Opaque,
}

/// Issues identity tokens.
///
/// One arena is shared by everything declared in a single front-end session.
/// Tokens are never reused, so an identity seen by one nest can never collide
/// with a different value declared later.
#[derive(Debug, Default)]
pub struct CaptureArena {
    kinds: Vec<CaptureKind>,
    next_nest: u32,
}

impl CaptureArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token for a handle of the given kind.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "capture counts never exceed u32"
    )]
    pub fn alloc(&mut self, kind: CaptureKind) -> CaptureId {
        let id = CaptureId(self.kinds.len() as u32);
        self.kinds.push(kind);
        id
    }

    /// Issue a fresh nest token.
    pub fn alloc_nest(&mut self) -> NestId {
        let id = NestId(self.next_nest);
        self.next_nest += 1;
        id
    }

    /// Look up the kind a token was issued for.
    ///
    /// Returns `None` for tokens that did not come from this arena.
    pub fn kind(&self, id: CaptureId) -> Option<CaptureKind> {
        self.kinds.get(id.index()).copied()
    }

    /// Number of capture tokens issued so far.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Returns `true` if no capture token has been issued.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
mod tests;
