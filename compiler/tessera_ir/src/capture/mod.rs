//! Values a kernel body closes over.
//!
//! [`Capture`] is a closed variant type. Resolution against a backend
//! pattern-matches on the variant instead of probing values at runtime, which
//! keeps the resolution rules in one exhaustive `match`.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use crate::arena::{CaptureArena, CaptureId, CaptureKind};
use crate::array::ArrayHandle;
use crate::deferred::DeferredValue;
use crate::index::LoopIndex;

/// A plain scalar.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ScalarValue {
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// A scalar with identity.
///
/// Scalar function arguments are seeded into the identity map like arrays, so
/// they need a token too. Anything else opaque is passed through untouched.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OpaqueValue {
    id: CaptureId,
    value: ScalarValue,
}

impl OpaqueValue {
    pub fn new(arena: &mut CaptureArena, value: ScalarValue) -> Self {
        OpaqueValue {
            id: arena.alloc(CaptureKind::Opaque),
            value,
        }
    }

    #[inline]
    pub fn id(self) -> CaptureId {
        self.id
    }

    #[inline]
    pub fn value(self) -> ScalarValue {
        self.value
    }
}

type SeqFn = dyn Fn() -> Result<Vec<Capture>, String>;

/// A captured sequence of values.
#[derive(Clone)]
pub enum CaptureSeq {
    /// Elements known up front.
    Fixed(Vec<Capture>),
    /// Elements produced on each resolution. Production may fail.
    Lazy(Rc<SeqFn>),
}

impl CaptureSeq {
    pub fn lazy(produce: impl Fn() -> Result<Vec<Capture>, String> + 'static) -> Self {
        CaptureSeq::Lazy(Rc::new(produce))
    }

    /// The elements, producing them if lazy.
    pub fn elements(&self) -> Result<Cow<'_, [Capture]>, String> {
        match self {
            CaptureSeq::Fixed(elements) => Ok(Cow::Borrowed(elements.as_slice())),
            CaptureSeq::Lazy(produce) => produce().map(Cow::Owned),
        }
    }
}

impl fmt::Debug for CaptureSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureSeq::Fixed(elements) => f.debug_list().entries(elements).finish(),
            CaptureSeq::Lazy(_) => write!(f, "[..lazy]"),
        }
    }
}

/// A value captured by a logic function.
#[derive(Clone, Debug)]
pub enum Capture {
    Deferred(DeferredValue),
    Index(LoopIndex),
    Array(ArrayHandle),
    Opaque(OpaqueValue),
    Sequence(CaptureSeq),
}

impl Capture {
    /// Identity token, if this variant carries one. Sequences do not.
    pub fn identity(&self) -> Option<CaptureId> {
        match self {
            Capture::Deferred(value) => Some(value.id()),
            Capture::Index(index) => Some(index.id()),
            Capture::Array(array) => Some(array.id()),
            Capture::Opaque(value) => Some(value.id()),
            Capture::Sequence(_) => None,
        }
    }

    /// Short variant name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Capture::Deferred(_) => "deferred",
            Capture::Index(_) => "index",
            Capture::Array(_) => "array",
            Capture::Opaque(_) => "opaque",
            Capture::Sequence(_) => "sequence",
        }
    }
}

impl From<DeferredValue> for Capture {
    fn from(value: DeferredValue) -> Self {
        Capture::Deferred(value)
    }
}

impl From<&DeferredValue> for Capture {
    fn from(value: &DeferredValue) -> Self {
        Capture::Deferred(value.clone())
    }
}

impl From<LoopIndex> for Capture {
    fn from(index: LoopIndex) -> Self {
        Capture::Index(index)
    }
}

impl From<ArrayHandle> for Capture {
    fn from(array: ArrayHandle) -> Self {
        Capture::Array(array)
    }
}

impl From<&ArrayHandle> for Capture {
    fn from(array: &ArrayHandle) -> Self {
        Capture::Array(array.clone())
    }
}

impl From<OpaqueValue> for Capture {
    fn from(value: OpaqueValue) -> Self {
        Capture::Opaque(value)
    }
}

impl From<CaptureSeq> for Capture {
    fn from(seq: CaptureSeq) -> Self {
        Capture::Sequence(seq)
    }
}

impl<T: Into<Capture>> From<Vec<T>> for Capture {
    fn from(elements: Vec<T>) -> Self {
        Capture::Sequence(CaptureSeq::Fixed(
            elements.into_iter().map(Into::into).collect(),
        ))
    }
}
