//! Tessera IR - front-end handles for loop-nest construction
//!
//! This crate contains the values a caller manipulates while declaring an
//! iteration space, before any backend is involved:
//! - Identity tokens and the [`CaptureArena`] that issues them
//! - [`LoopIndex`] for one dimension of a nest
//! - [`ArrayHandle`] for a buffer tagged with an [`ArrayRole`]
//! - [`DeferredValue`] for integers that are only known at lowering time
//! - [`Capture`], the closed variant type for values a kernel body closes over
//! - [`Predicate`] / [`Placement`] metadata attached to kernels
//!
//! # Design Philosophy
//!
//! - **Identity by token**: every handle carries a [`CaptureId`] issued by the
//!   arena. Cloning a handle keeps its token, so a clone is the same capture.
//!   Two handles built separately never share a token, even if they describe
//!   the same shape and element type.
//! - **Closed variants**: capture resolution pattern-matches on [`Capture`]
//!   instead of probing values at runtime.

mod arena;
mod array;
mod capture;
mod deferred;
mod dims;
mod index;
mod predicate;

pub use arena::{CaptureArena, CaptureId, CaptureKind, NestId};
pub use array::{ArrayHandle, ArrayRole, ConstantData, ElementType, Layout, LayoutOrder};
pub use capture::{Capture, CaptureSeq, OpaqueValue, ScalarValue};
pub use deferred::{DeferredError, DeferredValue, Parameters};
pub use dims::{Dims, Extent};
pub use index::LoopIndex;
pub use predicate::{Placement, Predicate};
