//! Iteration spaces and logic binding.
//!
//! A caller declares a [`Nest`] (one extent and one loop index per dimension),
//! attaches [`LogicFunction`]s to it, and lowers it through a [`Plan`] any
//! number of times. Each lowering pass:
//!
//! 1. binds the pass's [`Parameters`](tessera_ir::Parameters),
//! 2. replays the nest's deferred extents ([`Nest::replay_deferred`]),
//! 3. creates the native space inside a fresh [`BuildContext`]
//!    ([`Nest::build_context`]),
//! 4. replays the recorded commands ([`Nest::replay_commands`]); each one
//!    resolves a logic function's captures and registers a kernel.
//!
//! # Identity
//!
//! Capture resolution keys everything on [`CaptureId`](tessera_ir::CaptureId)
//! tokens. The identity map lives in the [`BuildContext`], so it starts empty on
//! every pass and nothing resolved in one pass leaks into the next.
//!
//! # Crate Dependencies
//!
//! `tessera_nest` depends on `tessera_ir` for the front-end handles and on
//! `tessera_backend` for the [`Backend`](tessera_backend::Backend) trait.

mod context;
mod error;
mod logic;
mod nest;
mod options;
mod resolve;
mod schedule;

pub use context::{BuildContext, FunctionArgs, IdentityMap};
pub use error::NestError;
pub use logic::{
    Binding, KernelScope, LogicBuilder, LogicFunction, LogicOptions, Replacement, Replacements,
};
pub use nest::Nest;
pub use options::BuildOptions;
pub use resolve::resolve_captures;
pub use schedule::{LoweredNest, Plan, Schedule, Target, TargetCategory};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=tessera_nest=debug` or `RUST_LOG=tessera_nest=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
