//! Schedules, plans and lowering passes.
//!
//! [`Schedule`] owns a [`Nest`] and derives per-pass state from its shape.
//! [`Plan`] pairs a schedule with a [`Target`] and runs lowering passes.

use std::borrow::Cow;

use rustc_hash::FxHashMap;
use tessera_backend::{Backend, NativeSpace};
use tessera_ir::{CaptureId, LoopIndex, Parameters};

use crate::context::{BuildContext, FunctionArgs, IdentityMap};
use crate::error::NestError;
use crate::nest::Nest;
use crate::options::BuildOptions;

/// Broad class of a compilation target.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TargetCategory {
    Cpu,
    Gpu,
}

/// Where a plan's kernels will run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub name: Cow<'static, str>,
    pub category: TargetCategory,
    /// Widest vector register, in bytes.
    pub vector_bytes: u32,
}

impl Target {
    /// The machine doing the compiling.
    pub const HOST: Target = Target {
        name: Cow::Borrowed("host"),
        category: TargetCategory::Cpu,
        vector_bytes: 32,
    };

    pub fn new(
        name: impl Into<Cow<'static, str>>,
        category: TargetCategory,
        vector_bytes: u32,
    ) -> Self {
        Target {
            name: name.into(),
            category,
            vector_bytes,
        }
    }
}

impl Default for Target {
    fn default() -> Self {
        Target::HOST
    }
}

/// A nest plus the index bookkeeping derived from its shape.
#[derive(Debug)]
pub struct Schedule {
    nest: Nest,
    /// Loop index → (dimension, concrete extent). Rebuilt every pass.
    index_map: FxHashMap<CaptureId, (usize, i64)>,
}

impl Schedule {
    pub fn new(nest: Nest) -> Self {
        Schedule {
            nest,
            index_map: FxHashMap::default(),
        }
    }

    pub fn nest(&self) -> &Nest {
        &self.nest
    }

    /// Dimension of `index`, as of the last prepared pass.
    pub fn dimension_of(&self, index: LoopIndex) -> Option<usize> {
        self.index_map.get(&index.id()).map(|&(dimension, _)| dimension)
    }

    /// Concrete extent of `index`, as of the last prepared pass.
    pub fn extent_of(&self, index: LoopIndex) -> Option<i64> {
        self.index_map.get(&index.id()).map(|&(_, extent)| extent)
    }

    /// Reset per-pass state, replay deferred values, and rebuild the index
    /// map from the resolved shape.
    ///
    /// The map is cleared first: if replay fails it stays empty rather than
    /// describing the previous pass.
    pub fn prepare_pass(&mut self) -> Result<(), NestError> {
        self.index_map.clear();
        self.nest.replay_deferred()?;
        let extents = self.nest.extents()?;
        for (dimension, (index, extent)) in self
            .nest
            .indices()
            .into_vec()
            .into_iter()
            .zip(extents)
            .enumerate()
        {
            self.index_map.insert(index.id(), (dimension, extent));
        }
        Ok(())
    }

    pub fn create_plan(self, target: Target) -> Plan {
        Plan {
            schedule: self,
            target,
            options: BuildOptions::default(),
        }
    }
}

/// What one lowering pass produced.
#[derive(Debug)]
pub struct LoweredNest {
    target: Cow<'static, str>,
    space: NativeSpace,
    identity_map: IdentityMap,
    kernels: usize,
}

impl LoweredNest {
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn space(&self) -> &NativeSpace {
        &self.space
    }

    /// Identity map as it stood at the end of the pass.
    pub fn identity_map(&self) -> &IdentityMap {
        &self.identity_map
    }

    /// Number of kernels registered with the backend.
    pub fn kernel_count(&self) -> usize {
        self.kernels
    }
}

/// A schedule bound to a target. Lowered any number of times.
#[derive(Debug)]
pub struct Plan {
    schedule: Schedule,
    target: Target,
    options: BuildOptions,
}

impl Plan {
    #[must_use]
    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn options(&self) -> BuildOptions {
        self.options
    }

    /// Run one lowering pass against `backend`.
    ///
    /// Binds `parameters`, replays deferred values, then builds in a fresh
    /// [`BuildContext`]: nothing resolved by an earlier pass is visible.
    ///
    /// The bindings last only for this pass. They are released when it ends,
    /// whether it succeeds or not, so a later pass must bind its own values.
    pub fn lower(
        &mut self,
        backend: &mut dyn Backend,
        args: FunctionArgs,
        parameters: &Parameters,
    ) -> Result<LoweredNest, NestError> {
        tracing::debug!(
            target_name = %self.target.name,
            parameters = parameters.len(),
            "lowering pass started"
        );
        let lowered = parameters
            .apply()
            .map_err(NestError::from)
            .and_then(|()| self.lower_bound(backend, args));
        parameters.release();
        lowered
    }

    fn lower_bound(
        &mut self,
        backend: &mut dyn Backend,
        args: FunctionArgs,
    ) -> Result<LoweredNest, NestError> {
        self.schedule.prepare_pass()?;

        let nest = &self.schedule.nest;
        let mut ctx = BuildContext::new(backend, args, self.options);
        nest.build_context(&mut ctx)?;
        nest.replay_commands(&mut ctx)?;
        let (space, identity_map) = ctx.finish();
        let space = space.ok_or(NestError::MissingSpace)?;

        tracing::debug!(
            target_name = %self.target.name,
            space = ?space.id,
            kernels = nest.command_count(),
            "lowering pass finished"
        );
        Ok(LoweredNest {
            target: self.target.name.clone(),
            space,
            identity_map,
            kernels: nest.command_count(),
        })
    }
}

#[cfg(test)]
mod tests;
