//! The iteration space.
//!
//! A [`Nest`] is used in two phases:
//!
//! - **Declare**: [`Nest::new`] fixes the rank and creates one [`LoopIndex`] per
//!   dimension; [`Nest::iteration_logic`] records commands. Extents may still
//!   be [`DeferredValue`](tessera_ir::DeferredValue)s.
//! - **Resolve and build**, once per lowering pass:
//!   [`Nest::replay_deferred`] writes concrete extents,
//!   [`Nest::build_context`] creates the native space, and
//!   [`Nest::replay_commands`] registers the kernels.
//!
//! Only the extent half of a shape entry is ever rewritten. The rank and the
//! loop indices never change.

use smallvec::SmallVec;
use tessera_backend::NativeValue;
use tessera_ir::{CaptureArena, Dims, Extent, LoopIndex, NestId};

use crate::context::BuildContext;
use crate::error::NestError;
use crate::logic::{LogicFunction, LogicOptions};
use crate::resolve::add_iteration_logic;
use crate::schedule::{Plan, Schedule, Target};

/// A recorded build action, replayed against every pass's context.
#[derive(Clone, Debug)]
enum Command {
    AddLogic {
        logic: LogicFunction,
        options: LogicOptions,
    },
}

impl Command {
    fn apply(&self, ctx: &mut BuildContext<'_>) -> Result<(), NestError> {
        match self {
            Command::AddLogic { logic, options } => add_iteration_logic(logic, options, ctx),
        }
    }
}

/// What a pending deferred call does with its resolved parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum DeferredAction {
    /// Overwrite every shape extent, in dimension order.
    InitShape,
}

/// A deferred call and the extents it depends on, as declared.
#[derive(Clone, Debug)]
struct DeferredCall {
    action: DeferredAction,
    params: SmallVec<[Extent; 4]>,
}

/// A declared iteration space plus the logic attached to it.
#[derive(Debug)]
pub struct Nest {
    id: NestId,
    shape: Vec<(Extent, LoopIndex)>,
    commands: Vec<Command>,
    logic_fns: Vec<LogicFunction>,
    deferred_calls: Vec<DeferredCall>,
}

impl Nest {
    /// Declare a nest with one dimension per extent.
    ///
    /// Extents may mix integers and deferred values; deferred ones are
    /// resolved by [`replay_deferred`](Self::replay_deferred).
    #[expect(
        clippy::cast_possible_truncation,
        reason = "nest rank never exceeds u32"
    )]
    pub fn new<E: Into<Extent>>(
        arena: &mut CaptureArena,
        shape: impl IntoIterator<Item = E>,
    ) -> Self {
        let id = arena.alloc_nest();
        let shape: Vec<(Extent, LoopIndex)> = shape
            .into_iter()
            .enumerate()
            .map(|(dim, extent)| (extent.into(), LoopIndex::new(arena, id, dim as u32)))
            .collect();

        let mut deferred_calls = Vec::new();
        if shape.iter().any(|(extent, _)| extent.is_deferred()) {
            deferred_calls.push(DeferredCall {
                action: DeferredAction::InitShape,
                params: shape.iter().map(|(extent, _)| extent.clone()).collect(),
            });
        }

        tracing::debug!(nest = ?id, rank = shape.len(), "declared nest");
        Nest {
            id,
            shape,
            commands: Vec::new(),
            logic_fns: Vec::new(),
            deferred_calls,
        }
    }

    #[inline]
    pub fn id(&self) -> NestId {
        self.id
    }

    /// Number of dimensions. Fixed at construction.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Current extents: the bare extent for a 1-D nest, else one per
    /// dimension.
    pub fn shape(&self) -> Dims<Extent> {
        Dims::from_vec(self.shape.iter().map(|(extent, _)| extent.clone()).collect())
    }

    /// Loop indices: the bare index for a 1-D nest, else one per dimension.
    pub fn indices(&self) -> Dims<LoopIndex> {
        Dims::from_vec(self.shape.iter().map(|(_, index)| *index).collect())
    }

    /// Concrete extents in dimension order.
    ///
    /// Fails with [`NestError::UnresolvedShape`] if any dimension is still
    /// deferred.
    pub fn extents(&self) -> Result<Vec<i64>, NestError> {
        self.shape
            .iter()
            .enumerate()
            .map(|(dimension, (extent, _))| match extent {
                Extent::Fixed(value) => Ok(*value),
                Extent::Deferred(value) => Err(NestError::UnresolvedShape {
                    dimension,
                    parameter: value.name().to_string(),
                }),
            })
            .collect()
    }

    /// Returns `true` if any dimension was declared with a deferred extent.
    pub fn has_deferred(&self) -> bool {
        !self.deferred_calls.is_empty()
    }

    /// Attach `logic` with no predicate and no placement.
    pub fn iteration_logic(&mut self, logic: LogicFunction) {
        self.iteration_logic_with(logic, LogicOptions::default());
    }

    /// Attach `logic` with scheduling metadata.
    ///
    /// Nothing is resolved here: the logic function is recorded and a command
    /// is queued that resolves its captures on every build.
    pub fn iteration_logic_with(&mut self, logic: LogicFunction, options: LogicOptions) {
        tracing::debug!(nest = ?self.id, logic = logic.name(), "attached iteration logic");
        self.logic_fns.push(logic.clone());
        self.commands.push(Command::AddLogic { logic, options });
    }

    /// Attached logic functions, in attachment order.
    pub fn logic_functions(&self) -> &[LogicFunction] {
        &self.logic_fns
    }

    /// Number of recorded build commands.
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Resolve every pending deferred value and patch the shape.
    ///
    /// All values are resolved before anything is written, so a failure
    /// leaves the shape as it was. Replaying again with the same bindings
    /// leaves the shape unchanged; replaying with new bindings picks them up.
    ///
    /// Must run before [`build_context`](Self::build_context) on every pass.
    /// State owned by collaborators that is derived from the shape (e.g. a
    /// schedule's index map) must be reset by the caller before this runs;
    /// [`Schedule::prepare_pass`] does that.
    pub fn replay_deferred(&mut self) -> Result<(), NestError> {
        let mut resolved = Vec::with_capacity(self.deferred_calls.len());
        for call in &self.deferred_calls {
            let values = call
                .params
                .iter()
                .map(|param| match param {
                    Extent::Fixed(value) => Ok(*value),
                    Extent::Deferred(value) => value.resolve(),
                })
                .collect::<Result<Vec<i64>, _>>()?;
            resolved.push((call.action, values));
        }

        for (action, values) in resolved {
            match action {
                DeferredAction::InitShape => self.init_shape(&values),
            }
        }
        Ok(())
    }

    fn init_shape(&mut self, values: &[i64]) {
        debug_assert_eq!(values.len(), self.shape.len(), "deferred shape changed rank");
        for ((extent, _), value) in self.shape.iter_mut().zip(values) {
            *extent = Extent::Fixed(*value);
        }
        tracing::debug!(nest = ?self.id, extents = ?values, "replayed deferred shape");
    }

    /// Create the native space and seed the context's identity map.
    ///
    /// Seeds, in order: every top-level function argument (arrays wrapped by
    /// the backend), then every loop index mapped to the native index of the
    /// same dimension.
    pub fn build_context(&self, ctx: &mut BuildContext<'_>) -> Result<(), NestError> {
        let extents = self.extents()?;
        ctx.seed_arguments()?;

        let space = ctx.backend().create_space(&extents)?;
        if space.rank() != self.rank() {
            return Err(NestError::SpaceRankMismatch {
                expected: self.rank(),
                found: space.rank(),
            });
        }
        for ((_, index), native) in self.shape.iter().zip(&space.indices) {
            tracing::trace!(?index, %native, "seeded loop index");
            ctx.record(index.id(), NativeValue::Index(*native));
        }
        tracing::debug!(nest = ?self.id, space = ?space.id, ?extents, "built native context");
        ctx.set_space(space);
        Ok(())
    }

    /// Replay every recorded command against `ctx`, in insertion order.
    pub fn replay_commands(&self, ctx: &mut BuildContext<'_>) -> Result<(), NestError> {
        for command in &self.commands {
            command.apply(ctx)?;
        }
        Ok(())
    }

    /// A schedule over this nest.
    pub fn create_schedule(self) -> Schedule {
        Schedule::new(self)
    }

    /// A plan for `target`, via a default schedule.
    pub fn create_plan(self, target: Target) -> Plan {
        self.create_schedule().create_plan(target)
    }

    /// A plan for [`Target::HOST`].
    pub fn create_host_plan(self) -> Plan {
        self.create_plan(Target::HOST)
    }
}
