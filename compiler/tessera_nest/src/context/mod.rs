//! Per-pass build state.
//!
//! A [`BuildContext`] is created for exactly one lowering pass. It owns the
//! identity map, so a fresh context always starts with an empty map: a handle
//! resolved in pass N can never be substituted in pass N+1.

use rustc_hash::FxHashMap;
use tessera_backend::{Backend, NativeArray, NativeSpace, NativeValue, RuntimeArg};
use tessera_ir::{Capture, CaptureId, ConstantData, ElementType, Layout};

use crate::error::NestError;
use crate::options::BuildOptions;

/// Capture identity → backend value, scoped to one pass.
#[derive(Clone, Debug, Default)]
pub struct IdentityMap {
    entries: FxHashMap<CaptureId, NativeValue>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: CaptureId) -> Option<NativeValue> {
        self.entries.get(&id).copied()
    }

    pub fn contains(&self, id: CaptureId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Record a value. Returns the previous value for the identity, if any.
    pub fn insert(&mut self, id: CaptureId, value: NativeValue) -> Option<NativeValue> {
        self.entries.insert(id, value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Top-level function arguments: front-end captures paired with the runtime
/// values the caller supplies for them.
#[derive(Clone, Debug, Default)]
pub struct FunctionArgs {
    captures: Vec<Capture>,
    runtime: Vec<RuntimeArg>,
}

impl FunctionArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parallel sequences. Lengths are checked when the context is seeded.
    pub fn from_parts(captures: Vec<Capture>, runtime: Vec<RuntimeArg>) -> Self {
        FunctionArgs { captures, runtime }
    }

    /// Append one argument pair.
    #[must_use]
    pub fn with(mut self, capture: impl Into<Capture>, runtime: RuntimeArg) -> Self {
        self.captures.push(capture.into());
        self.runtime.push(runtime);
        self
    }

    pub fn captures(&self) -> &[Capture] {
        &self.captures
    }

    pub fn runtime(&self) -> &[RuntimeArg] {
        &self.runtime
    }
}

/// State of one lowering pass.
pub struct BuildContext<'b> {
    backend: &'b mut dyn Backend,
    identity_map: IdentityMap,
    space: Option<NativeSpace>,
    args: FunctionArgs,
    options: BuildOptions,
}

impl<'b> BuildContext<'b> {
    /// A context with an empty identity map.
    pub fn new(backend: &'b mut dyn Backend, args: FunctionArgs, options: BuildOptions) -> Self {
        BuildContext {
            backend,
            identity_map: IdentityMap::new(),
            space: None,
            args,
            options,
        }
    }

    pub fn identity_map(&self) -> &IdentityMap {
        &self.identity_map
    }

    /// The native space, once [`Nest::build_context`](crate::Nest::build_context) ran.
    pub fn space(&self) -> Option<&NativeSpace> {
        self.space.as_ref()
    }

    pub fn function_args(&self) -> &FunctionArgs {
        &self.args
    }

    pub fn options(&self) -> BuildOptions {
        self.options
    }

    /// Consume the context, keeping what the pass produced.
    pub fn finish(self) -> (Option<NativeSpace>, IdentityMap) {
        (self.space, self.identity_map)
    }

    pub(crate) fn backend(&mut self) -> &mut dyn Backend {
        &mut *self.backend
    }

    pub(crate) fn lookup(&self, id: CaptureId) -> Option<NativeValue> {
        self.identity_map.get(id)
    }

    pub(crate) fn record(&mut self, id: CaptureId, value: NativeValue) {
        self.identity_map.insert(id, value);
    }

    pub(crate) fn set_space(&mut self, space: NativeSpace) {
        self.space = Some(space);
    }

    pub(crate) fn allocate(
        &mut self,
        element_type: ElementType,
        layout: &Layout,
    ) -> Result<NativeArray, NestError> {
        Ok(self.backend.allocate(element_type, layout)?)
    }

    pub(crate) fn resolve_constant(
        &mut self,
        element_type: ElementType,
        layout: &Layout,
        data: &ConstantData,
    ) -> Result<NativeArray, NestError> {
        Ok(self.backend.resolve_constant(element_type, layout, data)?)
    }

    /// Seed the identity map with the top-level function arguments.
    ///
    /// Array arguments are wrapped by the backend first. Every argument must
    /// carry an identity, so sequences are rejected.
    pub(crate) fn seed_arguments(&mut self) -> Result<(), NestError> {
        if self.args.captures.len() != self.args.runtime.len() {
            return Err(NestError::ArgumentMismatch {
                position: self.args.captures.len().min(self.args.runtime.len()),
                reason: format!(
                    "{} front-end arguments but {} runtime arguments",
                    self.args.captures.len(),
                    self.args.runtime.len()
                ),
            });
        }

        for (position, (capture, runtime)) in
            self.args.captures.iter().zip(&self.args.runtime).enumerate()
        {
            let value = match (capture, *runtime) {
                (Capture::Array(array), RuntimeArg::Buffer(buffer)) => NativeValue::Array(
                    self.backend
                        .wrap_argument(array.element_type(), array.layout(), buffer)?,
                ),
                (Capture::Sequence(_), _) => {
                    return Err(NestError::ArgumentMismatch {
                        position,
                        reason: "sequence arguments have no identity".to_string(),
                    });
                }
                (Capture::Array(_), RuntimeArg::Scalar(_)) => {
                    return Err(NestError::ArgumentMismatch {
                        position,
                        reason: "array argument needs a buffer".to_string(),
                    });
                }
                (_, RuntimeArg::Buffer(_)) => {
                    return Err(NestError::ArgumentMismatch {
                        position,
                        reason: format!("{} argument cannot take a buffer", capture.kind_name()),
                    });
                }
                (_, RuntimeArg::Scalar(scalar)) => NativeValue::Scalar(scalar),
            };
            if let Some(id) = capture.identity() {
                tracing::trace!(position, ?id, ?value, "seeded argument");
                self.identity_map.insert(id, value);
            }
        }
        Ok(())
    }
}
