//! `Function` and closely related types.

use std::{fmt, sync::Arc};

use crate::{
    env::{Env, Scope},
    error::{ErrorKind, EvalResult},
    frame::Frame,
    node::{FnDef, Node},
    prims::{Arity, Primitive},
};
use rapids_parser::Location;

/// Function defined within the interpreted code, together with the lexical scope
/// active at the moment of definition.
#[derive(Clone)]
pub struct Closure {
    def: Arc<FnDef>,
    scope: Option<Arc<Scope>>,
}

impl fmt::Debug for Closure {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Closure")
            .field("params", &self.def.params())
            .field("scope_depth", &self.scope.as_ref().map_or(0, |scope| scope.depth()))
            .finish()
    }
}

impl Closure {
    pub(crate) fn new(def: Arc<FnDef>, scope: Option<Arc<Scope>>) -> Self {
        Self { def, scope }
    }

    /// Returns the function definition.
    pub fn def(&self) -> &FnDef {
        &self.def
    }

    /// Returns the captured lexical scope.
    pub fn scope(&self) -> Option<&Arc<Scope>> {
        self.scope.as_ref()
    }

    fn apply(&self, env: &mut Env<'_>, args: &[Node]) -> EvalResult {
        let expected = self.def.params().len();
        if args.len() != expected {
            let err = ErrorKind::ArityMismatch {
                name: self.def.name(),
                expected: Arity::Exact(expected),
                actual: args.len(),
            };
            return Err(err.into());
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(env.exec_tracked(arg)?);
        }
        let scope = Scope::new(Arc::clone(&self.def), values, self.scope.clone());
        env.with_scope(Arc::new(scope), |env| self.def.body().exec(env))
    }

    pub(crate) fn collect_frames(&self, frames: &mut Vec<Frame>) {
        if let Some(scope) = &self.scope {
            scope.collect_frames(frames);
        }
    }

    pub(crate) fn holds_frames(&self) -> bool {
        self.scope.as_ref().map_or(false, |scope| scope.holds_frames())
    }
}

/// Function value: either a registered primitive, or a closure defined in the code.
#[derive(Debug, Clone)]
pub enum Function {
    /// Primitive function implemented in Rust.
    Primitive(Arc<dyn Primitive>),
    /// Function defined within the interpreted code.
    Closure(Closure),
}

impl Function {
    /// Returns the name of this function. Closures are named after their parameters.
    pub fn name(&self) -> String {
        match self {
            Self::Primitive(primitive) => primitive.name().to_owned(),
            Self::Closure(closure) => closure.def.name(),
        }
    }

    /// Returns the function arity.
    pub fn arity(&self) -> Arity {
        match self {
            Self::Primitive(primitive) => primitive.arity(),
            Self::Closure(closure) => Arity::Exact(closure.def.params().len()),
        }
    }

    /// Returns the location of the function definition, if it is defined in the code.
    pub fn def_location(&self) -> Option<&Location> {
        match self {
            Self::Primitive(_) => None,
            Self::Closure(closure) => closure.def.location(),
        }
    }

    /// Applies this function to unevaluated `args`. Arity is checked before evaluating
    /// any args.
    pub fn apply(&self, env: &mut Env<'_>, args: &[Node]) -> EvalResult {
        match self {
            Self::Primitive(primitive) => {
                primitive.arity().check(primitive.name(), args.len())?;
                primitive.apply(env, args)
            }
            Self::Closure(closure) => closure.apply(env, args),
        }
    }

    /// Checks whether two function values alias the same function.
    pub fn is_same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Primitive(this), Self::Primitive(other)) => {
                // Compare data pointers only; vtable pointers may differ between codegen units.
                std::ptr::eq(
                    Arc::as_ptr(this).cast::<()>(),
                    Arc::as_ptr(other).cast::<()>(),
                )
            }
            (Self::Closure(this), Self::Closure(other)) => {
                let same_scope = match (&this.scope, &other.scope) {
                    (Some(this), Some(other)) => Arc::ptr_eq(this, other),
                    (None, None) => true,
                    _ => false,
                };
                Arc::ptr_eq(&this.def, &other.def) && same_scope
            }
            _ => false,
        }
    }
}
