//! AST types.

use std::fmt;

use crate::{num_list::NumList, Spanned};

/// Expression with the associated code span.
pub type SpannedExpr<'a> = Spanned<'a, Expr<'a>>;

/// Rapids expression.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Expr<'a> {
    /// Number literal, e.g., `3`, `-1.5e3` or `#42`.
    Number(f64),
    /// String literal with resolved escapes, e.g., `"a\tb"`.
    Str(String),
    /// Identifier, e.g., `x` or `+`. The name is the span fragment.
    Id,
    /// Number list, e.g., `[0,5:15:2]`.
    NumList(NumList),
    /// String list, e.g., `["a" "b"]`.
    StrList(Vec<String>),
    /// Function definition, e.g., `{x y . (+ x y)}`.
    FnDefinition(FnDefinition<'a>),
    /// Function application, e.g., `(+ 1 2)`.
    Apply {
        /// Operator: an identifier, a function definition or another application.
        op: Box<SpannedExpr<'a>>,
        /// Arguments.
        args: Vec<SpannedExpr<'a>>,
    },
    /// Application result bound to a session temporary, e.g., `(cols x [0])->tmp`.
    TmpAssign {
        /// Name of the temporary.
        name: Spanned<'a>,
        /// Assigned application.
        value: Box<SpannedExpr<'a>>,
    },
}

impl Expr<'_> {
    /// Returns the type of this expression.
    pub fn ty(&self) -> ExprType {
        match self {
            Self::Number(_) => ExprType::Number,
            Self::Str(_) => ExprType::Str,
            Self::Id => ExprType::Id,
            Self::NumList(_) => ExprType::NumList,
            Self::StrList(_) => ExprType::StrList,
            Self::FnDefinition(_) => ExprType::FnDefinition,
            Self::Apply { .. } => ExprType::Apply,
            Self::TmpAssign { .. } => ExprType::TmpAssign,
        }
    }

    /// Checks whether this expression may occupy the operator position of an application.
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Self::Id | Self::FnDefinition(_) | Self::Apply { .. } | Self::TmpAssign { .. }
        )
    }
}

/// Function definition, e.g., `{x y . (+ x y)}`.
#[derive(Debug, Clone, PartialEq)]
pub struct FnDefinition<'a> {
    /// Parameter names. Guaranteed to be distinct valid identifiers.
    pub params: Vec<Spanned<'a>>,
    /// Function body.
    pub body: Box<SpannedExpr<'a>>,
}

impl FnDefinition<'_> {
    /// Returns parameter names.
    pub fn param_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.params.iter().map(|param| *param.fragment())
    }
}

/// Type of an [`Expr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ExprType {
    /// Number literal.
    Number,
    /// String literal.
    Str,
    /// Identifier.
    Id,
    /// Number list.
    NumList,
    /// String list.
    StrList,
    /// Function definition.
    FnDefinition,
    /// Function application.
    Apply,
    /// Application with the `->` suffix.
    TmpAssign,
}

impl fmt::Display for ExprType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Number => "number",
            Self::Str => "string",
            Self::Id => "identifier",
            Self::NumList => "number list",
            Self::StrList => "string list",
            Self::FnDefinition => "function definition",
            Self::Apply => "function application",
            Self::TmpAssign => "temporary assignment",
        })
    }
}
