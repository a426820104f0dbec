//! Grammar definitions for Rapids parsing.
//!
//! A [`Grammar`] is a zero-sized marker type declaring a set of optional syntax [`Features`].
//! The standard grammar is [`Rapids`]; custom grammars can switch features on or off:
//!
//! ```
//! use rapids_parser::{
//!     grammars::{Features, Grammar},
//!     Expr,
//! };
//!
//! #[derive(Debug)]
//! struct CountedGrammar;
//!
//! impl Grammar for CountedGrammar {
//!     const FEATURES: Features = Features::COUNTED_RANGES;
//! }
//!
//! let expr = CountedGrammar::parse_expr("[5:3:2]")?;
//! let Expr::NumList(list) = &expr.extra else { unreachable!() };
//! assert_eq!(list.expand(), [5.0, 7.0, 9.0]);
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```

use bitflags::bitflags;

use crate::{
    num_list::RangeSyntax,
    parser::{parse_expr, parse_exprs},
    Error, InputSpan, SpannedExpr,
};

bitflags! {
    /// Parsing features for a [`Grammar`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Features: u64 {
        /// Parse the `(expr)->name` suffix as a shorthand for `(tmp= name (expr))`.
        const TMP_ASSIGN_SUFFIX = 1;
        /// Parse backslash escapes in string literals, such as `\n` or `\u00e9`.
        /// If switched off, the backslash is a regular char.
        const STRING_ESCAPES = 2;
        /// Interpret `a:b:c` number list clauses as `base:count:stride` rather than
        /// `base:end:stride` with the exclusive `end`.
        const COUNTED_RANGES = 4;
    }
}

impl Features {
    /// Syntax for number list clauses implied by these features.
    pub fn range_syntax(self) -> RangeSyntax {
        if self.contains(Self::COUNTED_RANGES) {
            RangeSyntax::Counted
        } else {
            RangeSyntax::Bounded
        }
    }
}

/// Conversion into an [`InputSpan`].
pub trait IntoInputSpan<'a> {
    /// Converts input into a span.
    fn into_input_span(self) -> InputSpan<'a>;
}

impl<'a> IntoInputSpan<'a> for InputSpan<'a> {
    fn into_input_span(self) -> InputSpan<'a> {
        self
    }
}

impl<'a> IntoInputSpan<'a> for &'a str {
    fn into_input_span(self) -> InputSpan<'a> {
        InputSpan::new(self)
    }
}

/// Rapids grammar definition.
pub trait Grammar: 'static {
    /// Features supported by this grammar.
    const FEATURES: Features;

    /// Parses a single expression. The input must not contain anything but the expression
    /// and surrounding whitespace.
    fn parse_expr<'a, I>(input: I) -> Result<SpannedExpr<'a>, Error<'a>>
    where
        I: IntoInputSpan<'a>,
        Self: Sized,
    {
        parse_expr::<Self>(input.into_input_span())
    }

    /// Parses a whitespace-separated sequence of expressions.
    fn parse_exprs<'a, I>(input: I) -> Result<Vec<SpannedExpr<'a>>, Error<'a>>
    where
        I: IntoInputSpan<'a>,
        Self: Sized,
    {
        parse_exprs::<Self>(input.into_input_span())
    }
}

/// Standard Rapids grammar: supports the `->` suffix and string escapes, and reads
/// `a:b:c` number list clauses as `base:end:stride`.
#[derive(Debug, Clone, Copy)]
pub struct Rapids;

impl Grammar for Rapids {
    const FEATURES: Features = Features::TMP_ASSIGN_SUFFIX.union(Features::STRING_ESCAPES);
}

/// Rapids grammar without any optional features.
#[derive(Debug, Clone, Copy)]
pub struct Strict;

impl Grammar for Strict {
    const FEATURES: Features = Features::empty();
}
