//! Error handling.

use nom::{
    error::{ContextError, ErrorKind as NomErrorKind, ParseError},
    Slice,
};

use std::fmt;

use crate::{num_list::NumListError, ExprType, InputSpan, Spanned};

/// Parsing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Context {
    /// Expression.
    Expr,
    /// Number literal.
    Number,
    /// String literal.
    String,
    /// Function application `(op args..)`.
    Application,
    /// Function definition `{params . body}`.
    FnDefinition,
    /// Number or string list `[..]`.
    List,
    /// Identifier, such as the name in the `->name` suffix.
    Identifier,
}

impl fmt::Display for Context {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Expr => "arbitrary expression",
            Self::Number => "number literal",
            Self::String => "string literal",
            Self::Application => "function application",
            Self::FnDefinition => "function definition",
            Self::List => "list",
            Self::Identifier => "identifier",
        })
    }
}

impl Context {
    pub(crate) fn new(s: &str) -> Self {
        match s {
            "expr" => Self::Expr,
            "number" => Self::Number,
            "string" => Self::String,
            "application" => Self::Application,
            "fn_def" => Self::FnDefinition,
            "list" => Self::List,
            "identifier" => Self::Identifier,
            _ => unreachable!(),
        }
    }

    pub(crate) fn to_str(self) -> &'static str {
        match self {
            Self::Expr => "expr",
            Self::Number => "number",
            Self::String => "string",
            Self::Application => "application",
            Self::FnDefinition => "fn_def",
            Self::List => "list",
            Self::Identifier => "identifier",
        }
    }
}

/// Parsing error kind.
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Error parsing a number literal.
    Number(anyhow::Error),
    /// String literal lacks the closing quote.
    UnterminatedString,
    /// Unknown escape sequence in a string literal, such as `\q`.
    InvalidEscape(char),
    /// Escape sequence in a string literal encodes an invalid Unicode code point.
    InvalidCodePoint(u32),
    /// Function parameter is not a valid identifier.
    InvalidParam,
    /// Function parameter is declared more than once.
    DuplicateParam,
    /// Operator position of an application holds an expression that cannot be called.
    NotCallable(ExprType),
    /// Application without an operator: `()`.
    EmptyApplication,
    /// Number list is malformed.
    NumList(NumListError),

    /// No rules where expecting this character.
    UnexpectedChar {
        /// Parsing context.
        context: Option<Context>,
    },
    /// Unexpected expression end.
    UnexpectedTerm {
        /// Parsing context.
        context: Option<Context>,
    },
    /// Leftover symbols after parsing.
    Leftovers,
    /// Other parsing error.
    Other {
        /// `nom`-defined error kind.
        kind: NomErrorKind,
        /// Parsing context.
        context: Option<Context>,
    },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(err) => write!(formatter, "Invalid number literal: {}", err),
            Self::UnterminatedString => formatter.write_str("Unterminated string literal"),
            Self::InvalidEscape(ch) => write!(formatter, "Invalid escape sequence: \\{}", ch),
            Self::InvalidCodePoint(code) => {
                write!(formatter, "Invalid Unicode code point: 0x{:X}", code)
            }
            Self::InvalidParam => {
                formatter.write_str("Function parameter is not a valid identifier")
            }
            Self::DuplicateParam => formatter.write_str("Function parameter is declared twice"),
            Self::NotCallable(ty) => write!(formatter, "Cannot apply {} as a function", ty),
            Self::EmptyApplication => formatter.write_str("Empty function application"),
            Self::NumList(err) => write!(formatter, "Invalid number list: {}", err),

            Self::UnexpectedChar { context: Some(ctx) } => {
                write!(formatter, "Unexpected character in {}", ctx)
            }
            Self::UnexpectedChar { .. } => formatter.write_str("Unexpected character"),
            Self::UnexpectedTerm { context: Some(ctx) } => write!(formatter, "Unfinished {}", ctx),
            Self::UnexpectedTerm { .. } => formatter.write_str("Unfinished expression"),
            Self::Leftovers => formatter.write_str("Uninterpreted characters after parsing"),
            Self::Other { .. } => formatter.write_str("Cannot parse sequence"),
        }
    }
}

impl ErrorKind {
    fn context_mut(&mut self) -> Option<&mut Option<Context>> {
        match self {
            Self::UnexpectedChar { context }
            | Self::UnexpectedTerm { context }
            | Self::Other { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Returns optional error context.
    pub fn context(&self) -> Option<Context> {
        match self {
            Self::UnexpectedChar { context }
            | Self::UnexpectedTerm { context }
            | Self::Other { context, .. } => *context,
            _ => None,
        }
    }

    pub(crate) fn unexpected(input: InputSpan<'_>, context: Context) -> Self {
        if input.fragment().is_empty() {
            Self::UnexpectedTerm {
                context: Some(context),
            }
        } else {
            Self::UnexpectedChar {
                context: Some(context),
            }
        }
    }
}

impl std::error::Error for ErrorKind {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Number(err) => Some(err.as_ref()),
            Self::NumList(err) => Some(err),
            _ => None,
        }
    }
}

/// Parsing error with the associated code span.
#[derive(Debug)]
pub struct Error<'a> {
    inner: Spanned<'a, ErrorKind>,
}

impl<'a> Error<'a> {
    pub(crate) fn new(span: InputSpan<'a>, kind: ErrorKind) -> Self {
        Self {
            inner: Spanned::new(span, kind),
        }
    }

    pub(crate) fn from_parts(span: Spanned<'a>, kind: ErrorKind) -> Self {
        Self {
            inner: span.copy_with_extra(kind),
        }
    }

    /// Creates an error about an unexpected char (or input end) at the start of `input`.
    pub(crate) fn unexpected(input: InputSpan<'a>, context: Context) -> Self {
        let kind = ErrorKind::unexpected(input, context);
        let span = match input.fragment().chars().next() {
            Some(ch) => input.slice(..ch.len_utf8()),
            None => input,
        };
        Self::new(span, kind)
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.inner.extra
    }

    /// Returns the span of this error.
    pub fn span(&self) -> Spanned<'a> {
        self.inner.with_no_extra()
    }

    /// Converts this error into its kind, discarding the span.
    pub fn into_kind(self) -> ErrorKind {
        self.inner.extra
    }
}

impl fmt::Display for Error<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}:{}: {}",
            self.inner.location_line(),
            self.inner.get_column(),
            self.inner.extra
        )
    }
}

impl std::error::Error for Error<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.inner.extra)
    }
}

impl<'a> ParseError<InputSpan<'a>> for Error<'a> {
    fn from_error_kind(mut input: InputSpan<'a>, kind: NomErrorKind) -> Self {
        if kind == NomErrorKind::Char {
            if let Some(ch) = input.fragment().chars().next() {
                // Truncate the error span to the first ineligible char.
                input = input.slice(..ch.len_utf8());
            }
        }

        let error_kind = if kind == NomErrorKind::Char {
            if input.fragment().is_empty() {
                ErrorKind::UnexpectedTerm { context: None }
            } else {
                ErrorKind::UnexpectedChar { context: None }
            }
        } else {
            ErrorKind::Other {
                kind,
                context: None,
            }
        };

        Error::new(input, error_kind)
    }

    fn append(_: InputSpan<'a>, _: NomErrorKind, other: Self) -> Self {
        other
    }
}

impl<'a> ContextError<InputSpan<'a>> for Error<'a> {
    fn add_context(input: InputSpan<'a>, ctx: &'static str, mut target: Self) -> Self {
        if input.location_offset() <= target.inner.location_offset() {
            if let Some(context) = target.inner.extra.context_mut() {
                if context.is_none() {
                    *context = Some(Context::new(ctx));
                }
            }
        }
        target
    }
}
