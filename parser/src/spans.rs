//! Source positions of Rapids expressions.
//!
//! Parsed expressions borrow their text from the program. Evaluation errors and compiled nodes
//! outlive that text, so they hold a [`Location`] instead: the same position data with the
//! fragment reduced to its byte length.

use nom::Slice;

use std::fmt;

use crate::Error;

/// Parser input: program text tracked by `nom_locate`.
pub type InputSpan<'a> = nom_locate::LocatedSpan<&'a str, ()>;
/// Result of a parser over [`InputSpan`].
pub type NomResult<'a, T> = nom::IResult<InputSpan<'a>, T, Error<'a>>;

/// Position of a fragment in a Rapids program, with an attached payload.
///
/// Unlike [`InputSpan`], the fragment is not a window into the rest of the program,
/// so it can be swapped for its length when the program text goes away.
#[derive(Debug, Clone, Copy)]
pub struct LocatedSpan<Span, T = ()> {
    offset: usize,
    line: u32,
    column: usize,
    fragment: Span,

    /// Payload attached to the span, e.g. a parsed expression or an error kind.
    pub extra: T,
}

impl<Span: PartialEq, T> PartialEq for LocatedSpan<Span, T> {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.line == other.line && self.fragment == other.fragment
    }
}

impl<Span, T> LocatedSpan<Span, T> {
    /// Byte offset of the fragment in the program. Starts at 0.
    pub fn location_offset(&self) -> usize {
        self.offset
    }

    /// Line of the fragment start. Starts at 1.
    pub fn location_line(&self) -> u32 {
        self.line
    }

    /// Column of the fragment start. Starts at 1.
    pub fn get_column(&self) -> usize {
        self.column
    }

    /// Fragment covered by the span.
    pub fn fragment(&self) -> &Span {
        &self.fragment
    }

    /// Replaces the payload, keeping the position.
    pub fn map_extra<U>(self, map_fn: impl FnOnce(T) -> U) -> LocatedSpan<Span, U> {
        LocatedSpan {
            offset: self.offset,
            line: self.line,
            column: self.column,
            fragment: self.fragment,
            extra: map_fn(self.extra),
        }
    }
}

impl<Span: Copy, T> LocatedSpan<Span, T> {
    /// Copies the position with a new payload.
    pub fn copy_with_extra<U>(&self, value: U) -> LocatedSpan<Span, U> {
        LocatedSpan {
            offset: self.offset,
            line: self.line,
            column: self.column,
            fragment: self.fragment,
            extra: value,
        }
    }

    /// Copies the position without the payload.
    pub fn with_no_extra(&self) -> LocatedSpan<Span> {
        self.copy_with_extra(())
    }
}

/// Fragment of program text borrowed from the parser input.
pub type Spanned<'a, T = ()> = LocatedSpan<&'a str, T>;

impl<'a, T> Spanned<'a, T> {
    pub(crate) fn new(span: InputSpan<'a>, extra: T) -> Self {
        Self {
            offset: span.location_offset(),
            line: span.location_line(),
            column: span.get_column(),
            fragment: *span.fragment(),
            extra,
        }
    }
}

impl<'a> Spanned<'a> {
    /// Spans `range` of the program `code`. Used mostly in tests.
    pub fn from_str<R>(code: &'a str, range: R) -> Self
    where
        InputSpan<'a>: Slice<R>,
    {
        Self::new(InputSpan::new(code).slice(range), ())
    }
}

/// Fragment of a Rapids program: either the text itself or only its byte length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CodeFragment<'a> {
    /// Borrowed program text.
    Str(&'a str),
    /// Byte length of text that is no longer available.
    Stripped(usize),
}

impl CodeFragment<'_> {
    /// Drops the borrowed text, keeping its length.
    pub fn strip(self) -> CodeFragment<'static> {
        match self {
            Self::Str(string) => CodeFragment::Stripped(string.len()),
            Self::Stripped(len) => CodeFragment::Stripped(len),
        }
    }
}

/// Span whose fragment may already be stripped.
pub type MaybeSpanned<'a, T = ()> = LocatedSpan<CodeFragment<'a>, T>;

/// Position of an expression kept by compiled nodes, closures and evaluation errors.
pub type Location = MaybeSpanned<'static>;

impl<'a> MaybeSpanned<'a> {
    /// Spans `range` of the program `code`. Used mostly in tests.
    pub fn from_str<R>(code: &'a str, range: R) -> Self
    where
        InputSpan<'a>: Slice<R>,
    {
        Spanned::from_str(code, range).into()
    }
}

impl<'a, T> From<Spanned<'a, T>> for MaybeSpanned<'a, T> {
    fn from(value: Spanned<'a, T>) -> Self {
        LocatedSpan {
            offset: value.offset,
            line: value.line,
            column: value.column,
            fragment: CodeFragment::Str(value.fragment),
            extra: value.extra,
        }
    }
}

/// Formats as `line:column`, the prefix used in evaluation error messages.
impl<T> fmt::Display for MaybeSpanned<'_, T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.line, self.column)
    }
}

/// Conversion into a form that does not borrow program text.
pub trait StripCode {
    /// Type without borrows of the program.
    type Stripped: 'static;

    /// Replaces borrowed fragments with their lengths.
    fn strip_code(&self) -> Self::Stripped;
}

impl<T: Clone + 'static> StripCode for MaybeSpanned<'_, T> {
    type Stripped = MaybeSpanned<'static, T>;

    fn strip_code(&self) -> Self::Stripped {
        LocatedSpan {
            offset: self.offset,
            line: self.line,
            column: self.column,
            fragment: self.fragment.strip(),
            extra: self.extra.clone(),
        }
    }
}

impl<T: Clone + 'static> StripCode for Spanned<'_, T> {
    type Stripped = MaybeSpanned<'static, T>;

    fn strip_code(&self) -> Self::Stripped {
        MaybeSpanned::from(self.clone()).strip_code()
    }
}

/// Span of the text consumed by a parser that started at `input` and stopped at `rest`.
pub(crate) fn consumed<'a>(input: InputSpan<'a>, rest: InputSpan<'a>) -> Spanned<'a> {
    let len = rest.location_offset() - input.location_offset();
    Spanned {
        offset: input.location_offset(),
        line: input.location_line(),
        column: input.get_column(),
        fragment: &input.fragment()[..len],
        extra: (),
    }
}

/// Attaches the consumed span to the output of `parser`.
pub(crate) fn with_span<'a, O>(
    mut parser: impl FnMut(InputSpan<'a>) -> NomResult<'a, O>,
) -> impl FnMut(InputSpan<'a>) -> NomResult<'a, Spanned<'a, O>> {
    move |input: InputSpan<'a>| {
        parser(input).map(|(rest, output)| (rest, consumed(input, rest).copy_with_extra(output)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stripped_location_keeps_position() {
        let code = "(= x 1)\n(sum [0:x])";
        let span = Spanned::from_str(code, 13..18);
        assert_eq!(*span.fragment(), "[0:x]");

        let location = span.strip_code();
        assert_eq!(location.location_offset(), 13);
        assert_eq!(location.location_line(), 2);
        assert_eq!(location.get_column(), 6);
        assert_eq!(*location.fragment(), CodeFragment::Stripped(5));
        assert_eq!(location.to_string(), "2:6");
        assert_eq!(location, Location::from_str(code, 13..18).strip_code());
    }

    #[test]
    fn span_of_consumed_input() {
        let input = InputSpan::new("(rows data [0:2])");
        let rest = input.slice(6..);
        let span = consumed(input, rest).copy_with_extra("rows");
        assert_eq!(*span.fragment(), "(rows ");
        assert_eq!(span.extra, "rows");
        assert_eq!(span.with_no_extra(), Spanned::from_str("(rows data [0:2])", ..6));
    }
}
