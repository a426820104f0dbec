//! Parsing helpers.

use anyhow::anyhow;
use nom::{
    bytes::complete::{take_while, take_while1},
    character::complete::{char as tag_char, one_of},
    combinator::{opt, recognize},
    error::context,
    sequence::{delimited, preceded, tuple},
    Err as NomErr, Parser as _, Slice,
};

use crate::{
    grammars::{Features, Grammar},
    Context, Error, ErrorKind, InputSpan, NomResult,
};

/// Chars that cannot be a part of an identifier token.
const NON_TOKEN_CHARS: &str = "({[]})\\\"'";

/// Whitespace.
pub(super) fn ws(input: InputSpan<'_>) -> NomResult<'_, InputSpan<'_>> {
    take_while(char::is_whitespace)(input)
}

/// Whitespace with an optional comma, which separates list elements.
pub(super) fn list_sep(input: InputSpan<'_>) -> NomResult<'_, InputSpan<'_>> {
    recognize(tuple((ws, opt(tag_char(',')), ws)))(input)
}

/// `:` separating numbers in a number list clause.
pub(super) fn colon_sep(input: InputSpan<'_>) -> NomResult<'_, char> {
    delimited(ws, tag_char(':'), ws)(input)
}

pub(super) fn is_token_char(ch: char) -> bool {
    !ch.is_whitespace() && !NON_TOKEN_CHARS.contains(ch)
}

/// Identifier token, like `x`, `+`, `tmp=` or `%frame.hex`.
pub(super) fn token(input: InputSpan<'_>) -> NomResult<'_, InputSpan<'_>> {
    take_while1(is_token_char)(input)
}

/// Checks if the provided string is a valid variable name: a non-empty sequence
/// of alphanumeric chars, `_` and `$` that does not start with a digit.
pub fn is_valid_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '$')
}

/// Checks whether a number literal may start at the beginning of `input`.
pub(super) fn starts_number(input: InputSpan<'_>) -> bool {
    let mut chars = input.fragment().chars();
    match chars.next() {
        Some('#') => true,
        Some(ch) if ch.is_ascii_digit() => true,
        Some('-') => chars.next().map_or(false, |ch| ch.is_ascii_digit()),
        _ => false,
    }
}

/// Decimal number, like `1`, `-2.5` or `3e-4`.
pub(super) fn number(input: InputSpan<'_>) -> NomResult<'_, f64> {
    let is_digit = |ch: char| ch.is_ascii_digit();
    let fraction = preceded(tag_char('.'), take_while1(is_digit));
    let exponent = tuple((one_of("eE"), opt(one_of("+-")), take_while1(is_digit)));
    let literal = recognize(tuple((
        opt(tag_char('-')),
        take_while1(is_digit),
        opt(fraction),
        opt(exponent),
    )));

    let parsed: NomResult<'_, InputSpan<'_>> =
        context(Context::Number.to_str(), literal).parse(input);
    let (rest, literal) = parsed?;
    match literal.fragment().parse::<f64>() {
        Ok(value) => Ok((rest, value)),
        Err(err) => Err(NomErr::Failure(Error::new(
            literal,
            ErrorKind::Number(anyhow!(err)),
        ))),
    }
}

/// Number literal in an expression position. May be prefixed with `#` and must be followed
/// by a delimiter.
pub(super) fn number_literal(input: InputSpan<'_>) -> NomResult<'_, f64> {
    let (rest, value) = preceded(opt(tag_char('#')), number)(input).map_err(|err| match err {
        NomErr::Error(_) => NomErr::Failure(Error::unexpected(input, Context::Number)),
        other => other,
    })?;

    match rest.fragment().chars().next() {
        Some(ch) if is_token_char(ch) => Err(NomErr::Failure(Error::unexpected(
            rest,
            Context::Number,
        ))),
        _ => Ok((rest, value)),
    }
}

/// String literal enclosed in `"` or `'` quotes.
pub(super) fn string_literal<G: Grammar>(input: InputSpan<'_>) -> NomResult<'_, String> {
    let mut chars = input.fragment().char_indices();
    let quote = match chars.next() {
        Some((_, quote @ ('"' | '\''))) => quote,
        _ => return Err(NomErr::Error(Error::unexpected(input, Context::String))),
    };
    let escapes = G::FEATURES.contains(Features::STRING_ESCAPES);

    let mut value = String::new();
    while let Some((pos, ch)) = chars.next() {
        if ch == quote {
            return Ok((input.slice(pos + 1..), value));
        }
        if ch != '\\' || !escapes {
            value.push(ch);
            continue;
        }

        let escaped = match chars.next() {
            Some((_, escaped)) => escaped,
            None => break,
        };
        let resolved = match escaped {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'f' => '\u{c}',
            'b' => '\u{8}',
            '0' => '\0',
            '\'' | '"' | '\\' => escaped,
            'x' | 'u' | 'U' => {
                let digits = match escaped {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let start = pos + 2;
                let end = start + digits;
                let hex = input.fragment().get(start..end).filter(|hex| {
                    hex.len() == digits && hex.chars().all(|ch| ch.is_ascii_hexdigit())
                });
                let Some(hex) = hex else {
                    let span = input.slice(pos..start.min(input.fragment().len()));
                    return Err(NomErr::Failure(Error::new(
                        span,
                        ErrorKind::InvalidEscape(escaped),
                    )));
                };
                // `hex` consists of at most 8 hex digits, so it always fits into `u32`.
                let code = u32::from_str_radix(hex, 16).unwrap_or(u32::MAX);
                let Some(resolved) = char::from_u32(code) else {
                    let span = input.slice(pos..end);
                    return Err(NomErr::Failure(Error::new(
                        span,
                        ErrorKind::InvalidCodePoint(code),
                    )));
                };
                for _ in 0..digits {
                    chars.next();
                }
                resolved
            }
            _ => {
                let span = input.slice(pos..pos + 1 + escaped.len_utf8());
                return Err(NomErr::Failure(Error::new(
                    span,
                    ErrorKind::InvalidEscape(escaped),
                )));
            }
        };
        value.push(resolved);
    }

    Err(NomErr::Failure(Error::new(
        input,
        ErrorKind::UnterminatedString,
    )))
}
