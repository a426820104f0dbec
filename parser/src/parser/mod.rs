//! Parsers implemented with the help of `nom`.
//!
//! The grammar is LL(1): the production is selected by the first non-whitespace char,
//! so parsers never backtrack and all errors are reported as failures.

use nom::{bytes::complete::tag, character::complete::char as tag_char, Err as NomErr, Slice};

mod helpers;
#[cfg(test)]
mod tests;

pub use self::helpers::is_valid_variable_name;
use self::helpers::{
    colon_sep, list_sep, number, number_literal, starts_number, string_literal, token, ws,
};
use crate::{
    grammars::{Features, Grammar},
    num_list::{NumClause, NumList},
    spans::{consumed, with_span},
    Context, Error, ErrorKind, Expr, FnDefinition, InputSpan, NomResult, Spanned, SpannedExpr,
};

fn into_error<'a>(input: InputSpan<'a>) -> impl FnOnce(NomErr<Error<'a>>) -> Error<'a> + 'a {
    move |err| match err {
        NomErr::Error(err) | NomErr::Failure(err) => err,
        NomErr::Incomplete(_) => Error::new(input, ErrorKind::UnexpectedTerm { context: None }),
    }
}

/// Parses a single expression surrounded by optional whitespace.
pub(crate) fn parse_expr<G: Grammar>(input: InputSpan<'_>) -> Result<SpannedExpr<'_>, Error<'_>> {
    let (rest, parsed) = expr::<G>(input).map_err(into_error(input))?;
    let (rest, _) = ws(rest).map_err(into_error(rest))?;
    if !rest.fragment().is_empty() {
        return Err(Error::new(rest, ErrorKind::Leftovers));
    }
    Ok(parsed)
}

/// Parses a sequence of whitespace-separated expressions.
pub(crate) fn parse_exprs<G: Grammar>(
    mut input: InputSpan<'_>,
) -> Result<Vec<SpannedExpr<'_>>, Error<'_>> {
    let mut exprs = vec![];
    loop {
        let (rest, _) = ws(input).map_err(into_error(input))?;
        if rest.fragment().is_empty() {
            return Ok(exprs);
        }
        let (rest, parsed) = expr::<G>(rest).map_err(into_error(rest))?;
        exprs.push(parsed);
        input = rest;
    }
}

/// Expression, dispatched by its first non-whitespace char.
fn expr<G: Grammar>(input: InputSpan<'_>) -> NomResult<'_, SpannedExpr<'_>> {
    let (input, _) = ws(input)?;
    match input.fragment().chars().next() {
        Some('(') => application::<G>(input),
        Some('{') => {
            let (rest, def) = with_span(fn_definition::<G>)(input)?;
            Ok((rest, def.map_extra(Expr::FnDefinition)))
        }
        Some('[') => with_span(list::<G>)(input),
        Some('"' | '\'') => {
            let (rest, string) = with_span(string_literal::<G>)(input)?;
            Ok((rest, string.map_extra(Expr::Str)))
        }
        Some(')' | '}' | ']') | None => Err(NomErr::Failure(Error::unexpected(input, Context::Expr))),
        Some(_) if starts_number(input) => {
            let (rest, number) = with_span(number_literal)(input)?;
            Ok((rest, number.map_extra(Expr::Number)))
        }
        Some(_) => {
            let (rest, name) = token(input)
                .map_err(|_| NomErr::Failure(Error::unexpected(input, Context::Expr)))?;
            Ok((rest, Spanned::new(name, Expr::Id)))
        }
    }
}

/// Function application `(op args..)`, optionally followed by the `->name` suffix.
fn application<G: Grammar>(input: InputSpan<'_>) -> NomResult<'_, SpannedExpr<'_>> {
    let (rest, applied) = with_span(application_body::<G>)(input)?;
    let applied = applied.map_extra(|(op, args)| Expr::Apply { op, args });

    if !G::FEATURES.contains(Features::TMP_ASSIGN_SUFFIX) {
        return Ok((rest, applied));
    }
    let Ok((after_arrow, _)) = tag::<_, _, Error<'_>>("->")(rest) else {
        return Ok((rest, applied));
    };
    let (rest, name) = token(after_arrow)
        .map_err(|_| NomErr::Failure(Error::unexpected(after_arrow, Context::Identifier)))?;
    let name = Spanned::new(name, ());
    let assignment = Expr::TmpAssign {
        name,
        value: Box::new(applied),
    };
    Ok((rest, consumed(input, rest).copy_with_extra(assignment)))
}

type ApplicationParts<'a> = (Box<SpannedExpr<'a>>, Vec<SpannedExpr<'a>>);

fn application_body<G: Grammar>(input: InputSpan<'_>) -> NomResult<'_, ApplicationParts<'_>> {
    let (after_paren, _) = tag_char('(')(input)?;
    let (rest, _) = ws(after_paren)?;
    if rest.fragment().starts_with(')') {
        let span = consumed(input, rest.slice(1..));
        return Err(NomErr::Failure(Error::from_parts(
            span,
            ErrorKind::EmptyApplication,
        )));
    }

    let (mut input, op) = expr::<G>(rest)?;
    if !op.extra.is_callable() {
        let kind = ErrorKind::NotCallable(op.extra.ty());
        return Err(NomErr::Failure(Error::from_parts(op.with_no_extra(), kind)));
    }

    let mut args = vec![];
    loop {
        let (rest, _) = ws(input)?;
        match rest.fragment().chars().next() {
            Some(')') => return Ok((rest.slice(1..), (Box::new(op), args))),
            None => return Err(NomErr::Failure(Error::unexpected(rest, Context::Application))),
            Some(_) => {
                let (rest, arg) = expr::<G>(rest)?;
                args.push(arg);
                input = rest;
            }
        }
    }
}

/// Function definition `{params . body}`.
fn fn_definition<G: Grammar>(input: InputSpan<'_>) -> NomResult<'_, FnDefinition<'_>> {
    let (mut input, _) = tag_char('{')(input)?;
    let mut params: Vec<Spanned<'_>> = vec![];
    loop {
        let (rest, _) = ws(input)?;
        match rest.fragment().chars().next() {
            Some('.') => {
                input = rest.slice(1..);
                break;
            }
            None => {
                return Err(NomErr::Failure(Error::unexpected(rest, Context::FnDefinition)));
            }
            Some(_) => {
                let (rest, name) = token(rest).map_err(|_| {
                    NomErr::Failure(Error::unexpected(rest, Context::FnDefinition))
                })?;
                let name = Spanned::new(name, ());
                if !is_valid_variable_name(name.fragment()) {
                    return Err(NomErr::Failure(Error::from_parts(name, ErrorKind::InvalidParam)));
                }
                if params.iter().any(|param| param.fragment() == name.fragment()) {
                    return Err(NomErr::Failure(Error::from_parts(
                        name,
                        ErrorKind::DuplicateParam,
                    )));
                }
                params.push(name);
                input = rest;
            }
        }
    }

    let (rest, body) = expr::<G>(input)?;
    let (rest, _) = ws(rest)?;
    if !rest.fragment().starts_with('}') {
        return Err(NomErr::Failure(Error::unexpected(rest, Context::FnDefinition)));
    }
    let definition = FnDefinition {
        params,
        body: Box::new(body),
    };
    Ok((rest.slice(1..), definition))
}

/// Number or string list. The list type is determined by its first element;
/// `[]` is an empty number list.
fn list<G: Grammar>(input: InputSpan<'_>) -> NomResult<'_, Expr<'_>> {
    let (after_bracket, _) = tag_char('[')(input)?;
    let (rest, _) = ws(after_bracket)?;
    if rest.fragment().starts_with(['"', '\'']) {
        let (rest, items) = string_list_items::<G>(rest)?;
        Ok((rest, Expr::StrList(items)))
    } else {
        let (rest, list) = num_list_items::<G>(rest)?;
        Ok((rest, Expr::NumList(list)))
    }
}

fn string_list_items<G: Grammar>(mut input: InputSpan<'_>) -> NomResult<'_, Vec<String>> {
    let mut items = vec![];
    loop {
        let (rest, _) = ws(input)?;
        match rest.fragment().chars().next() {
            Some(']') => return Ok((rest.slice(1..), items)),
            Some('"' | '\'') => {
                let (rest, item) = string_literal::<G>(rest)?;
                items.push(item);
                let (rest, _) = list_sep(rest)?;
                input = rest;
            }
            _ => return Err(NomErr::Failure(Error::unexpected(rest, Context::List))),
        }
    }
}

fn num_list_items<G: Grammar>(mut input: InputSpan<'_>) -> NomResult<'_, NumList> {
    let start = input;
    let mut clauses = vec![];
    loop {
        let (rest, _) = ws(input)?;
        match rest.fragment().chars().next() {
            Some(']') => {
                let list = NumList::from_clauses(&clauses, G::FEATURES.range_syntax())
                    .map_err(|err| {
                        let span = consumed(start, rest);
                        NomErr::Failure(Error::from_parts(span, ErrorKind::NumList(err)))
                    })?;
                return Ok((rest.slice(1..), list));
            }
            None => return Err(NomErr::Failure(Error::unexpected(rest, Context::List))),
            Some(_) => {
                let (rest, clause) = num_clause(rest).map_err(|err| match err {
                    NomErr::Error(_) => NomErr::Failure(Error::unexpected(rest, Context::List)),
                    other => other,
                })?;
                clauses.push(clause);
                let (rest, _) = list_sep(rest)?;
                input = rest;
            }
        }
    }
}

/// Number list clause: `base`, `base:second` or `base:second:stride`.
fn num_clause(input: InputSpan<'_>) -> NomResult<'_, NumClause> {
    let (rest, base) = number(input)?;
    let Ok((rest, second)) = colon_sep(rest).and_then(|(rest, _)| number(rest)) else {
        return Ok((rest, NumClause { base, second: None, stride: None }));
    };
    let Ok((rest, stride)) = colon_sep(rest).and_then(|(rest, _)| number(rest)) else {
        return Ok((rest, NumClause { base, second: Some(second), stride: None }));
    };
    let clause = NumClause {
        base,
        second: Some(second),
        stride: Some(stride),
    };
    Ok((rest, clause))
}
