use std::ops::Range;

use crate::{
    grammars::{Features, Grammar, Rapids},
    Error, Expr, Spanned,
};


/// Grammar with the counted `base:count:stride` number list ranges.
#[derive(Debug)]
struct CountedGrammar;

impl Grammar for CountedGrammar {
    const FEATURES: Features = Features::TMP_ASSIGN_SUFFIX
        .union(Features::STRING_ESCAPES)
        .union(Features::COUNTED_RANGES);
}

fn sp<'a, T>(code: &'a str, range: Range<usize>, value: T) -> Spanned<'a, T> {
    Spanned::from_str(code, range).copy_with_extra(value)
}

fn parse(code: &str) -> Expr<'_> {
    Rapids::parse_expr(code).unwrap().extra
}

fn parse_err(code: &str) -> Error<'_> {
    Rapids::parse_expr(code).unwrap_err()
}
