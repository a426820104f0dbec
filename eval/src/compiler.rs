//! Transformation of the parsed AST into runtime [`Node`]s.

use std::sync::Arc;

use crate::{
    node::{FnDef, Node, NodeKind},
    prims::Primitives,
};
use rapids_parser::{Expr, Location, SpannedExpr, StripCode};

/// Compiler of parsed expressions into runtime [`Node`]s.
///
/// Identifiers naming primitives are resolved during compilation unless they are shadowed
/// by parameters of an enclosing function definition. All other identifiers are resolved
/// during evaluation. The `(expr)->name` syntax is desugared into an application
/// of the `tmp=` primitive.
#[derive(Debug)]
pub struct Compiler<'p> {
    primitives: &'p Primitives,
    bound: Vec<String>,
}

impl<'p> Compiler<'p> {
    const TMP_ASSIGN: &'static str = "tmp=";

    /// Creates a compiler resolving primitives from the provided registry.
    pub fn new(primitives: &'p Primitives) -> Self {
        Self {
            primitives,
            bound: vec![],
        }
    }

    /// Compiles a parsed expression.
    pub fn compile(&mut self, expr: &SpannedExpr<'_>) -> Node {
        let location = Some(Self::location(expr));
        let node: Node = match &expr.extra {
            Expr::Number(value) => Node::num(*value),
            Expr::Str(value) => Node::str(value.as_str()),
            Expr::Id => self.compile_id(expr.fragment()),
            Expr::NumList(list) => NodeKind::NumList(list.clone()).into(),
            Expr::StrList(items) => NodeKind::StrList(items.clone()).into(),

            Expr::FnDefinition(def) => {
                let params: Vec<String> = def.param_names().map(str::to_owned).collect();
                let bound_len = self.bound.len();
                self.bound.extend(params.iter().cloned());
                let body = self.compile(&def.body);
                self.bound.truncate(bound_len);

                let def = FnDef::new(params, body).with_location(location.clone());
                NodeKind::FnDef(Arc::new(def)).into()
            }

            Expr::Apply { op, args } => {
                let op = self.compile(op);
                let args = args.iter().map(|arg| self.compile(arg)).collect();
                Node::apply(op, args)
            }

            Expr::TmpAssign { name, value } => {
                let op = self.compile_id(Self::TMP_ASSIGN).with_location(location.clone());
                let name = Node::id(*name.fragment()).with_location(Some(name.strip_code()));
                let value = self.compile(value);
                Node::apply(op, vec![name, value])
            }

            _ => unreachable!("unknown expression type"),
        };
        node.with_location(location)
    }

    fn compile_id(&self, name: &str) -> Node {
        let is_bound = self.bound.iter().any(|bound| bound == name);
        match self.primitives.primitive(name) {
            Some(primitive) if !is_bound => NodeKind::Primitive(Arc::clone(primitive)).into(),
            _ => Node::id(name),
        }
    }

    fn location(expr: &SpannedExpr<'_>) -> Location {
        expr.with_no_extra().strip_code()
    }
}
