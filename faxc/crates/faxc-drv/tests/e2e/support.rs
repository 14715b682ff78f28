//! Shared `faxc_par::ast` builders for the end-to-end scenarios.
//!
//! These stand in for a working parser: every scenario needs the same
//! handful of node shapes (a typed top-level `fn`, a path expression, a
//! call), so building them once here keeps each scenario file down to the
//! program that actually matters for its assertion.

use faxc_par::ast::*;
use faxc_util::{Span, Symbol};

pub fn sym(s: &str) -> Symbol {
    Symbol::intern(s)
}

pub fn path(name: &str) -> Path {
    Path { segments: vec![PathSegment { ident: sym(name), args: None }] }
}

pub fn path_expr(name: &str) -> Expr {
    Expr::Path(path(name))
}

pub fn named_ty(name: &str) -> Type {
    Type::Path(path(name))
}

pub fn int_lit(n: i64) -> Expr {
    Expr::Literal(Literal::Int(n))
}

pub fn param(name: &str, ty_name: &str) -> Param {
    Param { name: sym(name), ty: named_ty(ty_name), mutable: false }
}

pub fn call(func_name: &str, args: Vec<Expr>) -> Expr {
    Expr::Call(CallExpr { func: Box::new(path_expr(func_name)), args, span: Span::default() })
}

pub fn block(stmts: Vec<Stmt>, trailing: Expr) -> Block {
    Block { stmts, trailing: Some(Box::new(trailing)), span: Span::default() }
}

/// A single-expression function body: `fn name(params) -> ret { trailing }`.
pub fn fn_item(name: &str, params: Vec<Param>, ret_ty: &str, trailing: Expr) -> FnItem {
    FnItem {
        name: sym(name),
        generics: vec![],
        params,
        ret_type: Some(named_ty(ret_ty)),
        body: block(vec![], trailing),
        visibility: Visibility::Private,
        span: Span::default(),
        async_kw: false,
    }
}
