//! Scenario 4 — integer overload: `match (3 :: Int) { 1 => "a", 2 => "b",
//! c => "c" }`'s irrefutable last clause makes the match exhaustive despite
//! the two literal arms in front of it not covering every `Int`.
//!
//! ```text
//! fn classify() -> String { match 3 { 1 => "a", 2 => "b", c => "c" } }
//! fn main() -> String { classify() }
//! ```
//!
//! There's no interpreter in this pipeline (the backend emits LLVM IR;
//! running it is out of scope here), so the observable stdout `c\n` the
//! original scenario names can't be checked directly — this asserts the
//! exhaustiveness-checker outcome that makes producing it possible: no
//! non-exhaustive/redundant-arm diagnostic is raised.

use super::support::*;
use faxc_par::ast::*;
use faxc_util::{DefIdGenerator, Handler};

#[test]
fn irrefutable_last_clause_is_exhaustive() {
    let match_expr = Expr::Match(MatchExpr {
        scrutinee: Box::new(int_lit(3)),
        arms: vec![
            MatchArm { pattern: Pattern::Literal(Literal::Int(1)), guard: None, body: Expr::Literal(Literal::String(sym("a"))) },
            MatchArm { pattern: Pattern::Literal(Literal::Int(2)), guard: None, body: Expr::Literal(Literal::String(sym("b"))) },
            MatchArm { pattern: Pattern::Ident(sym("c"), Mutability::Immutable), guard: None, body: Expr::Literal(Literal::String(sym("c"))) },
        ],
    });
    let classify_fn = fn_item("classify", vec![], "String", match_expr);
    let main_fn = fn_item("main", vec![], "String", call("classify", vec![]));
    let items = vec![Item::Fn(classify_fn), Item::Fn(main_fn)];

    let def_ids = DefIdGenerator::new();
    let mut handler = Handler::new();
    let _module = faxc_sem::analyze_program(&items, &def_ids, &mut handler).expect("analysis runs");

    assert!(!handler.has_errors(), "expected no diagnostics, got: {:?}", handler.diagnostics());
}
