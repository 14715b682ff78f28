//! Scenario 5 — closure capture: a closure built inside `let n = 42 in (fn()
//! n)` captures exactly one variable (`n`) from its enclosing scope.
//!
//! ```text
//! fn make() -> Int {
//!     let n = 42;
//!     let f = || -> Int { n };
//!     f()
//! }
//! fn main() -> Int { make() }
//! ```
//!
//! There's no interpreter here to observe the call actually returning `42`;
//! what's checked is the structural guarantee closure conversion is supposed
//! to provide — the lowered closure's environment tuple holds the closure's
//! own function pointer plus exactly one captured slot, per
//! `faxc_mir::lower::hir_to_mir::lower_one_function`'s `env_ty` construction.

use super::support::*;
use faxc_par::ast::*;
use faxc_sem::Type;
use faxc_util::{DefIdGenerator, Handler, Span};

#[test]
fn closure_environment_has_one_captured_slot() {
    let closure = Expr::Closure(ClosureExpr {
        params: vec![],
        ret_type: Some(named_ty("Int")),
        body: Box::new(path_expr("n")),
        move_kw: false,
    });
    let body = Block {
        stmts: vec![
            Stmt::Let(LetStmt { pattern: Pattern::Ident(sym("n"), Mutability::Immutable), ty: None, init: Some(int_lit(42)) }),
            Stmt::Let(LetStmt { pattern: Pattern::Ident(sym("f"), Mutability::Immutable), ty: None, init: Some(closure) }),
        ],
        trailing: Some(Box::new(call("f", vec![]))),
        span: Span::default(),
    };
    let make_fn = FnItem {
        name: sym("make"),
        generics: vec![],
        params: vec![],
        ret_type: Some(named_ty("Int")),
        body,
        visibility: Visibility::Private,
        span: Span::default(),
        async_kw: false,
    };
    let main_fn = fn_item("main", vec![], "Int", call("make", vec![]));
    let items = vec![Item::Fn(make_fn), Item::Fn(main_fn)];

    let def_ids = DefIdGenerator::new();
    let mut handler = Handler::new();
    let module = faxc_sem::analyze_program(&items, &def_ids, &mut handler).expect("analysis runs");
    assert!(!handler.has_errors(), "no diagnostics expected: {:?}", handler.diagnostics());

    let translation_map = faxc_mir::Specializer::new(&module).run().expect("specialization succeeds");
    let program = faxc_mir::LowerDriver::new(&def_ids).lower_program(&translation_map).expect("lowering succeeds");

    let lambda = program
        .functions
        .iter()
        .find(|f| f.name.as_str().contains("::lambda"))
        .expect("closure conversion produced a lambda function");
    let env_local = lambda.arg_locals[1];
    match &lambda.locals[env_local].ty {
        Type::Tuple(elems) => assert_eq!(elems.len(), 2, "own fn pointer + one captured slot"),
        other => panic!("expected a tuple environment, got {:?}", other),
    }
}
