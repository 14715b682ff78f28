//! Scenario 6 — occurs check: equating a type variable `a` with `a -> a`
//! is an infinite type, and the error names the offending variable.
//!
//! Every `ast::Param`/`ast::FnItem` carries a concrete `ast::Type` (there's
//! no unannotated-parameter surface form that reaches the inferencer as a
//! bare fresh variable — `ast_type_to_ty` maps anything it doesn't
//! recognize to a concrete `Int`), so a self-application program built from
//! the surface grammar type-mismatches on "not a function" rather than
//! reaching the occurs check. This drives `faxc_sem::unify::unify` directly
//! with the same variable-against-itself shape the inferencer would build
//! internally for `a ~ a -> a`, the way `faxc-sem/src/unify.rs`'s own
//! `occurs_check_rejects_infinite_type` test does.

use faxc_sem::types::Type;
use faxc_sem::unify::unify;
use faxc_sem::TypeError;
use faxc_util::Symbol;
use std::collections::BTreeSet;

#[test]
fn equating_a_variable_with_its_own_arrow_type_is_infinite() {
    let a = Symbol::intern("a");
    let var_a = Type::Var(a, BTreeSet::new());
    let a_to_a = Type::arrow(var_a.clone(), var_a.clone());

    let result = unify(&var_a, &a_to_a);
    match result {
        Err(TypeError::InfiniteType { var, .. }) => assert_eq!(var, a),
        other => panic!("expected InfiniteType, got {:?}", other),
    }
}
