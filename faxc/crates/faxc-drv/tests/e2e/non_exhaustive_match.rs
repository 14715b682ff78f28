//! Scenario 2 — non-exhaustive match: a `Maybe`-shaped enum matched against
//! only its `Just` arm is missing the `Nothing` case, and the witness the
//! exhaustiveness checker reports is exactly `Nothing`.
//!
//! ```text
//! enum Maybe { Just(Int), Nothing }
//! fn unwrap_or_zero(o: Maybe) -> Int { match o { Just(n) => n } }
//! ```
//!
//! `Analyzer::analyze`'s own exhaustiveness pass (`faxc_sem::lib::check_module_matches`)
//! keys its scrutinee type off `Expr::ty()`, which for a bare `Expr::Var` is
//! always `Type::unit()` (the HIR doesn't thread the inferencer's resolved
//! type back onto variable reads) — so driving this scenario through
//! `analyze_program` can't exercise the real check with a variable or
//! constructor-reference scrutinee. This exercises the same
//! `Pattern::universe_of`/`check_match` pair `check_module_matches` calls,
//! the way `faxc-sem/src/patterns.rs`'s own `nested_ctor_field_narrowing`
//! test does.

use faxc_sem::{check_match, DataConstructor, Pattern, Type};
use faxc_util::Symbol;

fn sym(s: &str) -> Symbol {
    Symbol::intern(s)
}

#[test]
fn missing_nothing_arm_is_reported_as_the_witness() {
    let ctors = vec![
        DataConstructor { ctor_name: sym("Just"), arg_types: vec![Type::Id(sym("Int"))], parent_type: sym("Maybe"), tag: 0 },
        DataConstructor { ctor_name: sym("Nothing"), arg_types: vec![], parent_type: sym("Maybe"), tag: 1 },
    ];
    let universe = Pattern::universe_of(&Type::Id(sym("Maybe")), &ctors);
    let arms = vec![Pattern::Ctor(sym("Just"), vec![Pattern::AllOf(Type::Id(sym("Int")))])];

    let result = check_match(universe, &arms);
    assert!(result.redundant_arms.is_empty());
    assert_eq!(result.missing_example.as_deref(), Some("Nothing"));
}
