//! Scenario 3 — ambiguous instance: two `instance Eq Int` blocks register
//! without complaint (coherence here is checked at discharge time only, per
//! `faxc_sem::classes`'s own module doc), but discharging an `Eq Int`
//! predicate against them finds two matching instances instead of one.
//!
//! ```text
//! trait Eq { fn eq(self, other: Self) -> Bool; }
//! impl Eq for Int { fn eq(self, other: Self) -> Bool { true } }
//! impl Eq for Int { fn eq(self, other: Self) -> Bool { true } }
//! fn main() -> Int { 0 }
//! ```
//!
//! `ClassError` carries no span, so there's no "both locations cited"
//! message to assert on the way the scenario's origin framed it — what's
//! checked is the implemented half: the discharge fails with
//! `AmbiguousInstance` reporting exactly 2 candidates.

use super::support::*;
use faxc_par::ast::*;
use faxc_sem::{ClassError, ClassPredicate};
use faxc_util::{DefIdGenerator, Handler};

fn eq_trait() -> TraitItem {
    TraitItem {
        name: sym("Eq"),
        generics: vec![],
        items: vec![TraitMember::Method(FnSig {
            name: sym("eq"),
            generics: vec![],
            params: vec![param("self", "Int"), param("other", "Int")],
            ret_type: Some(named_ty("Bool")),
        })],
        supertraits: vec![],
        visibility: Visibility::Private,
    }
}

fn eq_impl_for_int() -> ImplItem {
    ImplItem {
        generics: vec![],
        trait_ref: Some(named_ty("Eq")),
        self_ty: named_ty("Int"),
        items: vec![ImplMember::Method(fn_item(
            "eq",
            vec![param("self", "Int"), param("other", "Int")],
            "Bool",
            Expr::Literal(Literal::Bool(true)),
        ))],
    }
}

#[test]
fn two_instances_for_the_same_head_are_ambiguous_at_discharge() {
    let items = vec![
        Item::Trait(eq_trait()),
        Item::Impl(eq_impl_for_int()),
        Item::Impl(eq_impl_for_int()),
        Item::Fn(fn_item("main", vec![], "Int", int_lit(0))),
    ];

    let def_ids = DefIdGenerator::new();
    let mut handler = Handler::new();
    let module = faxc_sem::analyze_program(&items, &def_ids, &mut handler).expect("analysis runs");
    assert!(!handler.has_errors(), "registering two overlapping instances isn't itself an error: {:?}", handler.diagnostics());

    let predicate = ClassPredicate::new(sym("Eq"), vec![faxc_sem::Type::Id(sym("Int"))]);
    match module.classes.discharge(&predicate) {
        Err(ClassError::AmbiguousInstance(_, count)) => assert_eq!(count, 2),
        other => panic!("expected AmbiguousInstance(_, 2), got {:?}", other),
    }
}
