//! Edge case tests for faxc-sem

#[cfg(test)]
mod tests {
    use crate::classes::{ClassDecl, ClassEnv, ClassError, InstanceDecl};
    use crate::patterns::{check_match, Pattern, Polarity, ScalarKind, ScalarLit};
    use crate::scope::{RibKind, ScopeTree};
    use crate::types::{ClassPredicate, Scheme, Subst, Type};
    use crate::unify::unify;
    use faxc_util::{DefIdGenerator, Symbol};
    use std::collections::{BTreeSet, HashMap};

    fn sym(s: &str) -> Symbol {
        Symbol::intern(s)
    }

    // ==================== SCOPE TREE TESTS ====================

    /// EDGE CASE: New scope tree
    #[test]
    fn test_edge_new_scope_tree() {
        let tree = ScopeTree::new();
        assert!(tree.resolve(Symbol::intern("nonexistent")).is_none());
    }

    /// EDGE CASE: Enter and exit scope
    #[test]
    fn test_edge_enter_exit_scope() {
        let mut tree = ScopeTree::new();
        tree.enter_scope(RibKind::Block);
        tree.exit_scope();
    }

    /// EDGE CASE: Nested scopes
    #[test]
    fn test_edge_nested_scopes() {
        let mut tree = ScopeTree::new();
        tree.enter_scope(RibKind::Block);
        tree.enter_scope(RibKind::Block);
        tree.enter_scope(RibKind::Block);

        let def_id = DefIdGenerator::new().next();
        tree.add_binding(Symbol::intern("x"), def_id);

        assert!(tree.resolve(Symbol::intern("x")).is_some());

        tree.exit_scope();
        tree.exit_scope();
        tree.exit_scope();

        // Back at root, which never saw the binding.
        assert!(tree.resolve(Symbol::intern("x")).is_none());
    }

    /// EDGE CASE: Shadowing in nested scope
    #[test]
    fn test_edge_shadowing() {
        let mut tree = ScopeTree::new();
        let gen = &mut DefIdGenerator::new();

        let outer_id = gen.next();
        tree.add_binding(Symbol::intern("x"), outer_id);

        tree.enter_scope(RibKind::Block);
        let inner_id = gen.next();
        tree.add_binding(Symbol::intern("x"), inner_id);

        let resolved = tree.resolve(Symbol::intern("x")).unwrap();
        assert_eq!(resolved, inner_id);

        tree.exit_scope();

        let resolved = tree.resolve(Symbol::intern("x")).unwrap();
        assert_eq!(resolved, outer_id);
    }

    /// EDGE CASE: Multiple bindings in same scope
    #[test]
    fn test_edge_multiple_bindings() {
        let mut tree = ScopeTree::new();
        let gen = &mut DefIdGenerator::new();

        tree.add_binding(Symbol::intern("a"), gen.next());
        tree.add_binding(Symbol::intern("b"), gen.next());
        tree.add_binding(Symbol::intern("c"), gen.next());

        assert!(tree.resolve(Symbol::intern("a")).is_some());
        assert!(tree.resolve(Symbol::intern("b")).is_some());
        assert!(tree.resolve(Symbol::intern("c")).is_some());
    }

    /// EDGE CASE: Function scope
    #[test]
    fn test_edge_function_scope() {
        let mut tree = ScopeTree::new();
        tree.enter_scope(RibKind::Function);

        let def_id = DefIdGenerator::new().next();
        tree.add_binding(Symbol::intern("param"), def_id);

        assert!(tree.resolve(Symbol::intern("param")).is_some());
        tree.exit_scope();
    }

    /// EDGE CASE: Loop scope, unlabeled
    #[test]
    fn test_edge_loop_scope() {
        let mut tree = ScopeTree::new();
        tree.enter_scope(RibKind::Loop(None));

        let def_id = DefIdGenerator::new().next();
        tree.add_binding(Symbol::intern("i"), def_id);

        assert!(tree.resolve(Symbol::intern("i")).is_some());
        tree.exit_scope();
    }

    /// EDGE CASE: Loop scope, labeled; the label itself is not a name
    /// binding, so it never resolves through the scope tree.
    #[test]
    fn test_edge_labeled_loop_scope() {
        let mut tree = ScopeTree::new();
        tree.enter_scope(RibKind::Loop(Some(Symbol::intern("'outer"))));
        assert!(tree.resolve(Symbol::intern("'outer")).is_none());
        tree.exit_scope();
    }

    // ==================== TYPE / SUBSTITUTION EDGE CASES ====================

    /// EDGE CASE: A type variable unifies with itself as a no-op.
    #[test]
    fn test_edge_unify_same_var() {
        let v = Type::Var(sym("a"), BTreeSet::new());
        let subst = unify(&v, &v).unwrap();
        assert!(subst.is_empty());
    }

    /// EDGE CASE: Binding a variable to a type that contains it is rejected
    /// by the occurs check rather than looping forever.
    #[test]
    fn test_edge_occurs_check_self_reference() {
        let var = sym("a");
        let inner = Type::Operator(Box::new(Type::Id(sym("List"))), Box::new(Type::Var(var, BTreeSet::new())));
        let result = unify(&Type::Var(var, BTreeSet::new()), &inner);
        assert!(result.is_err());
    }

    /// EDGE CASE: Composing with an empty substitution is a no-op on both
    /// sides.
    #[test]
    fn test_edge_compose_with_empty() {
        let s = Subst::singleton(sym("a"), Type::Id(sym("Int")));
        let empty = Subst::empty();
        assert_eq!(Subst::compose(s.clone(), empty.clone()), s);
        assert_eq!(Subst::compose(empty, s.clone()), s);
    }

    /// EDGE CASE: An empty tuple type is well-formed and equal to itself.
    #[test]
    fn test_edge_empty_tuple() {
        let empty = Type::Tuple(vec![]);
        assert_eq!(empty, Type::Tuple(vec![]));
    }

    /// EDGE CASE: Deeply nested operator types don't blow the stack when
    /// computing free variables.
    #[test]
    fn test_edge_deep_nesting_free_vars() {
        let mut current = Type::Id(sym("Int"));
        for _ in 0..100 {
            current = Type::Operator(Box::new(Type::Id(sym("List"))), Box::new(current));
        }
        assert!(current.free_vars().is_empty());
    }

    /// EDGE CASE: A monomorphic scheme has no quantified variables and
    /// normalizes to itself.
    #[test]
    fn test_edge_monomorphic_scheme_normalizes_stably() {
        let scheme = Scheme::monomorphic(Type::Id(sym("Int")));
        assert!(scheme.is_monomorphic());
        assert_eq!(scheme.normalize().repr(), scheme.repr());
    }

    /// EDGE CASE: Unifying two distinct nominal types fails cleanly.
    #[test]
    fn test_edge_unify_distinct_nominal_types() {
        let result = unify(&Type::Id(sym("Int")), &Type::Id(sym("Bool")));
        assert!(result.is_err());
    }

    // ==================== CLASS ENV EDGE CASES ====================

    /// EDGE CASE: A predicate for an undeclared class fails immediately,
    /// before any instance search happens.
    #[test]
    fn test_edge_unknown_class() {
        let env = ClassEnv::new();
        let pred = ClassPredicate::new(sym("Eq"), vec![Type::Id(sym("Int"))]);
        assert!(matches!(env.discharge(&pred), Err(ClassError::UnknownClass(_))));
    }

    /// EDGE CASE: A class with zero instances reports "no matching
    /// instance", not "ambiguous" or a panic.
    #[test]
    fn test_edge_class_with_no_instances() {
        let mut env = ClassEnv::new();
        env.add_class(ClassDecl {
            name: sym("Show"),
            params: vec![sym("a")],
            superclasses: vec![],
            methods: vec![sym("show")],
        });
        let pred = ClassPredicate::new(sym("Show"), vec![Type::Id(sym("Int"))]);
        assert!(matches!(env.discharge(&pred), Err(ClassError::NoMatchingInstance(_))));
    }

    /// EDGE CASE: Instances distinguish on arity, not just class name.
    #[test]
    fn test_edge_instance_arity_mismatch_is_not_a_match() {
        let mut env = ClassEnv::new();
        env.add_class(ClassDecl {
            name: sym("Convert"),
            params: vec![sym("a"), sym("b")],
            superclasses: vec![],
            methods: vec![sym("convert")],
        });
        env.add_instance(InstanceDecl {
            class_name: sym("Convert"),
            head: vec![Type::Id(sym("Int")), Type::Id(sym("Float"))],
            methods: HashMap::new(),
        });
        let pred = ClassPredicate::new(sym("Convert"), vec![Type::Id(sym("Int"))]);
        assert!(matches!(env.discharge(&pred), Err(ClassError::NoMatchingInstance(_))));
    }

    // ==================== PATTERN LATTICE EDGE CASES ====================

    /// EDGE CASE: `Nothing` absorbs any intersection.
    #[test]
    fn test_edge_nothing_intersect_absorbs() {
        let any = Pattern::AllOf(Type::Id(sym("Int")));
        assert!(Pattern::Nothing.intersect(&any).is_nothing());
    }

    /// EDGE CASE: A single wildcard arm over any universe is always
    /// exhaustive and never redundant.
    #[test]
    fn test_edge_wildcard_is_always_exhaustive() {
        let universe = Pattern::AllOf(Type::Id(sym("Int")));
        let result = check_match(universe, &[Pattern::AllOf(Type::Id(sym("Int")))]);
        assert!(result.missing_example.is_none());
        assert!(result.redundant_arms.is_empty());
    }

    /// EDGE CASE: Two identical wildcard arms flag the second as redundant.
    #[test]
    fn test_edge_duplicate_wildcard_arms() {
        let universe = Pattern::AllOf(Type::Id(sym("Int")));
        let arm = Pattern::AllOf(Type::Id(sym("Int")));
        let result = check_match(universe, &[arm.clone(), arm]);
        assert_eq!(result.redundant_arms, vec![1]);
    }

    /// EDGE CASE: An empty set of excluded scalar literals denotes the whole
    /// universe of that scalar kind.
    #[test]
    fn test_edge_empty_exclude_scalars_is_everything() {
        let everything = Pattern::Scalars(Polarity::Exclude, ScalarKind::Ints, BTreeSet::new());
        let one = Pattern::Scalars(Polarity::Include, ScalarKind::Ints, BTreeSet::from([ScalarLit::Int(1)]));
        assert!(!everything.intersect(&one).is_nothing());
    }

    /// EDGE CASE: No match arms at all is reported as non-exhaustive with a
    /// concrete witness when the universe is non-empty.
    #[test]
    fn test_edge_no_arms_reports_missing() {
        let universe = Pattern::Scalars(Polarity::Include, ScalarKind::Ints, BTreeSet::from([ScalarLit::Int(0)]));
        let result = check_match(universe, &[]);
        assert!(result.missing_example.is_some());
    }

    /// EDGE CASE: Deeply nested constructor patterns don't blow the stack
    /// when computing a union.
    #[test]
    fn test_edge_deep_nesting_pattern_union() {
        let mut current = Pattern::AllOf(Type::Id(sym("Int")));
        for _ in 0..100 {
            let mut fields = std::collections::BTreeMap::new();
            fields.insert(sym("Cons"), vec![current]);
            current = Pattern::Ctors(fields);
        }
        assert!(!current.is_nothing());
    }
}
