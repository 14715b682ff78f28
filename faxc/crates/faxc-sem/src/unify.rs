//! First-order unification over [`Type`], with an occurs check and the
//! `compose(s2, s1)` substitution algebra defined in `types.rs`.

use crate::types::{ClassPredicate, Subst, Type, TyVar, TypeError};
use std::collections::BTreeSet;

/// Does `var` occur free in `ty`? Walked before every `Var` binding to rule
/// out infinite types (`'a = 'a -> Int`).
pub fn occurs(var: TyVar, ty: &Type) -> bool {
    match ty {
        Type::Var(v, _) => *v == var,
        Type::Id(_) => false,
        Type::Operator(f, x) => occurs(var, f) || occurs(var, x),
        Type::Tuple(xs) => xs.iter().any(|x| occurs(var, x)),
        Type::Lambda(v, body) => *v != var && occurs(var, body),
    }
}

/// Unify two types, returning the most general substitution that makes them
/// equal under `rebind`. Predicate sets on unified variables are merged, not
/// discarded: unifying `'a: Eq` with `'b: Ord` yields a variable carrying
/// both.
pub fn unify(lhs: &Type, rhs: &Type) -> Result<Subst, TypeError> {
    match (lhs, rhs) {
        (Type::Var(v1, p1), Type::Var(v2, p2)) if v1 == v2 => {
            let _ = (p1, p2);
            Ok(Subst::empty())
        }
        (Type::Var(v, preds), other) | (other, Type::Var(v, preds)) => {
            bind_var(*v, preds, other)
        }
        (Type::Id(a), Type::Id(b)) => {
            if a == b {
                Ok(Subst::empty())
            } else {
                Err(TypeError::Mismatch {
                    expected: lhs.clone(),
                    found: rhs.clone(),
                    reason: "distinct nominal types",
                })
            }
        }
        (Type::Operator(f1, x1), Type::Operator(f2, x2)) => {
            let s1 = unify(f1, f2)?;
            let s2 = unify(&x1.rebind(&s1), &x2.rebind(&s1))?;
            Ok(Subst::compose(&s2, &s1))
        }
        (Type::Tuple(xs1), Type::Tuple(xs2)) => {
            if xs1.len() != xs2.len() {
                return Err(TypeError::ArityMismatch {
                    expected: xs1.len(),
                    found: xs2.len(),
                });
            }
            let mut subst = Subst::empty();
            for (a, b) in xs1.iter().zip(xs2.iter()) {
                let a = a.rebind(&subst);
                let b = b.rebind(&subst);
                let next = unify(&a, &b)?;
                subst = Subst::compose(&next, &subst);
            }
            Ok(subst)
        }
        (Type::Lambda(v1, b1), Type::Lambda(v2, b2)) => {
            // Alpha-equivalence: rename v2's occurrences of v2 to v1 before
            // comparing the bodies.
            let renamed = b2.rebind(&Subst::singleton(*v2, Type::Var(*v1, BTreeSet::new())));
            unify(b1, &renamed)
        }
        _ => Err(TypeError::Mismatch {
            expected: lhs.clone(),
            found: rhs.clone(),
            reason: "incompatible type shapes",
        }),
    }
}

fn bind_var(var: TyVar, preds: &BTreeSet<faxc_util::Symbol>, other: &Type) -> Result<Subst, TypeError> {
    match other {
        Type::Var(v2, p2) if *v2 == var => {
            let _ = p2;
            Ok(Subst::empty())
        }
        _ => {
            let merged = merge_predicates_into(preds, other);
            Subst::bind(var, merged)
        }
    }
}

/// When a predicate-carrying variable is unified with a concrete type, the
/// predicates don't vanish — they become obligations on that type, picked up
/// by the class-predicate engine during discharge. When unified with another
/// variable, the predicate sets are unioned onto that variable so neither
/// constraint is lost.
fn merge_predicates_into(preds: &BTreeSet<faxc_util::Symbol>, other: &Type) -> Type {
    match other {
        Type::Var(v2, p2) => {
            let mut merged = p2.clone();
            merged.extend(preds.iter().copied());
            Type::Var(*v2, merged)
        }
        _ => other.clone(),
    }
}

/// Predicates discharged against a concrete type rather than resolved to a
/// variable are handed back to the caller (the class-predicate engine) for
/// instance resolution.
pub fn predicates_on_concrete_type(ty: &Type, class_names: &BTreeSet<faxc_util::Symbol>) -> Vec<ClassPredicate> {
    class_names
        .iter()
        .map(|c| ClassPredicate::new(*c, vec![ty.clone()]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_util::Symbol;

    fn var(name: &str) -> Type {
        Type::Var(Symbol::intern(name), BTreeSet::new())
    }

    #[test]
    fn unify_same_variable_is_noop() {
        let s = unify(&var("a"), &var("a")).unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn unify_variable_with_concrete_type() {
        let s = unify(&var("a"), &Type::Id(Symbol::intern("Int"))).unwrap();
        assert_eq!(var("a").rebind(&s), Type::Id(Symbol::intern("Int")));
    }

    #[test]
    fn occurs_check_rejects_infinite_type() {
        let a = Symbol::intern("a");
        let infinite = Type::arrow(Type::Var(a, BTreeSet::new()), Type::Id(Symbol::intern("Int")));
        let result = unify(&Type::Var(a, BTreeSet::new()), &infinite);
        assert!(matches!(result, Err(TypeError::InfiniteType { .. })));
    }

    #[test]
    fn unify_mismatched_nominal_types_fails() {
        let result = unify(&Type::Id(Symbol::intern("Int")), &Type::Id(Symbol::intern("Bool")));
        assert!(result.is_err());
    }

    #[test]
    fn unify_tuples_arity_mismatch() {
        let result = unify(&Type::Tuple(vec![var("a")]), &Type::Tuple(vec![var("a"), var("b")]));
        assert!(matches!(result, Err(TypeError::ArityMismatch { .. })));
    }

    #[test]
    fn unify_arrows_composes_substitutions() {
        let lhs = Type::arrow(var("a"), var("b"));
        let rhs = Type::arrow(Type::Id(Symbol::intern("Int")), Type::Id(Symbol::intern("Bool")));
        let s = unify(&lhs, &rhs).unwrap();
        assert_eq!(var("a").rebind(&s), Type::Id(Symbol::intern("Int")));
        assert_eq!(var("b").rebind(&s), Type::Id(Symbol::intern("Bool")));
    }
}
