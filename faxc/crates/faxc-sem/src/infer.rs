//! Constraint-based type inference (an Algorithm-W variant): types are
//! assigned bottom-up, unifying as soon as two types meet rather than
//! deferring to a separate solving phase. Class predicates uncovered along
//! the way are accumulated and discharged by [`crate::classes`] once a
//! binding's type is fully generalized.

use crate::classes::ClassEnv;
use crate::hir::{Builtin, Expr, Literal, MatchArm};
use crate::patterns::Pattern;
use crate::types::{generalize, ClassPredicate, DataConstructor, FreshCtx, Scheme, Subst, Type, TypeAliasEnv, TypeError};
use faxc_util::{DefId, Span, Symbol};
use std::collections::HashMap;
use std::rc::Rc;

fn ty_id(name: &str) -> Type {
    Type::Id(Symbol::intern(name))
}

fn unify(a: &Type, b: &Type) -> Result<Subst, TypeError> {
    crate::unify::unify(a, b)
}

/// Per-function inference state: fresh-variable supply, the binding schemes
/// discovered so far, and the class predicates deferred for discharge.
///
/// Owns clones of the module-wide class/alias/constructor tables rather than
/// borrowing them, so a caller driving several independent function bodies
/// (as the analyzer does) never fights the borrow checker over whether those
/// tables are still being read elsewhere.
pub struct Inferencer {
    pub fresh: FreshCtx,
    pub classes: ClassEnv,
    pub aliases: TypeAliasEnv,
    pub constructors: HashMap<Symbol, DataConstructor>,
    pub schemes: HashMap<DefId, Scheme>,
    pub requirements: Vec<ClassPredicate>,
    /// Every `Var` node visited during this pass, with the type its scheme
    /// was instantiated to *before* the final substitution is known. Once
    /// [`Inferencer::infer`] returns its principal substitution, rebinding
    /// each entry here with it gives the concrete type that identifier
    /// resolved to at that exact call site — consulted by the specializer to
    /// discover which monomorphizations a body demands, and nowhere else
    /// during ordinary whole-program analysis.
    pub var_uses: Vec<(DefId, Type, Span)>,
}

impl Inferencer {
    pub fn new(classes: ClassEnv, aliases: TypeAliasEnv, constructors: HashMap<Symbol, DataConstructor>) -> Inferencer {
        Inferencer {
            fresh: FreshCtx::new(),
            classes,
            aliases,
            constructors,
            schemes: HashMap::new(),
            requirements: Vec::new(),
            var_uses: Vec::new(),
        }
    }

    pub fn bind(&mut self, id: DefId, scheme: Scheme) {
        self.schemes.insert(id, scheme);
    }

    /// Run inference over a (pre-built, fresh-var-seeded) expression tree,
    /// returning the principal substitution. Callers apply it with
    /// [`apply_subst`] to obtain the fully-resolved tree.
    pub fn infer(&mut self, expr: &Expr) -> Result<(Type, Subst), TypeError> {
        match expr {
            Expr::Literal(lit, _) => Ok((literal_ty(lit), Subst::empty())),

            Expr::Var(id, span) => {
                let scheme = self
                    .schemes
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| Scheme::monomorphic(self.fresh.next_type()));
                let (ty, preds) = scheme.instantiate(&self.fresh);
                self.requirements.extend(preds);
                self.var_uses.push((*id, ty.clone(), *span));
                Ok((ty, Subst::empty()))
            }

            Expr::Lambda { param, param_ty, body, .. } => {
                self.bind(*param, Scheme::monomorphic(param_ty.clone()));
                let (body_ty, s) = self.infer(body)?;
                let ty = Type::arrow(param_ty.rebind(&s), body_ty);
                Ok((ty, s))
            }

            Expr::Application { func, arg, .. } => {
                let (func_ty, s1) = self.infer(func)?;
                let (arg_ty, s2) = self.infer(arg)?;
                let s12 = Subst::compose(&s2, &s1);
                let result = self.fresh.next_type();
                let expected = Type::arrow(arg_ty.rebind(&s12), result.clone());
                let s3 = unify(&func_ty.rebind(&s12), &expected)?;
                let s = Subst::compose(&s3, &s12);
                Ok((result.rebind(&s), s))
            }

            Expr::Let { binding, value, body, .. } => {
                let (value_ty, s1) = self.infer(value)?;
                let value_ty = value_ty.rebind(&s1);
                let scheme = generalize(&value_ty, &self.ambient_predicates());
                self.bind(*binding, scheme);
                let (body_ty, s2) = self.infer(body)?;
                Ok((body_ty, Subst::compose(&s2, &s1)))
            }

            Expr::Fix { binding, value, .. } => {
                // Bind the recursive name to a fresh monomorphic slot first
                // so uses inside `value` see *some* type, then generalize
                // after inference so outside callers (and re-inference
                // during specialization) can instantiate it polymorphically.
                let placeholder = self.fresh.next_type();
                self.bind(*binding, Scheme::monomorphic(placeholder.clone()));
                let (value_ty, s1) = self.infer(value)?;
                let s2 = unify(&placeholder.rebind(&s1), &value_ty)?;
                let s = Subst::compose(&s2, &s1);
                let final_ty = value_ty.rebind(&s);
                let scheme = generalize(&final_ty, &self.ambient_predicates());
                self.bind(*binding, scheme);
                Ok((final_ty, s))
            }

            Expr::Conditional { cond, then_branch, else_branch, .. } => {
                let (cond_ty, s1) = self.infer(cond)?;
                let s2 = unify(&cond_ty, &ty_id("Bool"))?;
                let s12 = Subst::compose(&s2, &s1);
                let (then_ty, s3) = self.infer(then_branch)?;
                let s123 = Subst::compose(&s3, &s12);
                let (else_ty, s4) = self.infer(else_branch)?;
                let s1234 = Subst::compose(&s4, &s123);
                let s5 = unify(&then_ty.rebind(&s1234), &else_ty.rebind(&s1234))?;
                let s = Subst::compose(&s5, &s1234);
                Ok((then_ty.rebind(&s), s))
            }

            Expr::While { cond, body, .. } => {
                let (cond_ty, s1) = self.infer(cond)?;
                let s2 = unify(&cond_ty, &ty_id("Bool"))?;
                let s12 = Subst::compose(&s2, &s1);
                let (_, s3) = self.infer(body)?;
                Ok((Type::unit(), Subst::compose(&s3, &s12)))
            }

            Expr::Block { stmts, result, .. } => {
                let mut subst = Subst::empty();
                for stmt in stmts {
                    let (_, s) = self.infer(stmt)?;
                    subst = Subst::compose(&s, &subst);
                }
                let (ty, s) = self.infer(result)?;
                Ok((ty, Subst::compose(&s, &subst)))
            }

            Expr::Return { value, .. } => {
                let mut subst = Subst::empty();
                if let Some(v) = value {
                    let (_, s) = self.infer(v)?;
                    subst = s;
                }
                Ok((Type::unit(), subst))
            }

            Expr::Tuple { elems, .. } => {
                let mut subst = Subst::empty();
                let mut tys = Vec::new();
                for e in elems {
                    let (ty, s) = self.infer(e)?;
                    subst = Subst::compose(&s, &subst);
                    tys.push(ty);
                }
                Ok((Type::Tuple(tys.iter().map(|t| t.rebind(&subst)).collect()), subst))
            }

            Expr::TupleDeref { tuple, index, .. } => {
                let (tuple_ty, s) = self.infer(tuple)?;
                match tuple_ty.rebind(&s) {
                    Type::Tuple(elems) => match elems.get(*index) {
                        Some(ty) => Ok((ty.clone(), s)),
                        None => Err(TypeError::ArityMismatch { expected: *index + 1, found: elems.len() }),
                    },
                    other => Err(TypeError::Mismatch {
                        expected: Type::Tuple(vec![]),
                        found: other,
                        reason: "tuple projection on non-tuple",
                    }),
                }
            }

            Expr::As { expr: inner, ty, force_cast, .. } => {
                let (inner_ty, s1) = self.infer(inner)?;
                if *force_cast {
                    Ok((ty.clone(), s1))
                } else {
                    let s2 = unify(&inner_ty.rebind(&s1), ty)?;
                    Ok((ty.clone(), Subst::compose(&s2, &s1)))
                }
            }

            Expr::Sizeof { ty, .. } => {
                let _ = ty;
                Ok((ty_id("Int"), Subst::empty()))
            }

            Expr::Builtin { op, args, .. } => self.infer_builtin(*op, args),

            Expr::Break(_) | Expr::Continue(_) => Ok((Type::unit(), Subst::empty())),

            Expr::Match { scrutinee, arms, .. } => self.infer_match(scrutinee, arms),

            Expr::StaticPrint { .. } => Ok((Type::unit(), Subst::empty())),
        }
    }

    fn infer_builtin(&mut self, op: Builtin, args: &[Expr]) -> Result<(Type, Subst), TypeError> {
        let mut subst = Subst::empty();
        let mut tys = Vec::new();
        for a in args {
            let (ty, s) = self.infer(a)?;
            subst = Subst::compose(&s, &subst);
            tys.push(ty.rebind(&subst));
        }
        let (operand_ty, result_ty) = builtin_signature(op);
        for t in &tys {
            let s = unify(t, &operand_ty)?;
            subst = Subst::compose(&s, &subst);
        }
        Ok((result_ty, subst))
    }

    fn infer_match(&mut self, scrutinee: &Expr, arms: &[MatchArm]) -> Result<(Type, Subst), TypeError> {
        let (scrutinee_ty, s0) = self.infer(scrutinee)?;
        let mut subst = s0;
        let scrutinee_ty = scrutinee_ty.rebind(&subst);
        let mut result_ty: Option<Type> = None;
        for arm in arms {
            for (name, def_id) in &arm.bindings {
                let _ = name;
                self.bind(*def_id, Scheme::monomorphic(self.fresh.next_type()));
            }
            let constructors = self.constructors.clone();
            bind_pattern_fields(&arm.pattern, &arm.bindings, &constructors, &mut |def_id, ty| {
                self.bind(def_id, Scheme::monomorphic(ty));
            });
            let _ = &scrutinee_ty;
            let (body_ty, s) = self.infer(&arm.body)?;
            subst = Subst::compose(&s, &subst);
            let body_ty = body_ty.rebind(&subst);
            result_ty = Some(match result_ty {
                None => body_ty,
                Some(prev) => {
                    let s = unify(&prev, &body_ty)?;
                    subst = Subst::compose(&s, &subst);
                    prev.rebind(&s)
                }
            });
        }
        Ok((result_ty.unwrap_or(Type::unit()), subst))
    }

    fn ambient_predicates(&self) -> HashMap<crate::types::TyVar, std::collections::BTreeSet<Symbol>> {
        let mut out = HashMap::new();
        for scheme in self.schemes.values() {
            if scheme.is_monomorphic() {
                for v in scheme.ty.free_vars() {
                    out.entry(v).or_insert_with(std::collections::BTreeSet::new);
                }
            }
        }
        out
    }
}

fn literal_ty(lit: &Literal) -> Type {
    match lit {
        Literal::Int(_) => ty_id("Int"),
        Literal::Float(_) => ty_id("Float"),
        Literal::Str(_) => ty_id("String"),
        Literal::Bool(_) => ty_id("Bool"),
    }
}

fn builtin_signature(op: Builtin) -> (Type, Type) {
    match op {
        Builtin::AddInt | Builtin::SubInt | Builtin::MulInt | Builtin::DivInt | Builtin::ModInt => {
            (ty_id("Int"), ty_id("Int"))
        }
        Builtin::AddFloat | Builtin::SubFloat | Builtin::MulFloat | Builtin::DivFloat => {
            (ty_id("Float"), ty_id("Float"))
        }
        Builtin::CmpEq | Builtin::CmpLt | Builtin::CmpLte | Builtin::CmpGt | Builtin::CmpGte => {
            (ty_id("Int"), ty_id("Bool"))
        }
        Builtin::Not => (ty_id("Bool"), ty_id("Bool")),
        Builtin::Negate => (ty_id("Int"), ty_id("Int")),
        Builtin::StrConcat => (ty_id("String"), ty_id("String")),
        Builtin::Print => (ty_id("String"), Type::unit()),
    }
}

fn bind_pattern_fields(
    pattern: &Pattern,
    bindings: &[(Symbol, DefId)],
    constructors: &HashMap<Symbol, DataConstructor>,
    bind: &mut dyn FnMut(DefId, Type),
) {
    if let Pattern::Ctor(name, _fields) = pattern {
        if let Some(ctor) = constructors.get(name) {
            for ((_, def_id), field_ty) in bindings.iter().zip(ctor.arg_types.iter()) {
                bind(*def_id, field_ty.clone());
            }
        }
    }
}

/// Walk a fully-inferred expression, replacing every placeholder type with
/// its resolved form under `subst`. Run once after a binding's inference
/// converges, since intermediate nodes hold the fresh variables they were
/// built with rather than being mutated in place.
pub fn apply_subst(expr: &Expr, subst: &Subst) -> Expr {
    match expr {
        Expr::Literal(..) | Expr::Var(..) | Expr::Break(_) | Expr::Continue(_) | Expr::StaticPrint { .. } => {
            expr.clone()
        }
        Expr::Lambda { param, param_ty, body, ty, span } => Expr::Lambda {
            param: *param,
            param_ty: param_ty.rebind(subst),
            body: Rc::new(apply_subst(body, subst)),
            ty: ty.rebind(subst),
            span: *span,
        },
        Expr::Application { func, arg, ty, span } => Expr::Application {
            func: Rc::new(apply_subst(func, subst)),
            arg: Rc::new(apply_subst(arg, subst)),
            ty: ty.rebind(subst),
            span: *span,
        },
        Expr::Let { binding, value, body, ty, span } => Expr::Let {
            binding: *binding,
            value: Rc::new(apply_subst(value, subst)),
            body: Rc::new(apply_subst(body, subst)),
            ty: ty.rebind(subst),
            span: *span,
        },
        Expr::Fix { binding, value, ty, span } => Expr::Fix {
            binding: *binding,
            value: Rc::new(apply_subst(value, subst)),
            ty: ty.rebind(subst),
            span: *span,
        },
        Expr::Conditional { cond, then_branch, else_branch, ty, span } => Expr::Conditional {
            cond: Rc::new(apply_subst(cond, subst)),
            then_branch: Rc::new(apply_subst(then_branch, subst)),
            else_branch: Rc::new(apply_subst(else_branch, subst)),
            ty: ty.rebind(subst),
            span: *span,
        },
        Expr::While { cond, body, span } => Expr::While {
            cond: Rc::new(apply_subst(cond, subst)),
            body: Rc::new(apply_subst(body, subst)),
            span: *span,
        },
        Expr::Block { stmts, result, ty, span } => Expr::Block {
            stmts: stmts.iter().map(|s| apply_subst(s, subst)).collect(),
            result: Rc::new(apply_subst(result, subst)),
            ty: ty.rebind(subst),
            span: *span,
        },
        Expr::Return { value, span } => Expr::Return {
            value: value.as_ref().map(|v| Rc::new(apply_subst(v, subst))),
            span: *span,
        },
        Expr::Tuple { elems, ty, span } => Expr::Tuple {
            elems: elems.iter().map(|e| apply_subst(e, subst)).collect(),
            ty: ty.rebind(subst),
            span: *span,
        },
        Expr::TupleDeref { tuple, index, ty, span } => Expr::TupleDeref {
            tuple: Rc::new(apply_subst(tuple, subst)),
            index: *index,
            ty: ty.rebind(subst),
            span: *span,
        },
        Expr::As { expr: inner, ty, force_cast, span } => Expr::As {
            expr: Rc::new(apply_subst(inner, subst)),
            ty: ty.rebind(subst),
            force_cast: *force_cast,
            span: *span,
        },
        Expr::Sizeof { ty, span } => Expr::Sizeof { ty: ty.rebind(subst), span: *span },
        Expr::Builtin { op, args, ty, span } => Expr::Builtin {
            op: *op,
            args: args.iter().map(|a| apply_subst(a, subst)).collect(),
            ty: ty.rebind(subst),
            span: *span,
        },
        Expr::Match { scrutinee, arms, ty, span } => Expr::Match {
            scrutinee: Rc::new(apply_subst(scrutinee, subst)),
            arms: arms
                .iter()
                .map(|arm| MatchArm {
                    pattern: arm.pattern.clone(),
                    bindings: arm.bindings.clone(),
                    body: Rc::new(apply_subst(&arm.body, subst)),
                    span: arm.span,
                })
                .collect(),
            ty: ty.rebind(subst),
            span: *span,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_util::Span;

    fn span() -> Span {
        Span::default()
    }

    #[test]
    fn infer_literal() {
        let classes = ClassEnv::new();
        let aliases = TypeAliasEnv::new();
        let ctors = HashMap::new();
        let mut inf = Inferencer::new(classes, aliases, ctors);
        let (ty, _) = inf.infer(&Expr::Literal(Literal::Int(1), span())).unwrap();
        assert_eq!(ty, ty_id("Int"));
    }

    #[test]
    fn infer_identity_lambda() {
        let classes = ClassEnv::new();
        let aliases = TypeAliasEnv::new();
        let ctors = HashMap::new();
        let mut inf = Inferencer::new(classes, aliases, ctors);
        let param = DefId(0);
        let param_ty = inf.fresh.next_type();
        let expr = Expr::Lambda {
            param,
            param_ty: param_ty.clone(),
            body: Rc::new(Expr::Var(param, span())),
            ty: Type::unit(),
            span: span(),
        };
        inf.bind(param, Scheme::monomorphic(param_ty));
        let (ty, s) = inf.infer(&expr).unwrap();
        let ty = ty.rebind(&s);
        match ty.arrow_parts() {
            Some((from, to)) => assert_eq!(from, to),
            None => panic!("expected arrow type, got {ty}"),
        }
    }

    #[test]
    fn infer_conditional_unifies_branches() {
        let classes = ClassEnv::new();
        let aliases = TypeAliasEnv::new();
        let ctors = HashMap::new();
        let mut inf = Inferencer::new(classes, aliases, ctors);
        let expr = Expr::Conditional {
            cond: Rc::new(Expr::Literal(Literal::Bool(true), span())),
            then_branch: Rc::new(Expr::Literal(Literal::Int(1), span())),
            else_branch: Rc::new(Expr::Literal(Literal::Int(2), span())),
            ty: Type::unit(),
            span: span(),
        };
        let (ty, s) = inf.infer(&expr).unwrap();
        assert_eq!(ty.rebind(&s), ty_id("Int"));
    }

    #[test]
    fn mismatched_conditional_branches_error() {
        let classes = ClassEnv::new();
        let aliases = TypeAliasEnv::new();
        let ctors = HashMap::new();
        let mut inf = Inferencer::new(classes, aliases, ctors);
        let expr = Expr::Conditional {
            cond: Rc::new(Expr::Literal(Literal::Bool(true), span())),
            then_branch: Rc::new(Expr::Literal(Literal::Int(1), span())),
            else_branch: Rc::new(Expr::Literal(Literal::Str("x".into()), span())),
            ty: Type::unit(),
            span: span(),
        };
        assert!(inf.infer(&expr).is_err());
    }
}
