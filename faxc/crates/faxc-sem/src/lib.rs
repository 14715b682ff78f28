//! faxc-sem - the semantic core: types, unification, type classes, pattern
//! exhaustiveness, and the analyzer that ties them together.
//!
//! ============================================================================
//! PIPELINE
//! ============================================================================
//!
//! A compilation unit flows through this crate in one pass:
//!
//! 1. [`analysis::Analyzer`] walks the parsed surface tree, registers every
//!    `enum`'s data constructors and every `trait`/`impl` as a class/instance,
//!    and lowers each function body into a fresh-variable-seeded [`hir::Expr`].
//! 2. [`infer::Inferencer`] assigns a principal type to that skeleton,
//!    unifying via [`unify`] as it goes and deferring class predicates.
//! 3. [`classes::ClassEnv`] discharges those predicates against the
//!    registered instances once a binding's scheme is generalized.
//! 4. [`patterns`] checks every `match` in the resolved tree for
//!    exhaustiveness and redundant arms.
//!
//! The result is a [`analysis::Module`]: fully-typed bindings plus the
//! constructor and class tables the specializer (`faxc-mir`) needs next.

pub mod analysis;
pub mod classes;
#[cfg(test)]
mod edge_cases;
pub mod hir;
pub mod infer;
pub mod patterns;
pub mod scope;
pub mod types;
pub mod unify;

pub use analysis::{Analyzer, Binding, Module};
pub use classes::{ClassDecl, ClassEnv, ClassError, Dictionary, InstanceDecl};
pub use hir::Expr;
pub use infer::Inferencer;
pub use patterns::{check_match, MatchCheck, Pattern};
pub use types::{ClassPredicate, DataConstructor, DefnId, FreshCtx, Scheme, Subst, Type, TypeAliasEnv, TypeError};

use faxc_util::{DefIdGenerator, Handler};

/// Analyze a whole parsed source file end to end, running exhaustiveness
/// checking over every resolved `match` before handing the module back to
/// the driver.
pub fn analyze_program(items: &[faxc_par::ast::Item], def_ids: &DefIdGenerator, handler: &mut Handler) -> Option<Module> {
    let analyzer = Analyzer::new(def_ids, handler);
    let module = analyzer.analyze(items);
    check_module_matches(&module, handler);
    Some(module)
}

fn check_module_matches(module: &Module, handler: &Handler) {
    use faxc_util::diagnostic::DiagnosticBuilder;

    for binding in &module.bindings {
        walk_matches(&binding.body, module, handler);
    }

    fn walk_matches(expr: &Expr, module: &Module, handler: &Handler) {
        if let Expr::Match { scrutinee, arms, .. } = expr {
            let scrutinee_ty = scrutinee.ty();
            let ctors: Vec<_> = module
                .constructors
                .values()
                .filter(|c| matches_parent(&scrutinee_ty, c.parent_type))
                .cloned()
                .collect();
            let universe = Pattern::universe_of(&scrutinee_ty, &ctors);
            let arm_patterns: Vec<_> = arms.iter().map(|a| a.pattern.clone()).collect();
            let result = check_match(universe, &arm_patterns);
            for &i in &result.redundant_arms {
                DiagnosticBuilder::error(format!("match arm {i} is unreachable"))
                    .span(arms[i].span)
                    .emit(handler);
            }
            if let Some(example) = result.missing_example {
                DiagnosticBuilder::error(format!("match is not exhaustive; missing case `{example}`"))
                    .span(expr.span())
                    .emit(handler);
            }
            for arm in arms {
                walk_matches(&arm.body, module, handler);
            }
            return;
        }
        walk_children(expr, module, handler);
    }

    fn matches_parent(ty: &Type, parent: faxc_util::Symbol) -> bool {
        matches!(ty, Type::Id(name) if *name == parent)
    }

    fn walk_children(expr: &Expr, module: &Module, handler: &Handler) {
        match expr {
            Expr::Lambda { body, .. } => walk_matches(body, module, handler),
            Expr::Application { func, arg, .. } => {
                walk_matches(func, module, handler);
                walk_matches(arg, module, handler);
            }
            Expr::Let { value, body, .. } => {
                walk_matches(value, module, handler);
                walk_matches(body, module, handler);
            }
            Expr::Fix { value, .. } => walk_matches(value, module, handler),
            Expr::Conditional { cond, then_branch, else_branch, .. } => {
                walk_matches(cond, module, handler);
                walk_matches(then_branch, module, handler);
                walk_matches(else_branch, module, handler);
            }
            Expr::While { cond, body, .. } => {
                walk_matches(cond, module, handler);
                walk_matches(body, module, handler);
            }
            Expr::Block { stmts, result, .. } => {
                for s in stmts {
                    walk_matches(s, module, handler);
                }
                walk_matches(result, module, handler);
            }
            Expr::Return { value, .. } => {
                if let Some(v) = value {
                    walk_matches(v, module, handler);
                }
            }
            Expr::Tuple { elems, .. } => {
                for e in elems {
                    walk_matches(e, module, handler);
                }
            }
            Expr::TupleDeref { tuple, .. } => walk_matches(tuple, module, handler),
            Expr::As { expr, .. } => walk_matches(expr, module, handler),
            Expr::Builtin { args, .. } => {
                for a in args {
                    walk_matches(a, module, handler);
                }
            }
            Expr::Literal(..)
            | Expr::Var(..)
            | Expr::Sizeof { .. }
            | Expr::Break(_)
            | Expr::Continue(_)
            | Expr::StaticPrint { .. }
            | Expr::Match { .. } => {}
        }
    }
}
