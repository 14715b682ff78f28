//! Demand-driven monomorphization.
//!
//! Starting from `main`, every reachable [`DefnId`] (a definition name paired
//! with the concrete, zero-variable scheme it was called at) is re-inferred
//! in isolation and translated into a [`faxc_sem::Expr`] ready for
//! [`crate::lower`]. Re-inference discovers every further monomorphization a
//! body demands — a call to a still-polymorphic sibling becomes a new
//! worklist entry keyed by the concrete type that call site resolved to.

use faxc_sem::{DefnId, Expr, Inferencer, Module, Scheme, Type, TypeError};
use faxc_util::{DefId, Span, Symbol};
use std::collections::{HashMap, VecDeque};

/// Tuple arity bound; checked again here even though the inferencer already
/// rejects over-wide tuples, since a specialization can synthesize a wider
/// tuple type than any single source-level tuple literal had (e.g. via
/// repeated generic instantiation).
pub const MAX_TUPLE: usize = 16;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SpecializationError {
    #[error("specialization of `{0}` did not make progress (non-productive recursion)")]
    NonProductiveLoop(DefnId),
    #[error("no definition found for `{0}`")]
    UnknownDefinition(Symbol),
    #[error("tuple arity {0} exceeds MAX_TUPLE ({MAX_TUPLE})")]
    TupleTooWide(usize),
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error(transparent)]
    Class(#[from] faxc_sem::ClassError),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SpecializeState {
    InProgress,
    Done,
}

/// Hashable stand-in for [`Span`] (which doesn't derive `Hash`) — distinct
/// syntactic occurrences of the same identifier get distinct spans, so this
/// is precise enough to key "which call site resolved to which concrete
/// definition" without needing expression node identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanKey(usize, usize, usize);

pub fn span_key(span: Span) -> SpanKey {
    SpanKey(span.start, span.end, span.file_id.0)
}

/// The output of specializing one [`DefnId`]: its body with every type fully
/// resolved to a concrete instantiation, plus the call sites within it that
/// target another top-level definition (as opposed to a genuinely local
/// variable), keyed by that call's span so [`crate::lower`] can tell the two
/// apart without re-running inference.
pub struct SpecializedUnit {
    pub expr: Expr,
    pub call_targets: HashMap<SpanKey, DefnId>,
}

pub fn is_builtin(name: Symbol) -> bool {
    name.as_str().starts_with("__builtin_")
}

pub struct Specializer<'m> {
    module: &'m Module,
    by_name: HashMap<Symbol, &'m faxc_sem::Binding>,
    worklist: VecDeque<(DefnId, Span)>,
    states: HashMap<DefnId, SpecializeState>,
    pub translation_map: HashMap<DefnId, SpecializedUnit>,
}

impl<'m> Specializer<'m> {
    pub fn new(module: &'m Module) -> Specializer<'m> {
        let by_name = module.bindings.iter().map(|b| (b.name, b)).collect();
        Specializer {
            module,
            by_name,
            worklist: VecDeque::new(),
            states: HashMap::new(),
            translation_map: HashMap::new(),
        }
    }

    /// Seed the worklist with `main :: Unit -> Unit` and drain it to a fixed
    /// point, returning every definition the program actually demands.
    pub fn run(mut self) -> Result<HashMap<DefnId, SpecializedUnit>, SpecializationError> {
        let main_name = Symbol::intern("main");
        let main_binding = self
            .by_name
            .get(&main_name)
            .ok_or(SpecializationError::UnknownDefinition(main_name))?;
        let main_defn = DefnId::new(main_name, main_binding.scheme.clone());
        self.worklist.push_back((main_defn, main_binding.body.span()));

        while let Some((defn_id, span)) = self.worklist.pop_front() {
            if is_builtin(defn_id.name) {
                continue;
            }
            if self.translation_map.contains_key(&defn_id) {
                continue;
            }
            match self.states.get(&defn_id) {
                Some(SpecializeState::InProgress) => {
                    return Err(SpecializationError::NonProductiveLoop(defn_id));
                }
                Some(SpecializeState::Done) => continue,
                None => {}
            }
            self.states.insert(defn_id.clone(), SpecializeState::InProgress);
            let unit = self.specialize_one(&defn_id, span)?;
            self.translation_map.insert(defn_id.clone(), unit);
            self.states.insert(defn_id, SpecializeState::Done);
        }

        Ok(self.translation_map)
    }

    fn specialize_one(&mut self, defn_id: &DefnId, span: Span) -> Result<SpecializedUnit, SpecializationError> {
        debug_assert!(defn_id.scheme.vars.is_empty(), "worklist entries must be fully concrete");
        check_tuple_arity(&defn_id.scheme.ty)?;

        let binding = self
            .by_name
            .get(&defn_id.name)
            .ok_or(SpecializationError::UnknownDefinition(defn_id.name))?;

        let as_expr = Expr::As {
            expr: std::rc::Rc::new(binding.body.clone()),
            ty: defn_id.scheme.ty.clone(),
            force_cast: false,
            span,
        };

        let mut inf = Inferencer::new(self.module.classes.clone(), self.module.aliases.clone(), self.module.constructors.clone());
        // Every other top-level definition's real (possibly polymorphic)
        // scheme is already known from whole-program inference; seeding it
        // here lets this fresh re-inference pass instantiate sibling calls
        // at whatever concrete type this specialization actually demands.
        for sibling in &self.module.bindings {
            inf.bind(sibling.def_id, sibling.scheme.clone());
        }

        let (ty, subst) = inf.infer(&as_expr)?;
        let _ = ty;
        let resolved = faxc_sem::infer::apply_subst(&as_expr, &subst);
        self.module.classes.discharge_all(&inf.requirements)?;

        let mut call_targets = HashMap::new();
        let mut by_def_id: HashMap<DefId, &faxc_sem::Binding> = HashMap::new();
        for b in &self.module.bindings {
            by_def_id.insert(b.def_id, b);
        }
        for (id, use_ty, use_span) in &inf.var_uses {
            let Some(sibling) = by_def_id.get(id) else { continue };
            let concrete_ty = use_ty.rebind(&subst);
            if !concrete_ty.free_vars().is_empty() {
                // Still polymorphic after this specialization's own
                // substitution — can only happen for a definition that's
                // never actually called concretely (dead code under this
                // specialization); nothing to enqueue.
                continue;
            }
            let callee = DefnId::new(sibling.name, Scheme::monomorphic(concrete_ty));
            call_targets.insert(span_key(*use_span), callee.clone());
            self.worklist.push_back((callee, *use_span));
        }

        // Unwrap the `As` wrapper used to drive re-inference; the body
        // itself, not the cast marker, is what `lower` consumes.
        let expr = match resolved {
            Expr::As { expr, .. } => (*expr).clone(),
            other => other,
        };

        Ok(SpecializedUnit { expr, call_targets })
    }
}

fn check_tuple_arity(ty: &Type) -> Result<(), SpecializationError> {
    if let Type::Tuple(elems) = ty {
        if elems.len() > MAX_TUPLE {
            return Err(SpecializationError::TupleTooWide(elems.len()));
        }
        for e in elems {
            check_tuple_arity(e)?;
        }
    }
    Ok(())
}
