//! Types, schemes, and substitution.
//!
//! `Type` is the five-variant representation used throughout the semantic
//! core: a type variable carrying its class predicates, a nominal id, a
//! type-level application (`Operator`), a tuple, and a type-level lambda used
//! by `* -> *` constructors (`Maybe`, `List`, ...). Function types are not a
//! separate variant: `A -> B` is `Operator(Operator(Id("->"), A), B)`.

use faxc_util::Symbol;
use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

/// A type variable is just an interned name; equality and ordering are by
/// name, never by source location.
pub type TyVar = Symbol;

pub const ARROW: &str = "->";
pub const PTR: &str = "*";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    /// A type variable, carrying the set of class names it must satisfy.
    Var(TyVar, BTreeSet<Symbol>),
    /// A nominal type constructor (`Int`, `Bool`, a user-defined type name).
    Id(Symbol),
    /// Type-level application. Arrows are `Operator(Operator(Id("->"), A), B)`;
    /// pointers are `Operator(Id("*"), T)`.
    Operator(Box<Type>, Box<Type>),
    /// An ordered heterogeneous product, arity bounded by `MAX_TUPLE`.
    Tuple(Vec<Type>),
    /// A type-level abstraction, for constructors of kind `* -> *`.
    Lambda(TyVar, Box<Type>),
}

impl Type {
    pub fn unit() -> Type {
        Type::Tuple(vec![])
    }

    pub fn arrow(from: Type, to: Type) -> Type {
        Type::Operator(
            Box::new(Type::Operator(Box::new(Type::Id(Symbol::intern(ARROW))), Box::new(from))),
            Box::new(to),
        )
    }

    /// Unfold a right-associative `->` chain into (params, result). Returns
    /// `None` if the type is not arrow-shaped at the top level.
    pub fn arrow_parts(&self) -> Option<(&Type, &Type)> {
        match self {
            Type::Operator(lhs, to) => match lhs.as_ref() {
                Type::Operator(arrow, from) => match arrow.as_ref() {
                    Type::Id(name) if name.eq_str(ARROW) => Some((from, to)),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Type::Var(..))
    }

    /// Free type variables, computed structurally.
    pub fn free_vars(&self) -> BTreeSet<TyVar> {
        match self {
            Type::Var(v, _) => {
                let mut s = BTreeSet::new();
                s.insert(*v);
                s
            }
            Type::Id(_) => BTreeSet::new(),
            Type::Operator(f, x) => {
                let mut s = f.free_vars();
                s.extend(x.free_vars());
                s
            }
            Type::Tuple(xs) => {
                let mut s = BTreeSet::new();
                for x in xs {
                    s.extend(x.free_vars());
                }
                s
            }
            Type::Lambda(v, body) => {
                let mut s = body.free_vars();
                s.remove(v);
                s
            }
        }
    }

    /// The predicate set every free variable of this type must satisfy,
    /// merged across every occurrence of that variable.
    pub fn predicate_map(&self) -> HashMap<TyVar, BTreeSet<Symbol>> {
        let mut out = HashMap::new();
        self.collect_predicates(&mut out);
        out
    }

    fn collect_predicates(&self, out: &mut HashMap<TyVar, BTreeSet<Symbol>>) {
        match self {
            Type::Var(v, preds) => {
                out.entry(*v).or_default().extend(preds.iter().copied());
            }
            Type::Id(_) => {}
            Type::Operator(f, x) => {
                f.collect_predicates(out);
                x.collect_predicates(out);
            }
            Type::Tuple(xs) => {
                for x in xs {
                    x.collect_predicates(out);
                }
            }
            Type::Lambda(_, body) => body.collect_predicates(out),
        }
    }

    /// Apply a substitution, preserving structure.
    pub fn rebind(&self, subst: &Subst) -> Type {
        match self {
            Type::Var(v, preds) => match subst.get(v) {
                Some(ty) => ty.clone(),
                None => Type::Var(*v, preds.clone()),
            },
            Type::Id(_) => self.clone(),
            Type::Operator(f, x) => {
                Type::Operator(Box::new(f.rebind(subst)), Box::new(x.rebind(subst)))
            }
            Type::Tuple(xs) => Type::Tuple(xs.iter().map(|x| x.rebind(subst)).collect()),
            Type::Lambda(v, body) => {
                // The bound variable is shadowed; don't substitute inside if
                // the substitution targets it (callers are expected to have
                // already freshened away any capture).
                let mut inner = subst.clone();
                inner.remove(v);
                Type::Lambda(*v, Box::new(body.rebind(&inner)))
            }
        }
    }

    /// Type-level application; only meaningful on `Lambda`. Calling this on
    /// anything else is an internal invariant violation, not a user error.
    pub fn apply(&self, arg: &Type) -> Type {
        match self {
            Type::Lambda(v, body) => {
                let subst = Subst::singleton(*v, arg.clone());
                body.rebind(&subst)
            }
            _ => {
                debug_assert!(false, "Type::apply called on a non-Lambda type");
                self.clone()
            }
        }
    }

    /// Expand type aliases, beta-reducing `Lambda` applications as they're
    /// uncovered.
    pub fn eval(&self, aliases: &TypeAliasEnv) -> Type {
        match self {
            Type::Id(name) => match aliases.get(name) {
                Some(aliased) => aliased.eval(aliases),
                None => self.clone(),
            },
            Type::Operator(f, x) => {
                let f = f.eval(aliases);
                let x = x.eval(aliases);
                match &f {
                    Type::Lambda(..) => f.apply(&x),
                    _ => Type::Operator(Box::new(f), Box::new(x)),
                }
            }
            Type::Tuple(xs) => Type::Tuple(xs.iter().map(|x| x.eval(aliases)).collect()),
            Type::Lambda(v, body) => Type::Lambda(*v, Box::new(body.eval(aliases))),
            Type::Var(..) => self.clone(),
        }
    }

    /// Canonical string form, used for hashing, ordering, and memoization
    /// keys throughout the semantic core.
    pub fn repr(&self) -> String {
        match self {
            Type::Var(v, preds) => {
                if preds.is_empty() {
                    format!("'{}", v.as_str())
                } else {
                    let preds: Vec<_> = preds.iter().map(|p| p.as_str().to_string()).collect();
                    format!("'{}:{}", v.as_str(), preds.join("+"))
                }
            }
            Type::Id(name) => name.as_str().to_string(),
            Type::Operator(f, x) => format!("({} {})", f.repr(), x.repr()),
            Type::Tuple(xs) => {
                let parts: Vec<_> = xs.iter().map(Type::repr).collect();
                format!("({})", parts.join(", "))
            }
            Type::Lambda(v, body) => format!("(\\{} -> {})", v.as_str(), body.repr()),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repr())
    }
}

pub type TypeAliasEnv = HashMap<Symbol, Type>;

/// A substitution from type variables to types. Cheaply cloned: the backing
/// map is `Rc`-shared, copy-on-write on the first mutation.
#[derive(Clone, Debug, Default)]
pub struct Subst(Rc<HashMap<TyVar, Type>>);

impl Subst {
    pub fn empty() -> Subst {
        Subst(Rc::new(HashMap::new()))
    }

    pub fn singleton(var: TyVar, ty: Type) -> Subst {
        let mut m = HashMap::new();
        m.insert(var, ty);
        Subst(Rc::new(m))
    }

    pub fn get(&self, var: &TyVar) -> Option<&Type> {
        self.0.get(var)
    }

    pub fn remove(&mut self, var: &TyVar) {
        Rc::make_mut(&mut self.0).remove(var);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `compose(s2, s1)`: apply `s1` to the targets of `s2`, then union, with
    /// `s1`'s bindings winning on key conflict. Associative by construction.
    pub fn compose(s2: &Subst, s1: &Subst) -> Subst {
        if s1.is_empty() {
            return s2.clone();
        }
        let mut map: HashMap<TyVar, Type> =
            s2.0.iter().map(|(k, v)| (*k, v.rebind(s1))).collect();
        for (k, v) in s1.0.iter() {
            map.insert(*k, v.clone());
        }
        Subst(Rc::new(map))
    }

    /// Bind a variable to a type, running the occurs check first.
    pub fn bind(var: TyVar, ty: Type) -> Result<Subst, TypeError> {
        if let Type::Var(v2, _) = &ty {
            if *v2 == var {
                return Ok(Subst::empty());
            }
        }
        if crate::unify::occurs(var, &ty) {
            return Err(TypeError::InfiniteType {
                var,
                ty,
                reason: "occurs check",
            });
        }
        Ok(Subst::singleton(var, ty))
    }
}

/// A class-membership constraint on a (possibly multi-parameter) type.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ClassPredicate {
    pub class_name: Symbol,
    pub params: Vec<Type>,
}

impl ClassPredicate {
    pub fn new(class_name: Symbol, params: Vec<Type>) -> ClassPredicate {
        ClassPredicate { class_name, params }
    }

    pub fn repr(&self) -> String {
        let params: Vec<_> = self.params.iter().map(Type::repr).collect();
        format!("{} {}", self.class_name.as_str(), params.join(" "))
    }

    pub fn rebind(&self, subst: &Subst) -> ClassPredicate {
        ClassPredicate {
            class_name: self.class_name,
            params: self.params.iter().map(|p| p.rebind(subst)).collect(),
        }
    }

    pub fn free_vars(&self) -> BTreeSet<TyVar> {
        let mut out = BTreeSet::new();
        for p in &self.params {
            out.extend(p.free_vars());
        }
        out
    }
}

/// Total order over predicates: lexicographic over `class_name`, then over
/// `params[i].repr()` pairwise. Resolves the source's `operator<`, which had
/// `assert(false)` in place of a real comparison (see DESIGN.md).
impl Ord for ClassPredicate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.class_name
            .as_str()
            .cmp(other.class_name.as_str())
            .then_with(|| {
                self.params
                    .iter()
                    .map(Type::repr)
                    .cmp(other.params.iter().map(Type::repr))
            })
    }
}

impl PartialOrd for ClassPredicate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One constructor of an algebraic data type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataConstructor {
    pub ctor_name: Symbol,
    pub arg_types: Vec<Type>,
    pub parent_type: Symbol,
    /// Index among its parent type's constructors, in declaration order;
    /// used directly as the `SwitchInt` discriminant during lowering.
    pub tag: u32,
}

/// `∀vars. predicates ⇒ type`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Scheme {
    pub vars: Vec<TyVar>,
    pub predicates: Vec<ClassPredicate>,
    pub ty: Type,
}

impl Scheme {
    pub fn monomorphic(ty: Type) -> Scheme {
        Scheme {
            vars: Vec::new(),
            predicates: Vec::new(),
            ty,
        }
    }

    pub fn is_monomorphic(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn repr(&self) -> String {
        format!("{}", self.normalize())
    }

    /// Rename bound variables to a canonical sequence (`a0, a1, ...`) so
    /// scheme equality is decidable by `repr()`. Underlies `DefnId` equality.
    pub fn normalize(&self) -> Scheme {
        let mut subst = HashMap::new();
        for (i, v) in self.vars.iter().enumerate() {
            subst.insert(*v, Type::Var(Symbol::intern(&format!("a{i}")), BTreeSet::new()));
        }
        let subst = Subst(Rc::new(subst));
        Scheme {
            vars: (0..self.vars.len())
                .map(|i| Symbol::intern(&format!("a{i}")))
                .collect(),
            predicates: self.predicates.iter().map(|p| p.rebind(&subst)).collect(),
            ty: self.ty.rebind(&subst),
        }
    }

    /// Freshen bound variables, returning the instantiated type and the
    /// deferred predicates the caller must push onto the requirement set.
    pub fn instantiate(&self, fresh: &FreshCtx) -> (Type, Vec<ClassPredicate>) {
        if self.vars.is_empty() {
            return (self.ty.clone(), self.predicates.clone());
        }
        let mut map = HashMap::new();
        for v in &self.vars {
            let preds: BTreeSet<Symbol> = self
                .predicates
                .iter()
                .filter(|p| p.params.iter().any(|t| t.free_vars().contains(v)))
                .map(|p| p.class_name)
                .collect();
            map.insert(*v, Type::Var(fresh.next_var(), preds));
        }
        let subst = Subst(Rc::new(map));
        let ty = self.ty.rebind(&subst);
        let predicates = self.predicates.iter().map(|p| p.rebind(&subst)).collect();
        (ty, predicates)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.vars.is_empty() {
            let vars: Vec<_> = self.vars.iter().map(|v| v.as_str().to_string()).collect();
            write!(f, "forall {}. ", vars.join(" "))?;
        }
        if !self.predicates.is_empty() {
            let preds: Vec<_> = self.predicates.iter().map(ClassPredicate::repr).collect();
            write!(f, "({}) => ", preds.join(", "))?;
        }
        write!(f, "{}", self.ty.repr())
    }
}

/// Closes `ty` over its free variables not free in the ambient environment,
/// restricting each bound variable's predicate set to predicates mentioning
/// it.
pub fn generalize(ty: &Type, env_predicates: &HashMap<TyVar, BTreeSet<Symbol>>) -> Scheme {
    let ty_preds = ty.predicate_map();
    let env_vars: BTreeSet<TyVar> = env_predicates.keys().copied().collect();
    let vars: Vec<TyVar> = ty
        .free_vars()
        .into_iter()
        .filter(|v| !env_vars.contains(v))
        .collect();
    let mut predicates = Vec::new();
    for v in &vars {
        if let Some(classes) = ty_preds.get(v) {
            for class_name in classes {
                predicates.push(ClassPredicate::new(
                    *class_name,
                    vec![Type::Var(*v, BTreeSet::new())],
                ));
            }
        }
    }
    predicates.sort();
    Scheme {
        vars,
        predicates,
        ty: ty.clone(),
    }
}

/// `(name, normalized scheme)` — the identity of a monomorphic definition,
/// and the key the specializer's worklist is driven by.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DefnId {
    pub name: Symbol,
    pub scheme: Scheme,
}

impl DefnId {
    pub fn new(name: Symbol, scheme: Scheme) -> DefnId {
        DefnId {
            name,
            scheme: scheme.normalize(),
        }
    }
}

impl fmt::Display for DefnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.name.as_str(), self.scheme.ty.repr())
    }
}

/// Process-wide monotonic counter for fresh type variables. Single-threaded
/// per `Session`, so a `Cell` suffices.
#[derive(Default)]
pub struct FreshCtx {
    counter: Cell<u32>,
}

impl FreshCtx {
    pub fn new() -> FreshCtx {
        FreshCtx { counter: Cell::new(0) }
    }

    pub fn next_var(&self) -> TyVar {
        let n = self.counter.get();
        self.counter.set(n + 1);
        Symbol::intern(&format!("?t{n}"))
    }

    pub fn next_type(&self) -> Type {
        Type::Var(self.next_var(), BTreeSet::new())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("type mismatch ({reason}): expected {expected}, found {found}")]
    Mismatch {
        expected: Type,
        found: Type,
        reason: &'static str,
    },
    #[error("infinite type: '{}' occurs in {ty}", var.as_str())]
    InfiniteType {
        var: TyVar,
        ty: Type,
        reason: &'static str,
    },
    #[error("arity mismatch: expected {expected}, found {found}")]
    ArityMismatch {
        expected: usize,
        found: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Type {
        Type::Var(Symbol::intern(name), BTreeSet::new())
    }

    #[test]
    fn free_vars_of_arrow() {
        let ty = Type::arrow(var("a"), var("b"));
        let fv = ty.free_vars();
        assert!(fv.contains(&Symbol::intern("a")));
        assert!(fv.contains(&Symbol::intern("b")));
    }

    #[test]
    fn lambda_binds_its_variable() {
        let a = Symbol::intern("a");
        let ty = Type::Lambda(a, Box::new(var("a")));
        assert!(ty.free_vars().is_empty());
    }

    #[test]
    fn apply_beta_reduces() {
        let a = Symbol::intern("a");
        let lam = Type::Lambda(a, Box::new(Type::Tuple(vec![var("a"), var("a")])));
        let applied = lam.apply(&Type::Id(Symbol::intern("Int")));
        assert_eq!(
            applied,
            Type::Tuple(vec![Type::Id(Symbol::intern("Int")), Type::Id(Symbol::intern("Int"))])
        );
    }

    #[test]
    fn subst_composition_associative() {
        let a = Symbol::intern("a");
        let b = Symbol::intern("b");
        let c = Symbol::intern("c");
        let s1 = Subst::singleton(a, var("b"));
        let s2 = Subst::singleton(b, var("c"));
        let s3 = Subst::singleton(c, Type::Id(Symbol::intern("Int")));

        let left = Subst::compose(&Subst::compose(&s3, &s2), &s1);
        let right = Subst::compose(&s3, &Subst::compose(&s2, &s1));

        assert_eq!(var("a").rebind(&left), var("a").rebind(&right));
    }

    #[test]
    fn scheme_round_trip() {
        let a = Symbol::intern("a");
        let ty = Type::arrow(Type::Var(a, BTreeSet::new()), Type::Var(a, BTreeSet::new()));
        let scheme = generalize(&ty, &HashMap::new());
        let fresh = FreshCtx::new();
        let (instantiated, _) = scheme.instantiate(&fresh);
        // Structurally identical modulo the fresh variable's name.
        match instantiated.arrow_parts() {
            Some((from, to)) => assert_eq!(from, to),
            None => panic!("expected arrow"),
        }
    }

    #[test]
    fn normalize_is_stable_under_renaming() {
        let x = Symbol::intern("x");
        let y = Symbol::intern("y");
        let s1 = Scheme {
            vars: vec![x],
            predicates: vec![],
            ty: Type::Var(x, BTreeSet::new()),
        };
        let s2 = Scheme {
            vars: vec![y],
            predicates: vec![],
            ty: Type::Var(y, BTreeSet::new()),
        };
        assert_eq!(s1.normalize(), s2.normalize());
    }

    #[test]
    fn class_predicate_ordering_is_total() {
        let p1 = ClassPredicate::new(Symbol::intern("Eq"), vec![Type::Id(Symbol::intern("Int"))]);
        let p2 = ClassPredicate::new(Symbol::intern("Ord"), vec![Type::Id(Symbol::intern("Int"))]);
        assert!(p1 < p2);
    }
}
