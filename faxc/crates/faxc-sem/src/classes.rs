//! The class-predicate engine: instance resolution and dictionary witnessing.
//!
//! Coherence is checked at discharge time only — "does exactly one instance
//! match this predicate" — rather than at declaration time. Two overlapping
//! instance declarations are only an error if some concrete predicate
//! actually discharges against both; see DESIGN.md for why declaration-time
//! overlap checking was dropped.

use crate::types::{ClassPredicate, Type, TypeError};
use faxc_util::Symbol;
use std::collections::HashMap;

/// A `class Name params where { method: Scheme, ... }` declaration.
#[derive(Clone, Debug)]
pub struct ClassDecl {
    pub name: Symbol,
    pub params: Vec<Symbol>,
    pub superclasses: Vec<Symbol>,
    pub methods: Vec<Symbol>,
}

/// An `instance Name ConcreteType where { ... }` declaration.
#[derive(Clone, Debug)]
pub struct InstanceDecl {
    pub class_name: Symbol,
    /// The head type each instance parameter was fixed to, in declaration
    /// order; matched against a predicate's `params` structurally.
    pub head: Vec<Type>,
    pub methods: HashMap<Symbol, Symbol>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ClassError {
    #[error("no instance satisfies `{}`", .0.repr())]
    NoMatchingInstance(ClassPredicate),
    #[error("{1} instances satisfy `{}`, expected exactly one", .0.repr())]
    AmbiguousInstance(ClassPredicate, usize),
    #[error("unknown class `{}`", .0.as_str())]
    UnknownClass(Symbol),
    #[error("class `{}` has no method `{}`", .0.as_str(), .1.as_str())]
    UnknownMethod(Symbol, Symbol),
}

impl From<ClassError> for TypeError {
    fn from(e: ClassError) -> TypeError {
        // Class errors surface through the same diagnostic channel as type
        // errors; callers that need the richer variant match on it before
        // this conversion.
        TypeError::Mismatch {
            expected: Type::unit(),
            found: Type::unit(),
            reason: match e {
                ClassError::NoMatchingInstance(_) => "no matching instance",
                ClassError::AmbiguousInstance(..) => "ambiguous instance",
                ClassError::UnknownClass(_) => "unknown class",
                ClassError::UnknownMethod(..) => "unknown method",
            },
        }
    }
}

/// The set of class and instance declarations visible during inference,
/// plus the dictionary-witness table built as instances discharge.
#[derive(Default, Clone)]
pub struct ClassEnv {
    classes: HashMap<Symbol, ClassDecl>,
    instances: Vec<InstanceDecl>,
}

impl ClassEnv {
    pub fn new() -> ClassEnv {
        ClassEnv::default()
    }

    pub fn add_class(&mut self, decl: ClassDecl) {
        self.classes.insert(decl.name, decl);
    }

    pub fn add_instance(&mut self, decl: InstanceDecl) {
        self.instances.push(decl);
    }

    pub fn class(&self, name: Symbol) -> Option<&ClassDecl> {
        self.classes.get(&name)
    }

    /// Instances whose head structurally matches `predicate.params` after
    /// `ty.eval`-style normalization has already happened upstream.
    fn matching_instances(&self, predicate: &ClassPredicate) -> Vec<&InstanceDecl> {
        self.instances
            .iter()
            .filter(|inst| {
                inst.class_name == predicate.class_name
                    && inst.head.len() == predicate.params.len()
                    && inst
                        .head
                        .iter()
                        .zip(predicate.params.iter())
                        .all(|(h, p)| instance_head_matches(h, p))
            })
            .collect()
    }

    /// Resolve a single predicate to its dictionary witness, recursing into
    /// superclasses first so a subclass method can call a superclass method
    /// on the same witness.
    pub fn discharge(&self, predicate: &ClassPredicate) -> Result<Dictionary, ClassError> {
        if !self.classes.contains_key(&predicate.class_name) {
            return Err(ClassError::UnknownClass(predicate.class_name));
        }
        let candidates = self.matching_instances(predicate);
        match candidates.len() {
            0 => Err(ClassError::NoMatchingInstance(predicate.clone())),
            1 => {
                let inst = candidates[0];
                let class = &self.classes[&predicate.class_name];
                let mut superclass_dicts = Vec::new();
                for sup in &class.superclasses {
                    let sup_pred = ClassPredicate::new(*sup, predicate.params.clone());
                    superclass_dicts.push(self.discharge(&sup_pred)?);
                }
                Ok(Dictionary {
                    class_name: predicate.class_name,
                    instance_repr: instance_type_repr(inst),
                    methods: inst.methods.clone(),
                    superclasses: superclass_dicts,
                })
            }
            n => Err(ClassError::AmbiguousInstance(predicate.clone(), n)),
        }
    }

    /// Discharge every predicate in a requirement set, short-circuiting on
    /// the first failure. Order doesn't matter for correctness since each
    /// predicate is resolved independently, but callers that want stable
    /// diagnostics should sort first.
    pub fn discharge_all(&self, predicates: &[ClassPredicate]) -> Result<Vec<Dictionary>, ClassError> {
        predicates.iter().map(|p| self.discharge(p)).collect()
    }

    /// The mangled symbol a call to `class_name::method` resolves to once a
    /// predicate has been discharged to a concrete instance.
    pub fn resolve_method(&self, dict: &Dictionary, method: Symbol) -> Result<Symbol, ClassError> {
        if let Some(sym) = dict.methods.get(&method) {
            return Ok(*sym);
        }
        for sup in &dict.superclasses {
            if let Ok(sym) = self.resolve_method(sup, method) {
                return Ok(sym);
            }
        }
        Err(ClassError::UnknownMethod(dict.class_name, method))
    }
}

fn instance_head_matches(head: &Type, predicate_param: &Type) -> bool {
    // A predicate to discharge always carries a concrete type by the time it
    // reaches the class engine (type variables are resolved by the unifier
    // first); structural equality on `repr()` is therefore exact match, not
    // an approximation.
    head.repr() == predicate_param.repr()
}

fn instance_type_repr(inst: &InstanceDecl) -> String {
    inst.head.iter().map(Type::repr).collect::<Vec<_>>().join(" ")
}

/// A resolved dictionary: the concrete method table an instance provides,
/// plus its superclass dictionaries so method lookup can walk up the chain.
#[derive(Clone, Debug)]
pub struct Dictionary {
    pub class_name: Symbol,
    pub instance_repr: String,
    pub methods: HashMap<Symbol, Symbol>,
    pub superclasses: Vec<Dictionary>,
}

impl Dictionary {
    /// The deterministic name a method is emitted under:
    /// `Class::instanceType::method`.
    pub fn mangled_name(class_name: Symbol, instance_repr: &str, method: Symbol) -> String {
        format!("{}::{}::{}", class_name.as_str(), instance_repr, method.as_str())
    }
}
