//! The typed high-level IR: the output of the analyzer and the input to the
//! specializer. Every node carries the [`Type`] inference settled on it.

use crate::patterns::Pattern;
use crate::types::{Scheme, Type};
use faxc_util::{DefId, Span, Symbol};
use std::collections::HashMap;
use std::rc::Rc;

/// A loop label, for labeled `break`/`continue` (`break 'outer`). Shares the
/// symbol table with identifiers since labels live in the same lexical rib
/// kind the scope tree already tracks.
pub type LabelId = Symbol;

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
    AddInt,
    SubInt,
    MulInt,
    DivInt,
    ModInt,
    AddFloat,
    SubFloat,
    MulFloat,
    DivFloat,
    CmpEq,
    CmpLt,
    CmpLte,
    CmpGt,
    CmpGte,
    Not,
    Negate,
    StrConcat,
    Print,
}

/// One arm of a `match`, pairing the scrutinized shape with its guard body.
#[derive(Clone, Debug)]
pub struct MatchArm {
    pub pattern: Pattern,
    /// Names bound by this arm's constructor pattern, in field order, paired
    /// with the `DefId` the arm body refers to them by.
    pub bindings: Vec<(Symbol, DefId)>,
    pub body: Rc<Expr>,
    pub span: Span,
}

/// The typed expression grammar. Nineteen node kinds total (`Break` and
/// `Continue` are distinct nodes, both under the umbrella of loop control).
#[derive(Clone, Debug)]
pub enum Expr {
    Literal(Literal, Span),
    Var(DefId, Span),
    Lambda {
        param: DefId,
        param_ty: Type,
        body: Rc<Expr>,
        ty: Type,
        span: Span,
    },
    Application {
        func: Rc<Expr>,
        arg: Rc<Expr>,
        ty: Type,
        span: Span,
    },
    Let {
        binding: DefId,
        value: Rc<Expr>,
        body: Rc<Expr>,
        ty: Type,
        span: Span,
    },
    /// A recursive binding, introduced at inference time for every
    /// self-referential definition so specialization never has to detect
    /// recursion on its own — polymorphic recursion is always routed through
    /// this node rather than discovered later.
    Fix {
        binding: DefId,
        value: Rc<Expr>,
        ty: Type,
        span: Span,
    },
    Conditional {
        cond: Rc<Expr>,
        then_branch: Rc<Expr>,
        else_branch: Rc<Expr>,
        ty: Type,
        span: Span,
    },
    While {
        cond: Rc<Expr>,
        body: Rc<Expr>,
        span: Span,
    },
    Block {
        stmts: Vec<Expr>,
        result: Rc<Expr>,
        ty: Type,
        span: Span,
    },
    Return {
        value: Option<Rc<Expr>>,
        span: Span,
    },
    Tuple {
        elems: Vec<Expr>,
        ty: Type,
        span: Span,
    },
    TupleDeref {
        tuple: Rc<Expr>,
        index: usize,
        ty: Type,
        span: Span,
    },
    /// An explicit type ascription/cast. `force_cast` distinguishes a
    /// user-written annotation (`false`) from a specializer-synthesized
    /// re-inference marker (`true`), which must not re-emit diagnostics.
    As {
        expr: Rc<Expr>,
        ty: Type,
        force_cast: bool,
        span: Span,
    },
    Sizeof {
        ty: Type,
        span: Span,
    },
    Builtin {
        op: Builtin,
        args: Vec<Expr>,
        ty: Type,
        span: Span,
    },
    Break(Span),
    Continue(Span),
    Match {
        scrutinee: Rc<Expr>,
        arms: Vec<MatchArm>,
        ty: Type,
        span: Span,
    },
    StaticPrint {
        message: String,
        span: Span,
    },
}

impl Expr {
    pub fn ty(&self) -> Type {
        match self {
            Expr::Literal(lit, _) => match lit {
                Literal::Int(_) => Type::Id(Symbol::intern("Int")),
                Literal::Float(_) => Type::Id(Symbol::intern("Float")),
                Literal::Str(_) => Type::Id(Symbol::intern("String")),
                Literal::Bool(_) => Type::Id(Symbol::intern("Bool")),
            },
            Expr::Var(_, _) => Type::unit(),
            Expr::Lambda { ty, .. }
            | Expr::Application { ty, .. }
            | Expr::Let { ty, .. }
            | Expr::Fix { ty, .. }
            | Expr::Conditional { ty, .. }
            | Expr::Block { ty, .. }
            | Expr::Tuple { ty, .. }
            | Expr::TupleDeref { ty, .. }
            | Expr::As { ty, .. }
            | Expr::Sizeof { ty, .. }
            | Expr::Builtin { ty, .. }
            | Expr::Match { ty, .. } => ty.clone(),
            Expr::While { .. }
            | Expr::Return { .. }
            | Expr::Break(_)
            | Expr::Continue(_)
            | Expr::StaticPrint { .. } => Type::unit(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(_, s)
            | Expr::Var(_, s)
            | Expr::Lambda { span: s, .. }
            | Expr::Application { span: s, .. }
            | Expr::Let { span: s, .. }
            | Expr::Fix { span: s, .. }
            | Expr::Conditional { span: s, .. }
            | Expr::While { span: s, .. }
            | Expr::Block { span: s, .. }
            | Expr::Return { span: s, .. }
            | Expr::Tuple { span: s, .. }
            | Expr::TupleDeref { span: s, .. }
            | Expr::As { span: s, .. }
            | Expr::Sizeof { span: s, .. }
            | Expr::Builtin { span: s, .. }
            | Expr::Break(s)
            | Expr::Continue(s)
            | Expr::Match { span: s, .. }
            | Expr::StaticPrint { span: s, .. } => *s,
        }
    }
}

/// Maps names visible at a point in the source to the `(DefId, Scheme)` they
/// resolve to. A chain of immutable frames sharing structure via `Rc`, so
/// extending the environment down one branch of a `let`/`lambda` never
/// disturbs a sibling branch's view of it.
#[derive(Clone, Debug, Default)]
pub struct Environment {
    parent: Option<Rc<Environment>>,
    frame: HashMap<Symbol, (DefId, Scheme)>,
}

impl Environment {
    pub fn new() -> Environment {
        Environment::default()
    }

    pub fn lookup(&self, name: Symbol) -> Option<&(DefId, Scheme)> {
        self.frame.get(&name).or_else(|| self.parent.as_ref().and_then(|p| p.lookup(name)))
    }

    pub fn bind(&self, name: Symbol, def_id: DefId, scheme: Scheme) -> Environment {
        let mut frame = HashMap::new();
        frame.insert(name, (def_id, scheme));
        Environment {
            parent: Some(Rc::new(self.clone())),
            frame,
        }
    }

    /// All bindings visible here, innermost frame first; used by
    /// generalization to compute the ambient set of free predicate vars.
    pub fn free_predicate_vars(&self) -> HashMap<crate::types::TyVar, std::collections::BTreeSet<Symbol>> {
        let mut out = HashMap::new();
        let mut cur = Some(self);
        while let Some(env) = cur {
            for (_, scheme) in env.frame.values() {
                for v in scheme.ty.free_vars() {
                    out.entry(v).or_insert_with(std::collections::BTreeSet::new);
                }
            }
            cur = env.parent.as_deref();
        }
        out
    }
}
