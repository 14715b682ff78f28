//! Desugaring: walks the parsed surface tree, resolves names through
//! [`ScopeTree`], registers data constructors and type classes, and builds
//! the fresh-variable-seeded [`hir::Expr`] skeleton that [`crate::infer`]
//! then solves.
//!
//! The surface grammar (`faxc_par::ast`) is out of this crate's remit to
//! redesign — it is read here only for the shapes this language actually
//! uses (`fn`/`enum`/`trait`/`impl` items, `match`/`if`/closures at the
//! expression level). Surface forms with no meaning in an eagerly-evaluated,
//! immutable functional language (struct literals, field mutation, `async`)
//! are rejected with a diagnostic rather than silently accepted.

use crate::classes::{ClassDecl, ClassEnv, InstanceDecl};
use crate::hir::{Builtin, Expr, Literal, MatchArm};
use crate::infer::{apply_subst, Inferencer};
use crate::patterns::Pattern as PatternSet;
use crate::scope::{RibKind, ScopeTree};
use crate::types::{ClassPredicate, DataConstructor, Scheme, Type, TypeAliasEnv, TypeError};
use faxc_par::ast;
use faxc_util::diagnostic::DiagnosticBuilder;
use faxc_util::{DefId, DefIdGenerator, Handler, Span, Symbol};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

/// One analyzed top-level binding, with its generalized scheme and fully
/// type-resolved body.
pub struct Binding {
    pub name: Symbol,
    pub def_id: DefId,
    pub scheme: Scheme,
    pub body: Expr,
}

/// The result of analyzing a whole compilation unit: every top-level
/// binding plus the tables the specializer and class engine need downstream.
pub struct Module {
    pub bindings: Vec<Binding>,
    pub constructors: HashMap<Symbol, DataConstructor>,
    pub classes: ClassEnv,
    pub aliases: TypeAliasEnv,
}

pub struct Analyzer<'a> {
    scope: ScopeTree,
    def_ids: &'a DefIdGenerator,
    handler: &'a mut Handler,
    error_count: usize,
    constructors: HashMap<Symbol, DataConstructor>,
    classes: ClassEnv,
    aliases: TypeAliasEnv,
    /// Pending (name, def_id) pairs for functions, bound before bodies are
    /// lowered so mutually- and self-recursive calls resolve.
    fn_slots: HashMap<Symbol, DefId>,
    /// Schemes for every top-level function, seeded with a monomorphic
    /// placeholder at registration time and overwritten with the real
    /// generalized scheme once that function's body is inferred. Each
    /// function's `Inferencer` is seeded from this table so a call to an
    /// already-analyzed sibling is fully polymorphic, the same way `Fix`
    /// gives a function polymorphic access to itself; a call to a sibling
    /// not yet analyzed (forward reference, or mutual recursion) only sees
    /// the monomorphic placeholder, same limitation `Fix` already accepts
    /// for a single self-recursive binding, just extended across the group.
    sibling_schemes: HashMap<DefId, Scheme>,
}

impl<'a> Analyzer<'a> {
    pub fn new(def_ids: &'a DefIdGenerator, handler: &'a mut Handler) -> Analyzer<'a> {
        Analyzer {
            scope: ScopeTree::new(),
            def_ids,
            handler,
            error_count: 0,
            constructors: HashMap::new(),
            classes: ClassEnv::new(),
            aliases: TypeAliasEnv::new(),
            fn_slots: HashMap::new(),
            sibling_schemes: HashMap::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.error_count += 1;
        DiagnosticBuilder::error(message).span(span).emit(self.handler);
    }

    pub fn analyze(mut self, items: &[ast::Item]) -> Module {
        // Pass 1: register every enum's constructors and every class/instance
        // so forward references (a function used before its `enum` in
        // source order) resolve.
        for item in items {
            match item {
                ast::Item::Enum(e) => self.register_enum(e),
                ast::Item::Trait(t) => self.register_trait(t),
                ast::Item::Impl(i) => self.register_impl(i),
                ast::Item::Fn(f) => {
                    let def_id = self.def_ids.next();
                    self.scope.add_binding(f.name, def_id);
                    self.fn_slots.insert(f.name, def_id);
                    self.sibling_schemes.insert(def_id, Self::placeholder_scheme(def_id));
                }
                _ => {}
            }
        }

        // Pass 2: lower and infer every function body, including instance
        // methods — the specializer resolves a class method call by looking
        // up its mangled `Class/instanceType/method` name in `bindings`
        // (`register_impl` above only reserves the `DefId` and scope entry;
        // the body itself is lowered here like any other top-level function).
        let mut bindings = Vec::new();
        for item in items {
            match item {
                ast::Item::Fn(f) => {
                    let Some(def_id) = self.fn_slots.get(&f.name).copied() else { continue };
                    if let Some(binding) = self.analyze_fn_item(f.name, def_id, f) {
                        bindings.push(binding);
                    }
                }
                ast::Item::Impl(i) => {
                    let Some(trait_name) = i.trait_ref.as_ref().and_then(type_path_name) else { continue };
                    let instance_repr = Type::repr(&ast_type_to_ty(&i.self_ty));
                    for member in &i.items {
                        if let ast::ImplMember::Method(f) = member {
                            let mangled = Symbol::intern(&crate::classes::Dictionary::mangled_name(
                                trait_name,
                                &instance_repr,
                                f.name,
                            ));
                            let Some(def_id) = self.fn_slots.get(&mangled).copied() else { continue };
                            if let Some(binding) = self.analyze_fn_item(mangled, def_id, f) {
                                bindings.push(binding);
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        Module {
            bindings,
            constructors: self.constructors,
            classes: self.classes,
            aliases: self.aliases,
        }
    }

    fn register_enum(&mut self, item: &ast::EnumItem) {
        for (tag, variant) in item.variants.iter().enumerate() {
            let arg_types = match &variant.data {
                ast::VariantData::Unit => vec![],
                ast::VariantData::Tuple(tys) => tys.iter().map(ast_type_to_ty).collect(),
                ast::VariantData::Struct(fields) => fields.iter().map(|f| ast_type_to_ty(&f.ty)).collect(),
            };
            self.constructors.insert(
                variant.name,
                DataConstructor {
                    ctor_name: variant.name,
                    arg_types,
                    parent_type: item.name,
                    tag: tag as u32,
                },
            );
            let def_id = self.def_ids.next();
            self.scope.add_binding(variant.name, def_id);
        }
    }

    fn register_trait(&mut self, item: &ast::TraitItem) {
        let methods = item
            .items
            .iter()
            .filter_map(|m| match m {
                ast::TraitMember::Method(sig) => Some(sig.name),
                _ => None,
            })
            .collect();
        self.classes.add_class(ClassDecl {
            name: item.name,
            params: item.generics.iter().map(|g| g.name).collect(),
            superclasses: item.supertraits.iter().filter_map(type_path_name).collect(),
            methods,
        });
    }

    fn register_impl(&mut self, item: &ast::ImplItem) {
        let Some(trait_name) = item.trait_ref.as_ref().and_then(type_path_name) else {
            return;
        };
        let head = vec![ast_type_to_ty(&item.self_ty)];
        let instance_repr = head.iter().map(Type::repr).collect::<Vec<_>>().join(" ");
        let mut methods = HashMap::new();
        for member in &item.items {
            if let ast::ImplMember::Method(f) = member {
                let mangled = Symbol::intern(&crate::classes::Dictionary::mangled_name(trait_name, &instance_repr, f.name));
                methods.insert(f.name, mangled);
                let def_id = self.def_ids.next();
                self.scope.add_binding(mangled, def_id);
                self.fn_slots.insert(mangled, def_id);
                self.sibling_schemes.insert(def_id, Self::placeholder_scheme(def_id));
            }
        }
        self.classes.add_instance(InstanceDecl { class_name: trait_name, head, methods });
    }

    /// A fresh, unconstrained monomorphic scheme used to seed `sibling_schemes`
    /// for a function that hasn't been analyzed yet, so a forward reference or
    /// a mutually-recursive call still type-checks (just without polymorphism
    /// until that sibling's real scheme is known).
    fn placeholder_scheme(def_id: DefId) -> Scheme {
        Scheme::monomorphic(Type::Var(Symbol::intern(&format!("?sib{}", def_id.0)), BTreeSet::new()))
    }

    /// Lowers and infers one function body — a top-level `fn` or an instance
    /// method — under `binding_name`/`def_id` already reserved in pass 1.
    fn analyze_fn_item(&mut self, binding_name: Symbol, def_id: DefId, item: &ast::FnItem) -> Option<Binding> {
        self.scope.enter_scope(RibKind::Function);

        let mut inf = Inferencer::new(self.classes.clone(), self.aliases.clone(), self.constructors.clone());
        // Give this function polymorphic access to every sibling already
        // analyzed (mirrors the `Fix` self-recursion placeholder, extended
        // across the whole top-level group); siblings not yet analyzed still
        // resolve, just monomorphically, via their placeholder.
        inf.schemes = self.sibling_schemes.clone();

        let mut param_ids = Vec::new();
        for p in &item.params {
            let pid = self.def_ids.next();
            self.scope.add_binding(p.name, pid);
            let ty = ast_type_to_ty(&p.ty);
            inf.bind(pid, Scheme::monomorphic(ty));
            param_ids.push((pid, p.name));
        }

        let body = self.lower_block(&item.body, &mut inf);
        self.scope.exit_scope();

        // Curry: `fn f(a, b) = body` becomes `Fix(f, \a -> \b -> body)`.
        let mut curried = body;
        for (pid, _) in param_ids.iter().rev() {
            let param_ty = match inf.schemes.get(pid) {
                Some(s) => s.ty.clone(),
                None => inf.fresh.next_type(),
            };
            curried = Expr::Lambda {
                param: *pid,
                param_ty,
                body: Rc::new(curried),
                ty: Type::unit(),
                span: item.span,
            };
        }
        let fix = Expr::Fix { binding: def_id, value: Rc::new(curried), ty: Type::unit(), span: item.span };

        match inf.infer(&fix) {
            Ok((ty, subst)) => {
                let resolved = apply_subst(&fix, &subst);
                let ty = ty.rebind(&subst);
                let scheme = crate::types::generalize(&ty, &HashMap::new());
                if let Err(e) = self.classes.discharge_all(&scheme.predicates) {
                    self.error(e.to_string(), item.span);
                }
                // Later siblings now see this function's real scheme instead
                // of its placeholder.
                self.sibling_schemes.insert(def_id, scheme.clone());
                Some(Binding { name: binding_name, def_id, scheme, body: resolved })
            }
            Err(e) => {
                self.error(e.to_string(), item.span);
                None
            }
        }
    }

    fn lower_block(&mut self, block: &ast::Block, inf: &mut Inferencer) -> Expr {
        self.scope.enter_scope(RibKind::Block);
        let mut stmts = Vec::new();
        let mut tail: Option<Expr> = None;
        for (i, stmt) in block.stmts.iter().enumerate() {
            let is_last = i + 1 == block.stmts.len();
            match stmt {
                ast::Stmt::Let(l) => {
                    let value = self.lower_expr(&l.init.as_ref().unwrap_or(&ast::Expr::Tuple(vec![])), inf);
                    let pid = self.def_ids.next();
                    self.scope.add_binding(binding_name(&l.pattern), pid);
                    inf.bind(pid, Scheme::monomorphic(inf.fresh.next_type()));
                    // Represented as `Let` wrapping the remaining statements;
                    // folded below once the tail is known.
                    stmts.push((pid, value));
                }
                ast::Stmt::Expr(e) => {
                    if is_last {
                        tail = Some(self.lower_expr(e, inf));
                    } else {
                        stmts.push((self.def_ids.next(), self.lower_expr(e, inf)));
                    }
                }
                ast::Stmt::Return(e) => {
                    let value = e.as_ref().map(|e| Rc::new(self.lower_expr(e, inf)));
                    tail = Some(Expr::Return { value, span: Span::default() });
                }
                _ => self.error("unsupported statement form", Span::default()),
            }
        }
        if tail.is_none() {
            if let Some(trailing) = &block.trailing {
                tail = Some(self.lower_expr(trailing, inf));
            }
        }
        let mut result = tail.unwrap_or(Expr::Tuple { elems: vec![], ty: Type::unit(), span: Span::default() });
        for (pid, value) in stmts.into_iter().rev() {
            result = Expr::Let {
                binding: pid,
                value: Rc::new(value),
                body: Rc::new(result),
                ty: Type::unit(),
                span: Span::default(),
            };
        }
        self.scope.exit_scope();
        result
    }

    fn lower_expr(&mut self, expr: &ast::Expr, inf: &mut Inferencer) -> Expr {
        let fresh_ty = inf.fresh.next_type();
        match expr {
            ast::Expr::Literal(lit) => Expr::Literal(lower_literal(lit), Span::default()),
            ast::Expr::Path(path) => {
                let name = path.segments.last().map(|s| s.ident).unwrap_or_else(|| Symbol::intern("_"));
                match self.scope.resolve(name) {
                    Some(def_id) => Expr::Var(def_id, Span::default()),
                    None => {
                        self.error(format!("unresolved name `{}`", name.as_str()), Span::default());
                        Expr::Literal(Literal::Int(0), Span::default())
                    }
                }
            }
            ast::Expr::Binary(b) => {
                let left = self.lower_expr(&b.left, inf);
                let right = self.lower_expr(&b.right, inf);
                Expr::Builtin { op: lower_binop(b.op), args: vec![left, right], ty: fresh_ty, span: b.span }
            }
            ast::Expr::Unary(u) => {
                let operand = self.lower_expr(&u.expr, inf);
                let op = match u.op {
                    ast::UnOp::Neg => Builtin::Negate,
                    ast::UnOp::Not => Builtin::Not,
                    _ => {
                        self.error("unsupported unary operator", u.span);
                        Builtin::Not
                    }
                };
                Expr::Builtin { op, args: vec![operand], ty: fresh_ty, span: u.span }
            }
            ast::Expr::Call(c) => {
                let func = self.lower_expr(&c.func, inf);
                let mut result = func;
                for arg in &c.args {
                    let arg = self.lower_expr(arg, inf);
                    result = Expr::Application {
                        func: Rc::new(result),
                        arg: Rc::new(arg),
                        ty: inf.fresh.next_type(),
                        span: c.span,
                    };
                }
                result
            }
            ast::Expr::Block(b) => self.lower_block(b, inf),
            ast::Expr::If(i) => {
                let cond = self.lower_expr(&i.cond, inf);
                let then_branch = self.lower_block(&i.then_block, inf);
                let else_branch = match &i.else_block {
                    Some(e) => self.lower_expr(e, inf),
                    None => Expr::Tuple { elems: vec![], ty: Type::unit(), span: Span::default() },
                };
                Expr::Conditional {
                    cond: Rc::new(cond),
                    then_branch: Rc::new(then_branch),
                    else_branch: Rc::new(else_branch),
                    ty: fresh_ty,
                    span: Span::default(),
                }
            }
            ast::Expr::Match(m) => self.lower_match(m, inf),
            ast::Expr::Closure(c) => {
                self.scope.enter_scope(RibKind::Function);
                let mut param_ids = Vec::new();
                for p in &c.params {
                    let pid = self.def_ids.next();
                    self.scope.add_binding(p.name, pid);
                    let ty = ast_type_to_ty(&p.ty);
                    inf.bind(pid, Scheme::monomorphic(ty.clone()));
                    param_ids.push((pid, ty));
                }
                let body = self.lower_expr(&c.body, inf);
                self.scope.exit_scope();
                let mut curried = body;
                for (pid, ty) in param_ids.into_iter().rev() {
                    curried = Expr::Lambda { param: pid, param_ty: ty, body: Rc::new(curried), ty: Type::unit(), span: Span::default() };
                }
                curried
            }
            ast::Expr::Tuple(elems) => {
                let elems = elems.iter().map(|e| self.lower_expr(e, inf)).collect();
                Expr::Tuple { elems, ty: fresh_ty, span: Span::default() }
            }
            ast::Expr::Cast(e, ty) => Expr::As {
                expr: Rc::new(self.lower_expr(e, inf)),
                ty: ast_type_to_ty(ty),
                force_cast: false,
                span: Span::default(),
            },
            ast::Expr::Return(e) => Expr::Return {
                value: e.as_ref().map(|e| Rc::new(self.lower_expr(e, inf))),
                span: Span::default(),
            },
            ast::Expr::Break(_, _) => Expr::Break(Span::default()),
            ast::Expr::Continue(_) => Expr::Continue(Span::default()),
            _ => {
                self.error("this expression form has no meaning in an immutable, eagerly-evaluated functional language", Span::default());
                Expr::Literal(Literal::Int(0), Span::default())
            }
        }
    }

    fn lower_match(&mut self, m: &ast::MatchExpr, inf: &mut Inferencer) -> Expr {
        let scrutinee = self.lower_expr(&m.scrutinee, inf);
        let mut arms = Vec::new();
        for arm in &m.arms {
            self.scope.enter_scope(RibKind::Block);
            let (pattern, bindings) = self.lower_pattern(&arm.pattern, inf);
            let body = self.lower_expr(&arm.body, inf);
            self.scope.exit_scope();
            arms.push(MatchArm { pattern, bindings, body: Rc::new(body), span: Span::default() });
        }
        Expr::Match { scrutinee: Rc::new(scrutinee), arms, ty: inf.fresh.next_type(), span: Span::default() }
    }

    fn lower_pattern(&mut self, pattern: &ast::Pattern, inf: &mut Inferencer) -> (PatternSet, Vec<(Symbol, DefId)>) {
        match pattern {
            ast::Pattern::Wildcard => (PatternSet::AllOf(inf.fresh.next_type()), vec![]),
            ast::Pattern::Ident(name, _) => {
                let pid = self.def_ids.next();
                self.scope.add_binding(*name, pid);
                inf.bind(pid, Scheme::monomorphic(inf.fresh.next_type()));
                (PatternSet::AllOf(inf.fresh.next_type()), vec![(*name, pid)])
            }
            ast::Pattern::Literal(lit) => (literal_pattern(lit), vec![]),
            ast::Pattern::Path(path) => {
                let name = path.segments.last().map(|s| s.ident).unwrap_or_else(|| Symbol::intern("_"));
                (PatternSet::Ctor(name, vec![]), vec![])
            }
            ast::Pattern::TupleStruct(path, sub) => {
                let name = path.segments.last().map(|s| s.ident).unwrap_or_else(|| Symbol::intern("_"));
                let mut fields = Vec::new();
                let mut bindings = Vec::new();
                for p in sub {
                    let (pat, binds) = self.lower_pattern(p, inf);
                    fields.push(pat);
                    bindings.extend(binds);
                }
                (PatternSet::Ctor(name, fields), bindings)
            }
            ast::Pattern::Tuple(sub) => {
                // Tuples aren't constructor-tagged; model as a single
                // all-covering pattern with per-field bindings collected.
                let mut bindings = Vec::new();
                for p in sub {
                    let (_, binds) = self.lower_pattern(p, inf);
                    bindings.extend(binds);
                }
                (PatternSet::AllOf(Type::Tuple(vec![])), bindings)
            }
            _ => {
                self.error("unsupported pattern form", Span::default());
                (PatternSet::Nothing, vec![])
            }
        }
    }
}

fn binding_name(pattern: &ast::Pattern) -> Symbol {
    match pattern {
        ast::Pattern::Ident(name, _) => *name,
        _ => Symbol::intern("_"),
    }
}

fn lower_literal(lit: &ast::Literal) -> Literal {
    match lit {
        ast::Literal::Int(n) => Literal::Int(*n),
        ast::Literal::Float(f) => Literal::Float(*f),
        ast::Literal::String(s) => Literal::Str(s.as_str().to_string()),
        ast::Literal::Char(c) => Literal::Int(*c as i64),
        ast::Literal::Bool(b) => Literal::Bool(*b),
        ast::Literal::Unit => Literal::Bool(true),
    }
}

fn literal_pattern(lit: &ast::Literal) -> PatternSet {
    use crate::patterns::{Polarity, ScalarKind, ScalarLit};
    let mut set = std::collections::BTreeSet::new();
    match lit {
        ast::Literal::Int(n) => {
            set.insert(ScalarLit::Int(*n));
            PatternSet::Scalars(Polarity::Include, ScalarKind::Ints, set)
        }
        ast::Literal::String(s) => {
            set.insert(ScalarLit::Str(s.as_str().to_string()));
            PatternSet::Scalars(Polarity::Include, ScalarKind::Strings, set)
        }
        ast::Literal::Bool(b) => PatternSet::Ctor(Symbol::intern(if *b { "True" } else { "False" }), vec![]),
        _ => PatternSet::Nothing,
    }
}

fn lower_binop(op: ast::BinOp) -> Builtin {
    match op {
        ast::BinOp::Add => Builtin::AddInt,
        ast::BinOp::Sub => Builtin::SubInt,
        ast::BinOp::Mul => Builtin::MulInt,
        ast::BinOp::Div => Builtin::DivInt,
        ast::BinOp::Mod => Builtin::ModInt,
        ast::BinOp::Eq => Builtin::CmpEq,
        ast::BinOp::Lt => Builtin::CmpLt,
        ast::BinOp::Le => Builtin::CmpLte,
        ast::BinOp::Gt => Builtin::CmpGt,
        ast::BinOp::Ge => Builtin::CmpGte,
        _ => Builtin::CmpEq,
    }
}

fn path_name(path: &ast::Path) -> Option<Symbol> {
    path.segments.last().map(|s| s.ident)
}

fn type_path_name(ty: &ast::Type) -> Option<Symbol> {
    match ty {
        ast::Type::Path(p) => path_name(p),
        _ => None,
    }
}

fn ast_type_to_ty(ty: &ast::Type) -> Type {
    match ty {
        ast::Type::Path(p) => match path_name(p) {
            Some(name) => Type::Id(name),
            None => Type::Id(Symbol::intern("Int")),
        },
        ast::Type::Generic(base, args) => {
            let mut ty = ast_type_to_ty(base);
            for arg in args {
                ty = Type::Operator(Box::new(ty), Box::new(ast_type_to_ty(arg)));
            }
            ty
        }
        ast::Type::Tuple(tys) => Type::Tuple(tys.iter().map(ast_type_to_ty).collect()),
        ast::Type::Fn(params, ret) => {
            let ret = ast_type_to_ty(ret);
            params.iter().rev().fold(ret, |acc, p| Type::arrow(ast_type_to_ty(p), acc))
        }
        _ => Type::Id(Symbol::intern("Int")),
    }
}
