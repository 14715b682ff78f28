//! Closure conversion and SSA-friendly lowering: turns one specializer-translated,
//! fully-monomorphic [`faxc_sem::Expr`] into one or more [`Function`]s — one per
//! `Lambda`, since every call in this IR goes through the uniform `(arg, env_ptr)`
//! closure calling convention, top-level functions included.
//!
//! The env argument is always a tuple: slot 0 stands in for the function's own
//! arrow type (the "function pointer" slot `faxc-gen` fills in at emission
//! time), the remaining slots are this function's captured free variables in
//! first-occurrence order. A top-level function with no captures still gets
//! an env tuple of just slot 0, so every call site uses one calling
//! convention regardless of whether the callee happens to close over
//! anything.

use crate::mir::*;
use crate::specialize::{span_key, SpanKey, SpecializedUnit};
use faxc_sem::hir::{Builtin, Literal, MatchArm};
use faxc_sem::{DefnId, Expr, Type};
use faxc_util::{DefId, DefIdGenerator, Span, Symbol};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

#[derive(Debug, Clone, thiserror::Error)]
pub enum LoweringError {
    #[error("reference to `{0:?}` resolves to neither a local binding nor a known global")]
    UnresolvedName(DefId),
    #[error("tuple projection out of range: index {index} on a {arity}-tuple")]
    TupleIndexOutOfRange { index: usize, arity: usize },
    #[error("`break`/`continue` outside of a loop")]
    LoopControlOutsideLoop,
}

/// The finished output of lowering a whole specialized program: every
/// generated function plus the `DefId -> Symbol` registry `faxc-gen` needs
/// to resolve an `AggregateKind::Closure` to the function it names.
pub struct Program {
    pub functions: Vec<Function>,
    pub function_ids: HashMap<DefId, Symbol>,
}

/// Per-function lowering state: which `mir` local each source name is bound
/// to, and that local's declared type (needed when a nested lambda captures
/// it and must know what type to give the captured slot).
#[derive(Clone, Default)]
struct Scope {
    locals: HashMap<DefId, LocalId>,
    types: HashMap<DefId, Type>,
}

impl Scope {
    fn bind(&mut self, id: DefId, local: LocalId, ty: Type) {
        self.locals.insert(id, local);
        self.types.insert(id, ty);
    }
}

pub struct LowerDriver<'d> {
    def_ids: &'d DefIdGenerator,
    function_ids: HashMap<Symbol, DefId>,
    functions: Vec<Function>,
    lambda_counter: u32,
}

impl<'d> LowerDriver<'d> {
    pub fn new(def_ids: &'d DefIdGenerator) -> LowerDriver<'d> {
        LowerDriver {
            def_ids,
            function_ids: HashMap::new(),
            functions: Vec::new(),
            lambda_counter: 0,
        }
    }

    pub fn lower_program(mut self, translation_map: &HashMap<DefnId, SpecializedUnit>) -> Result<Program, LoweringError> {
        // Every top-level name gets its DefId minted up front so a call
        // site visited before its callee's own turn still resolves.
        for defn_id in translation_map.keys() {
            self.mangled_id(defn_id);
        }
        for (defn_id, unit) in translation_map {
            self.lower_unit(defn_id, unit)?;
        }
        let function_ids = self.function_ids.iter().map(|(name, id)| (*id, *name)).collect();
        Ok(Program { functions: self.functions, function_ids })
    }

    fn mangled_id(&mut self, defn_id: &DefnId) -> (Symbol, DefId) {
        let name = Symbol::intern(&defn_id.to_string());
        let id = *self.function_ids.entry(name).or_insert_with(|| self.def_ids.next());
        (name, id)
    }

    fn fresh_lambda_name(&mut self, base: Symbol) -> (Symbol, DefId) {
        self.lambda_counter += 1;
        let name = Symbol::intern(&format!("{}::lambda{}", base.as_str(), self.lambda_counter));
        let id = self.def_ids.next();
        self.function_ids.insert(name, id);
        (name, id)
    }

    fn lower_unit(&mut self, defn_id: &DefnId, unit: &SpecializedUnit) -> Result<(), LoweringError> {
        let (name, _id) = self.mangled_id(defn_id);
        let body = match &unit.expr {
            Expr::Fix { value, .. } => value.as_ref(),
            other => other,
        };
        self.lower_lambda_chain(name, body, &unit.call_targets)
    }

    /// A curried `fn f(a, b) = body` reaches this as nested `Lambda`s; each
    /// layer becomes its own top-level function named `name`, `name::curry1`,
    /// ... A non-function top-level binding (a constant) becomes a
    /// zero-argument function.
    fn lower_lambda_chain(&mut self, name: Symbol, expr: &Expr, call_targets: &HashMap<SpanKey, DefnId>) -> Result<(), LoweringError> {
        match expr {
            Expr::Lambda { param, param_ty, body, ty, span } => {
                let ret_ty = ty.arrow_parts().map(|(_, to)| to.clone()).unwrap_or_else(|| body.ty());
                self.lower_one_function(name, *param, param_ty.clone(), body, ret_ty, *span, call_targets, &[])
            }
            other => {
                let unit_ty = Type::unit();
                self.lower_one_function(name, DefId::DUMMY, unit_ty, other, other.ty(), other.span(), call_targets, &[])
            }
        }
    }

    /// Lowers one lambda layer into its own [`Function`]. `captures` lists the
    /// free variables this closure needs, each already known by its
    /// enclosing scope's local/type (empty for a top-level, non-capturing
    /// function).
    fn lower_one_function(
        &mut self,
        name: Symbol,
        param: DefId,
        param_ty: Type,
        body: &Expr,
        ret_ty: Type,
        span: Span,
        call_targets: &HashMap<SpanKey, DefnId>,
        captures: &[(DefId, Type, LocalId)],
    ) -> Result<(), LoweringError> {
        let own_ty = Type::arrow(param_ty.clone(), ret_ty.clone());
        let env_ty = Type::Tuple(std::iter::once(own_ty).chain(captures.iter().map(|(_, t, _)| t.clone())).collect());

        let mut builder = Builder::new(name, ret_ty, 2);
        let param_local = builder.add_arg(param_ty.clone(), None);
        let env_local = builder.add_arg(env_ty, None);

        let mut scope = Scope::default();
        if param != DefId::DUMMY {
            scope.bind(param, param_local, param_ty);
        }
        for (i, (def_id, cap_ty, _)) in captures.iter().enumerate() {
            let projected = Place::Projection(Box::new(Place::Local(env_local)), Projection::Field((i + 1) as u32));
            let local = builder.add_local(cap_ty.clone(), None);
            builder.assign(Place::Local(local), Rvalue::Use(Operand::Copy(projected)));
            scope.bind(*def_id, local, cap_ty.clone());
        }

        let mut fl = FnLowerer { driver: self, builder: &mut builder, call_targets, loop_targets: Vec::new() };
        let result = fl.lower_expr(&mut scope, body)?;
        fl.builder.assign(Place::Local(LocalId(0)), Rvalue::Use(result));
        fl.builder.terminator(Terminator::Return);

        let function = builder.build();
        self.functions.push(function);
        Ok(())
    }
}

/// Lowering state scoped to one `Function`'s body: the block/statement
/// builder plus the loop-target stack `Break`/`Continue` consult.
struct FnLowerer<'a, 'd> {
    driver: &'a mut LowerDriver<'d>,
    builder: &'a mut Builder,
    call_targets: &'a HashMap<SpanKey, DefnId>,
    /// `(break_target, continue_target)`, pushed on loop entry and popped on
    /// exit; `Break` goes to `.0`, `Continue` to `.1`.
    loop_targets: Vec<(BlockId, BlockId)>,
}

impl<'a, 'd> FnLowerer<'a, 'd> {
    fn lower_expr(&mut self, scope: &mut Scope, expr: &Expr) -> Result<Operand, LoweringError> {
        match expr {
            Expr::Literal(lit, _) => Ok(Operand::Constant(literal_constant(lit))),

            Expr::Var(id, span) => self.lower_var(scope, *id, *span),

            Expr::Lambda { .. } => self.lower_nested_lambda(scope, expr),

            Expr::Application { func, arg, ty, .. } => self.lower_application(scope, func, arg, ty),

            Expr::Let { binding, value, body, .. } => {
                let value_ty = value.ty();
                let value_operand = self.lower_expr(scope, value)?;
                let local = self.builder.add_local(value_ty.clone(), None);
                self.builder.assign(Place::Local(local), Rvalue::Use(value_operand));
                scope.bind(*binding, local, value_ty);
                self.lower_expr(scope, body)
            }

            Expr::Fix { binding, value, .. } => {
                // A local recursive value (not a top-level function chain,
                // already peeled off by `LowerDriver::lower_unit`). Bind a
                // placeholder local before lowering `value` so a
                // self-reference inside it resolves, then fill it in.
                let placeholder = self.builder.add_local(value.ty(), None);
                scope.bind(*binding, placeholder, value.ty());
                let value_operand = self.lower_expr(scope, value)?;
                self.builder.assign(Place::Local(placeholder), Rvalue::Use(value_operand));
                Ok(Operand::Copy(Place::Local(placeholder)))
            }

            Expr::Conditional { cond, then_branch, else_branch, ty, .. } => {
                self.lower_conditional(scope, cond, then_branch, else_branch, ty)
            }

            Expr::While { cond, body, .. } => self.lower_while(scope, cond, body),

            Expr::Block { stmts, result, .. } => {
                for s in stmts {
                    self.lower_expr(scope, s)?;
                }
                self.lower_expr(scope, result)
            }

            Expr::Return { value, .. } => {
                let operand = match value {
                    Some(v) => self.lower_expr(scope, v)?,
                    None => Operand::Constant(unit_constant()),
                };
                self.builder.assign(Place::Local(LocalId(0)), Rvalue::Use(operand));
                self.builder.terminator(Terminator::Return);
                Ok(Operand::Constant(unit_constant()))
            }

            Expr::Tuple { elems, ty, .. } => {
                let mut operands = Vec::with_capacity(elems.len());
                for e in elems {
                    operands.push(self.lower_expr(scope, e)?);
                }
                let local = self.builder.add_local(ty.clone(), None);
                self.builder.assign(Place::Local(local), Rvalue::Aggregate(AggregateKind::Tuple, operands));
                Ok(Operand::Copy(Place::Local(local)))
            }

            Expr::TupleDeref { tuple, index, ty, .. } => {
                let tuple_operand = self.lower_expr(scope, tuple)?;
                let tuple_place = self.materialize(tuple_operand, tuple.ty());
                if let Type::Tuple(elems) = tuple.ty() {
                    if *index >= elems.len() {
                        return Err(LoweringError::TupleIndexOutOfRange { index: *index, arity: elems.len() });
                    }
                }
                let projected = Place::Projection(Box::new(tuple_place), Projection::Field(*index as u32));
                let local = self.builder.add_local(ty.clone(), None);
                self.builder.assign(Place::Local(local), Rvalue::Use(Operand::Copy(projected)));
                Ok(Operand::Copy(Place::Local(local)))
            }

            Expr::As { expr: inner, .. } => self.lower_expr(scope, inner),

            Expr::Sizeof { ty, .. } => {
                let local = self.builder.add_local(Type::Id(Symbol::intern("Int")), None);
                self.builder.assign(Place::Local(local), Rvalue::NullaryOp(NullOp::SizeOf, ty.clone()));
                Ok(Operand::Copy(Place::Local(local)))
            }

            Expr::Builtin { op, args, ty, .. } => self.lower_builtin(scope, *op, args, ty),

            Expr::Break(_) => {
                let target = self.loop_targets.last().map(|(brk, _)| *brk).ok_or(LoweringError::LoopControlOutsideLoop)?;
                self.builder.terminator(Terminator::Goto { target });
                Ok(Operand::Constant(unit_constant()))
            }

            Expr::Continue(_) => {
                let target = self.loop_targets.last().map(|(_, cont)| *cont).ok_or(LoweringError::LoopControlOutsideLoop)?;
                self.builder.terminator(Terminator::Goto { target });
                Ok(Operand::Constant(unit_constant()))
            }

            Expr::Match { scrutinee, arms, ty, .. } => self.lower_match(scope, scrutinee, arms, ty),

            Expr::StaticPrint { message, .. } => {
                let local = self.builder.add_local(Type::unit(), None);
                let msg_const = Operand::Constant(Constant {
                    ty: Type::Id(Symbol::intern("String")),
                    kind: ConstantKind::String(Symbol::intern(message)),
                });
                self.builder.assign(Place::Local(local), Rvalue::Aggregate(AggregateKind::Tuple, vec![msg_const]));
                Ok(Operand::Constant(unit_constant()))
            }
        }
    }

    fn lower_var(&mut self, scope: &mut Scope, id: DefId, span: Span) -> Result<Operand, LoweringError> {
        if let Some(callee) = self.call_targets.get(&span_key(span)) {
            let (_, callee_id) = self.driver.mangled_id(callee);
            let local = self.builder.add_local(callee.scheme.ty.clone(), None);
            self.builder.assign(Place::Local(local), Rvalue::Aggregate(AggregateKind::Closure(callee_id), Vec::new()));
            return Ok(Operand::Copy(Place::Local(local)));
        }
        match scope.locals.get(&id) {
            Some(local) => Ok(Operand::Copy(Place::Local(*local))),
            None => Err(LoweringError::UnresolvedName(id)),
        }
    }

    fn lower_nested_lambda(&mut self, scope: &mut Scope, expr: &Expr) -> Result<Operand, LoweringError> {
        let Expr::Lambda { param, param_ty, body, ty, span } = expr else { unreachable!() };

        let bound: HashSet<DefId> = std::iter::once(*param).collect();
        let mut free = Vec::new();
        let mut seen = HashSet::new();
        collect_free_vars(body, &bound, self.call_targets, &mut seen, &mut free);
        let captures: Vec<(DefId, Type, LocalId)> = free
            .into_iter()
            .filter_map(|id| {
                let cap_ty = scope.types.get(&id)?.clone();
                let local = *scope.locals.get(&id)?;
                Some((id, cap_ty, local))
            })
            .collect();

        let base_name = self.builder.function.name;
        let (lambda_name, lambda_id) = self.driver.fresh_lambda_name(base_name);

        let ret_ty = ty.arrow_parts().map(|(_, to)| to.clone()).unwrap_or_else(|| body.ty());
        self.driver.lower_one_function(lambda_name, *param, param_ty.clone(), body, ret_ty, *span, self.call_targets, &captures)?;

        let capture_operands: Vec<Operand> = captures.iter().map(|(_, _, local)| Operand::Copy(Place::Local(*local))).collect();
        let local = self.builder.add_local(ty.clone(), None);
        self.builder.assign(Place::Local(local), Rvalue::Aggregate(AggregateKind::Closure(lambda_id), capture_operands));
        Ok(Operand::Copy(Place::Local(local)))
    }

    fn lower_application(&mut self, scope: &mut Scope, func: &Expr, arg: &Expr, ty: &Type) -> Result<Operand, LoweringError> {
        let closure_operand = self.lower_expr(scope, func)?;
        let closure_place = self.materialize(closure_operand, func.ty());
        let fn_ptr_place = Place::Projection(Box::new(closure_place.clone()), Projection::Field(0));
        let fn_ptr_local = self.builder.add_local(Type::arrow(arg.ty(), ty.clone()), None);
        self.builder.assign(Place::Local(fn_ptr_local), Rvalue::Use(Operand::Copy(fn_ptr_place)));

        let arg_operand = self.lower_expr(scope, arg)?;
        let dest_local = self.builder.add_local(ty.clone(), None);
        let next_block = self.builder.new_block();
        self.builder.terminator(Terminator::Call {
            func: Operand::Copy(Place::Local(fn_ptr_local)),
            args: vec![arg_operand, Operand::Copy(closure_place)],
            destination: Place::Local(dest_local),
            target: Some(next_block),
            cleanup: None,
        });
        self.builder.set_current_block(next_block);
        Ok(Operand::Copy(Place::Local(dest_local)))
    }

    fn lower_conditional(&mut self, scope: &mut Scope, cond: &Expr, then_branch: &Expr, else_branch: &Expr, ty: &Type) -> Result<Operand, LoweringError> {
        let cond_operand = self.lower_expr(scope, cond)?;
        let then_block = self.builder.new_block();
        let else_block = self.builder.new_block();
        let join_block = self.builder.new_block();
        self.builder.terminator(Terminator::If { cond: cond_operand, then_block, else_block });

        let result_local = self.builder.add_local(ty.clone(), None);

        self.builder.set_current_block(then_block);
        let then_val = self.lower_expr(scope, then_branch)?;
        if !always_diverges(then_branch) {
            self.builder.assign(Place::Local(result_local), Rvalue::Use(then_val));
            self.builder.terminator(Terminator::Goto { target: join_block });
        }

        self.builder.set_current_block(else_block);
        let else_val = self.lower_expr(scope, else_branch)?;
        if !always_diverges(else_branch) {
            self.builder.assign(Place::Local(result_local), Rvalue::Use(else_val));
            self.builder.terminator(Terminator::Goto { target: join_block });
        }

        self.builder.set_current_block(join_block);
        Ok(Operand::Copy(Place::Local(result_local)))
    }

    fn lower_while(&mut self, scope: &mut Scope, cond: &Expr, body: &Expr) -> Result<Operand, LoweringError> {
        let cond_block = self.builder.new_block();
        let body_block = self.builder.new_block();
        let join_block = self.builder.new_block();
        self.builder.terminator(Terminator::Goto { target: cond_block });

        self.builder.set_current_block(cond_block);
        let cond_operand = self.lower_expr(scope, cond)?;
        self.builder.terminator(Terminator::If { cond: cond_operand, then_block: body_block, else_block: join_block });

        self.loop_targets.push((join_block, cond_block));
        self.builder.set_current_block(body_block);
        self.lower_expr(scope, body)?;
        if !always_diverges(body) {
            self.builder.terminator(Terminator::Goto { target: cond_block });
        }
        self.loop_targets.pop();

        self.builder.set_current_block(join_block);
        Ok(Operand::Constant(unit_constant()))
    }

    fn lower_builtin(&mut self, scope: &mut Scope, op: Builtin, args: &[Expr], ty: &Type) -> Result<Operand, LoweringError> {
        let mut operands = Vec::with_capacity(args.len());
        for a in args {
            operands.push(self.lower_expr(scope, a)?);
        }
        let local = self.builder.add_local(ty.clone(), None);
        let rvalue = match (op, operands.as_slice()) {
            (Builtin::AddInt | Builtin::AddFloat, [a, b]) => Rvalue::BinaryOp(BinOp::Add, Box::new(a.clone()), Box::new(b.clone())),
            (Builtin::SubInt | Builtin::SubFloat, [a, b]) => Rvalue::BinaryOp(BinOp::Sub, Box::new(a.clone()), Box::new(b.clone())),
            (Builtin::MulInt | Builtin::MulFloat, [a, b]) => Rvalue::BinaryOp(BinOp::Mul, Box::new(a.clone()), Box::new(b.clone())),
            (Builtin::DivInt | Builtin::DivFloat, [a, b]) => Rvalue::BinaryOp(BinOp::Div, Box::new(a.clone()), Box::new(b.clone())),
            (Builtin::ModInt, [a, b]) => Rvalue::BinaryOp(BinOp::Rem, Box::new(a.clone()), Box::new(b.clone())),
            (Builtin::CmpEq, [a, b]) => Rvalue::BinaryOp(BinOp::Eq, Box::new(a.clone()), Box::new(b.clone())),
            (Builtin::CmpLt, [a, b]) => Rvalue::BinaryOp(BinOp::Lt, Box::new(a.clone()), Box::new(b.clone())),
            (Builtin::CmpLte, [a, b]) => Rvalue::BinaryOp(BinOp::Le, Box::new(a.clone()), Box::new(b.clone())),
            (Builtin::CmpGt, [a, b]) => Rvalue::BinaryOp(BinOp::Gt, Box::new(a.clone()), Box::new(b.clone())),
            (Builtin::CmpGte, [a, b]) => Rvalue::BinaryOp(BinOp::Ge, Box::new(a.clone()), Box::new(b.clone())),
            (Builtin::Not, [a]) => Rvalue::UnaryOp(UnOp::Not, a.clone()),
            (Builtin::Negate, [a]) => Rvalue::UnaryOp(UnOp::Neg, a.clone()),
            (Builtin::StrConcat, [a, b]) => Rvalue::Aggregate(AggregateKind::Tuple, vec![a.clone(), b.clone()]),
            (Builtin::Print, [a]) => Rvalue::Use(a.clone()),
            _ => Rvalue::Use(operands.first().cloned().unwrap_or(Operand::Constant(unit_constant()))),
        };
        self.builder.assign(Place::Local(local), rvalue);
        Ok(Operand::Copy(Place::Local(local)))
    }

    /// Lowers a `match` to a dispatch block that reads the scrutinee's
    /// discriminant, one block per arm (binding that arm's fields by
    /// projecting the scrutinee before lowering its body), and a shared join
    /// block. Exhaustiveness is already established by pattern analysis, so
    /// the `otherwise` branch of the dispatch is unreachable rather than a
    /// real arm.
    fn lower_match(&mut self, scope: &mut Scope, scrutinee: &Expr, arms: &[MatchArm], ty: &Type) -> Result<Operand, LoweringError> {
        let scrutinee_operand = self.lower_expr(scope, scrutinee)?;
        let scrutinee_place = self.materialize(scrutinee_operand, scrutinee.ty());
        let discr_local = self.builder.add_local(Type::Id(Symbol::intern("Int")), None);
        self.builder.assign(Place::Local(discr_local), Rvalue::Discriminant(scrutinee_place.clone()));

        let result_local = self.builder.add_local(ty.clone(), None);
        let join_block = self.builder.new_block();
        let dispatch_block = self.builder.current_block;
        let otherwise = self.builder.new_block();
        self.builder.set_current_block(otherwise);
        self.builder.terminator(Terminator::Unreachable);

        let mut targets = Vec::with_capacity(arms.len());
        for (i, arm) in arms.iter().enumerate() {
            let arm_block = self.builder.new_block();
            targets.push((i as u128, arm_block));
            self.builder.set_current_block(arm_block);
            let mut arm_scope = scope.clone();
            for (field_index, (_, def_id)) in arm.bindings.iter().enumerate() {
                let field_ty = Type::unit();
                let local = self.builder.add_local(field_ty.clone(), None);
                let projected = Place::Projection(Box::new(scrutinee_place.clone()), Projection::Field(field_index as u32));
                self.builder.assign(Place::Local(local), Rvalue::Use(Operand::Copy(projected)));
                arm_scope.bind(*def_id, local, field_ty);
            }
            let body_operand = self.lower_expr(&mut arm_scope, &arm.body)?;
            if !always_diverges(&arm.body) {
                self.builder.assign(Place::Local(result_local), Rvalue::Use(body_operand));
                self.builder.terminator(Terminator::Goto { target: join_block });
            }
        }

        self.builder.set_current_block(dispatch_block);
        self.builder.terminator(Terminator::SwitchInt {
            discr: Operand::Copy(Place::Local(discr_local)),
            switch_ty: Type::Id(Symbol::intern("Int")),
            targets,
            otherwise,
        });

        self.builder.set_current_block(join_block);
        Ok(Operand::Copy(Place::Local(result_local)))
    }

    /// Ensures an `Operand` has a `Place` to project from, materializing a
    /// constant into a fresh local first if needed.
    fn materialize(&mut self, operand: Operand, ty: Type) -> Place {
        match operand {
            Operand::Copy(p) | Operand::Move(p) => p,
            Operand::Constant(c) => {
                let local = self.builder.add_local(ty, None);
                self.builder.assign(Place::Local(local), Rvalue::Use(Operand::Constant(c)));
                Place::Local(local)
            }
        }
    }
}

fn always_diverges(expr: &Expr) -> bool {
    match expr {
        Expr::Return { .. } | Expr::Break(_) | Expr::Continue(_) => true,
        Expr::Block { result, .. } => always_diverges(result),
        Expr::Conditional { then_branch, else_branch, .. } => always_diverges(then_branch) && always_diverges(else_branch),
        _ => false,
    }
}

/// Structural free-variable analysis over a lambda body: `Let`/`Lambda`
/// extend the locally-bound set for their subtree, `Match` introduces each
/// clause's bound names before recursing into that clause's body. A `Var`
/// whose span is a recorded call target is a reference to a global
/// definition, never a capture.
fn collect_free_vars(expr: &Expr, bound: &HashSet<DefId>, call_targets: &HashMap<SpanKey, DefnId>, seen: &mut HashSet<DefId>, out: &mut Vec<DefId>) {
    match expr {
        Expr::Literal(..) | Expr::Break(_) | Expr::Continue(_) | Expr::StaticPrint { .. } | Expr::Sizeof { .. } => {}
        Expr::Var(id, span) => {
            if call_targets.contains_key(&span_key(*span)) {
                return;
            }
            if !bound.contains(id) && seen.insert(*id) {
                out.push(*id);
            }
        }
        Expr::Lambda { param, body, .. } => {
            let mut inner = bound.clone();
            inner.insert(*param);
            collect_free_vars(body, &inner, call_targets, seen, out);
        }
        Expr::Application { func, arg, .. } => {
            collect_free_vars(func, bound, call_targets, seen, out);
            collect_free_vars(arg, bound, call_targets, seen, out);
        }
        Expr::Let { binding, value, body, .. } => {
            collect_free_vars(value, bound, call_targets, seen, out);
            let mut inner = bound.clone();
            inner.insert(*binding);
            collect_free_vars(body, &inner, call_targets, seen, out);
        }
        Expr::Fix { binding, value, .. } => {
            let mut inner = bound.clone();
            inner.insert(*binding);
            collect_free_vars(value, &inner, call_targets, seen, out);
        }
        Expr::Conditional { cond, then_branch, else_branch, .. } => {
            collect_free_vars(cond, bound, call_targets, seen, out);
            collect_free_vars(then_branch, bound, call_targets, seen, out);
            collect_free_vars(else_branch, bound, call_targets, seen, out);
        }
        Expr::While { cond, body, .. } => {
            collect_free_vars(cond, bound, call_targets, seen, out);
            collect_free_vars(body, bound, call_targets, seen, out);
        }
        Expr::Block { stmts, result, .. } => {
            for s in stmts {
                collect_free_vars(s, bound, call_targets, seen, out);
            }
            collect_free_vars(result, bound, call_targets, seen, out);
        }
        Expr::Return { value, .. } => {
            if let Some(v) = value {
                collect_free_vars(v, bound, call_targets, seen, out);
            }
        }
        Expr::Tuple { elems, .. } => {
            for e in elems {
                collect_free_vars(e, bound, call_targets, seen, out);
            }
        }
        Expr::TupleDeref { tuple, .. } => collect_free_vars(tuple, bound, call_targets, seen, out),
        Expr::As { expr: inner, .. } => collect_free_vars(inner, bound, call_targets, seen, out),
        Expr::Builtin { args, .. } => {
            for a in args {
                collect_free_vars(a, bound, call_targets, seen, out);
            }
        }
        Expr::Match { scrutinee, arms, .. } => {
            collect_free_vars(scrutinee, bound, call_targets, seen, out);
            for arm in arms {
                let mut inner = bound.clone();
                for (_, def_id) in &arm.bindings {
                    inner.insert(*def_id);
                }
                collect_free_vars(&arm.body, &inner, call_targets, seen, out);
            }
        }
    }
}

fn literal_constant(lit: &Literal) -> Constant {
    match lit {
        Literal::Int(n) => Constant { ty: Type::Id(Symbol::intern("Int")), kind: ConstantKind::Int(*n) },
        Literal::Float(f) => Constant { ty: Type::Id(Symbol::intern("Float")), kind: ConstantKind::Float(*f) },
        Literal::Str(s) => Constant { ty: Type::Id(Symbol::intern("String")), kind: ConstantKind::String(Symbol::intern(s)) },
        Literal::Bool(b) => Constant { ty: Type::Id(Symbol::intern("Bool")), kind: ConstantKind::Bool(*b) },
    }
}

fn unit_constant() -> Constant {
    Constant { ty: Type::unit(), kind: ConstantKind::Unit }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_sem::Scheme;

    fn span() -> Span {
        Span::default()
    }

    #[test]
    fn lowers_a_constant_main() {
        let defs = DefIdGenerator::new();
        let main_body = Expr::Literal(Literal::Int(0), span());
        let defn_id = DefnId::new(Symbol::intern("main"), Scheme::monomorphic(Type::unit()));
        let mut map = HashMap::new();
        map.insert(defn_id, SpecializedUnit { expr: main_body, call_targets: HashMap::new() });

        let driver = LowerDriver::new(&defs);
        let program = driver.lower_program(&map).unwrap();
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.functions[0].arg_count, 2);
    }

    #[test]
    fn lowers_a_lambda_with_no_captures() {
        let defs = DefIdGenerator::new();
        let param = defs.next();
        let int_ty = Type::Id(Symbol::intern("Int"));
        let lambda = Expr::Lambda {
            param,
            param_ty: int_ty.clone(),
            body: Rc::new(Expr::Var(param, span())),
            ty: Type::arrow(int_ty.clone(), int_ty.clone()),
            span: span(),
        };
        let defn_id = DefnId::new(Symbol::intern("id"), Scheme::monomorphic(Type::arrow(int_ty.clone(), int_ty)));
        let mut map = HashMap::new();
        map.insert(defn_id, SpecializedUnit { expr: lambda, call_targets: HashMap::new() });

        let driver = LowerDriver::new(&defs);
        let program = driver.lower_program(&map).unwrap();
        assert_eq!(program.functions.len(), 1);
        let f = &program.functions[0];
        assert_eq!(f.arg_locals.len(), 2);
    }

    #[test]
    fn conditional_join_is_skipped_on_divergent_branch() {
        let always_break = Expr::Break(span());
        assert!(always_diverges(&always_break));
        let cond = Expr::Conditional {
            cond: Rc::new(Expr::Literal(Literal::Bool(true), span())),
            then_branch: Rc::new(always_break),
            else_branch: Rc::new(Expr::Literal(Literal::Int(1), span())),
            ty: Type::Id(Symbol::intern("Int")),
            span: span(),
        };
        assert!(!always_diverges(&cond));
    }

    #[test]
    fn free_vars_excludes_call_targets_and_bound_names() {
        let defs = DefIdGenerator::new();
        let free_id = defs.next();
        let bound_id = defs.next();
        let call_span = Span { start: 10, end: 12, ..Span::default() };
        let mut call_targets = HashMap::new();
        call_targets.insert(span_key(call_span), DefnId::new(Symbol::intern("g"), Scheme::monomorphic(Type::unit())));

        let expr = Expr::Tuple {
            elems: vec![Expr::Var(free_id, span()), Expr::Var(bound_id, call_span)],
            ty: Type::Tuple(vec![Type::unit(), Type::unit()]),
            span: span(),
        };
        let bound: HashSet<DefId> = HashSet::new();
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        collect_free_vars(&expr, &bound, &call_targets, &mut seen, &mut out);
        assert_eq!(out, vec![free_id]);
    }
}
