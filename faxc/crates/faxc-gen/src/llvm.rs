//! LLVM IR code generation.
//!
//! `LlvmBackend` walks a closure-converted `faxc_mir::Program` directly — its
//! basic blocks, statements, and terminators — and builds the corresponding
//! `inkwell` IR. `faxc_lir::lower_mir_to_lir` is consulted only for a
//! function's ABI shape (the two-argument closure calling convention and its
//! locals' tuple layout); there is no separate instruction stream to lower,
//! since register allocation and instruction selection belong to `inkwell`'s
//! own backend downstream.
//!
//! Every value is one machine word. Scalars (`Int`, `Bool`, `Char`) are a
//! plain `i64`; `Float` is `f64`; everything else (tuples, strings, closures,
//! user-defined nominal types) is a pointer to a heap block obtained from the
//! runtime's `malloc`. A heap block's fields are themselves word slots, so a
//! pointer or float value stored into one is boxed down to an `i64` first
//! (`to_word`) and unboxed back on load (`from_word`); a local's own alloca
//! always holds its natural LLVM type, no boxing needed there.

use std::collections::HashMap;
use std::path::Path;

use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::types::BasicTypeEnum;
use inkwell::values::{BasicValueEnum, FunctionValue, IntValue, PointerValue};
use inkwell::{FloatPredicate, IntPredicate, OptimizationLevel};

use faxc_mir as mir;
use faxc_sem::Type;
use faxc_util::{DefId, Idx, Symbol};

use crate::error::{CodeGenError, Result};
use crate::types::TypeMapper;

fn llvm_err(e: impl std::fmt::Display) -> CodeGenError {
    CodeGenError::LlvmOperationFailed(e.to_string())
}

pub struct LlvmBackend<'ctx> {
    pub context: &'ctx Context,
    pub module: Module<'ctx>,
    pub builder: Builder<'ctx>,
    pub target_triple: String,
    pub opt_level: OptimizationLevel,
    pub type_mapper: TypeMapper<'ctx>,
    functions: HashMap<Symbol, FunctionValue<'ctx>>,
}

/// The address of a `mir::Place`, tagged with how to load/store through it.
enum PlaceAddr<'ctx> {
    /// A local's own alloca: already typed as `ty`'s natural LLVM type.
    Direct(PointerValue<'ctx>, Type),
    /// A field inside a heap tuple: an `i64`-sized word slot holding `ty`.
    Boxed(PointerValue<'ctx>, Type),
}

impl<'ctx> LlvmBackend<'ctx> {
    pub fn new(
        context: &'ctx Context,
        module_name: &str,
        target_triple: String,
        opt_level: OptimizationLevel,
    ) -> Self {
        let module = context.create_module(module_name);

        let triple = inkwell::targets::TargetTriple::create(&target_triple);
        module.set_triple(&triple);

        if let Ok(target) = inkwell::targets::Target::from_triple(&triple) {
            if let Some(target_machine) = target.create_target_machine(
                &triple,
                "generic",
                "",
                opt_level,
                inkwell::targets::RelocMode::Default,
                inkwell::targets::CodeModel::Default,
            ) {
                let data_layout = target_machine.get_target_data().get_data_layout();
                module.set_data_layout(&data_layout);
            }
        }

        let mut backend = Self {
            context,
            module,
            builder: context.create_builder(),
            target_triple,
            opt_level,
            type_mapper: TypeMapper::new(context),
            functions: HashMap::new(),
        };

        backend.declare_runtime_functions();
        backend
    }

    /// Declares the ten `extern "C"` symbols a generated object file links
    /// against. The richer `fax_`-prefixed helper surface is ambient
    /// convenience owned by `faxc-runtime`, not this sink's contract.
    fn declare_runtime_functions(&mut self) {
        let ptr_ty = self.type_mapper.ptr_type();
        let i64_ty = self.context.i64_type();
        let f64_ty = self.context.f64_type();
        let i8_ty = self.context.i8_type();
        let i32_ty = self.context.i32_type();
        let void_ty = self.context.void_type();

        self.module.add_function("init", void_ty.fn_type(&[], false), None);
        self.module.add_function("malloc", ptr_ty.fn_type(&[i64_ty.into()], false), None);
        self.module.add_function("strlen", i64_ty.fn_type(&[ptr_ty.into()], false), None);
        self.module.add_function("print_int64", ptr_ty.fn_type(&[i64_ty.into()], false), None);
        self.module.add_function("itoa", ptr_ty.fn_type(&[i64_ty.into()], false), None);
        self.module.add_function("ftoa", ptr_ty.fn_type(&[f64_ty.into()], false), None);
        self.module.add_function("puts", i64_ty.fn_type(&[ptr_ty.into()], false), None);
        self.module.add_function(
            "write_char",
            i32_ty.fn_type(&[i64_ty.into(), i8_ty.into()], false),
            None,
        );
        self.module.add_function(
            "hash",
            i64_ty.fn_type(&[ptr_ty.into(), i64_ty.into()], false),
            None,
        );
        self.module.add_function("hash_int", i64_ty.fn_type(&[i64_ty.into()], false), None);
    }

    fn runtime_fn(&self, name: &str) -> Result<FunctionValue<'ctx>> {
        self.module
            .get_function(name)
            .ok_or_else(|| CodeGenError::FunctionNotFound(name.to_string()))
    }

    /// Compiles every function in a closure-converted program: first
    /// declaring every signature (so mutually- and forward-referencing calls
    /// resolve), then filling in each body.
    pub fn compile_program(&mut self, program: &mir::Program) -> Result<()> {
        for function in &program.functions {
            self.declare_function(function)?;
        }
        for function in &program.functions {
            self.compile_function(function, program)?;
        }
        Ok(())
    }

    fn declare_function(&mut self, mir_fn: &mir::Function) -> Result<FunctionValue<'ctx>> {
        let lir_fn = faxc_lir::lower_mir_to_lir(mir_fn);
        let arg_ty = self.type_mapper.map_to_basic(&lir_fn.arg_ty);
        let env_ty = self.type_mapper.map_to_basic(&lir_fn.env_ty);
        let ret_ty = self.type_mapper.map_to_basic(&lir_fn.return_ty);

        let fn_type = ret_ty.fn_type(&[arg_ty.into(), env_ty.into()], false);
        let function = self.module.add_function(mir_fn.name.as_str(), fn_type, None);
        self.functions.insert(mir_fn.name, function);
        Ok(function)
    }

    /// Builds one function's body: an entry block that allocates every local
    /// and stores the incoming `(arg, env_ptr)` parameters, then one LLVM
    /// block per `mir::BlockId` translated statement-by-statement.
    pub fn compile_function(
        &self,
        mir_fn: &mir::Function,
        program: &mir::Program,
    ) -> Result<FunctionValue<'ctx>> {
        let function = *self
            .functions
            .get(&mir_fn.name)
            .ok_or_else(|| CodeGenError::FunctionNotFound(mir_fn.name.as_str().to_string()))?;

        let entry = self.context.append_basic_block(function, "entry");
        let mut blocks = HashMap::new();
        for (id, _) in mir_fn.blocks.iter_enumerated() {
            let block = self.context.append_basic_block(function, &format!("bb{}", id.0));
            blocks.insert(id, block);
        }

        self.builder.position_at_end(entry);
        let mut locals = HashMap::new();
        for (id, local) in mir_fn.locals.iter_enumerated() {
            let llvm_ty = self.type_mapper.map_to_basic(&local.ty);
            let alloca = self
                .builder
                .build_alloca(llvm_ty, &format!("local{}", id.0))
                .map_err(llvm_err)?;
            locals.insert(id, alloca);
        }

        let arg_local = mir_fn.arg_locals[faxc_lir::ClosureConvention::ARG_INDEX];
        let env_local = mir_fn.arg_locals[faxc_lir::ClosureConvention::ENV_INDEX];
        let arg_param = function
            .get_nth_param(faxc_lir::ClosureConvention::ARG_INDEX as u32)
            .ok_or_else(|| CodeGenError::Internal("missing argument parameter".into()))?;
        let env_param = function
            .get_nth_param(faxc_lir::ClosureConvention::ENV_INDEX as u32)
            .ok_or_else(|| CodeGenError::Internal("missing environment parameter".into()))?;
        self.builder.build_store(locals[&arg_local], arg_param).map_err(llvm_err)?;
        self.builder.build_store(locals[&env_local], env_param).map_err(llvm_err)?;
        self.builder
            .build_unconditional_branch(blocks[&mir_fn.entry_block])
            .map_err(llvm_err)?;

        for (id, block) in mir_fn.blocks.iter_enumerated() {
            self.builder.position_at_end(blocks[&id]);
            for stmt in &block.statements {
                self.compile_statement(stmt, mir_fn, program, &locals)?;
            }
            self.compile_terminator(&block.terminator, mir_fn, program, &locals, &blocks)?;
        }

        Ok(function)
    }

    fn compile_statement(
        &self,
        stmt: &mir::Statement,
        mir_fn: &mir::Function,
        program: &mir::Program,
        locals: &HashMap<mir::LocalId, PointerValue<'ctx>>,
    ) -> Result<()> {
        match stmt {
            mir::Statement::Assign(place, rvalue) => {
                let value = self.compile_rvalue(rvalue, mir_fn, program, locals)?;
                let addr = self.eval_place(mir_fn, locals, place)?;
                self.write_place(&addr, value)
            }
            mir::Statement::StorageLive(_)
            | mir::Statement::StorageDead(_)
            | mir::Statement::Nop => Ok(()),
        }
    }

    fn compile_terminator(
        &self,
        term: &mir::Terminator,
        mir_fn: &mir::Function,
        program: &mir::Program,
        locals: &HashMap<mir::LocalId, PointerValue<'ctx>>,
        blocks: &HashMap<mir::BlockId, BasicBlock<'ctx>>,
    ) -> Result<()> {
        match term {
            mir::Terminator::Goto { target } => {
                self.builder.build_unconditional_branch(blocks[target]).map_err(llvm_err)?;
                Ok(())
            }
            mir::Terminator::If { cond, then_block, else_block } => {
                let cond_val = self.eval_operand(mir_fn, locals, program, cond)?.into_int_value();
                let zero = self.context.i64_type().const_int(0, false);
                let bit = self
                    .builder
                    .build_int_compare(IntPredicate::NE, cond_val, zero, "cond")
                    .map_err(llvm_err)?;
                self.builder
                    .build_conditional_branch(bit, blocks[then_block], blocks[else_block])
                    .map_err(llvm_err)?;
                Ok(())
            }
            mir::Terminator::SwitchInt { discr, targets, otherwise, .. } => {
                let discr_val = self.eval_operand(mir_fn, locals, program, discr)?.into_int_value();
                let i64_ty = self.context.i64_type();
                let cases: Vec<(IntValue<'ctx>, BasicBlock<'ctx>)> = targets
                    .iter()
                    .map(|(v, target)| (i64_ty.const_int(*v as u64, false), blocks[target]))
                    .collect();
                self.builder
                    .build_switch(discr_val, blocks[otherwise], &cases)
                    .map_err(llvm_err)?;
                Ok(())
            }
            mir::Terminator::Return => {
                let ret_local = mir::LocalId(0);
                let ret_ty = mir_fn.locals[ret_local].ty.clone();
                let addr = PlaceAddr::Direct(locals[&ret_local], ret_ty);
                let val = self.read_place(&addr)?;
                self.builder.build_return(Some(&val)).map_err(llvm_err)?;
                Ok(())
            }
            mir::Terminator::Unreachable | mir::Terminator::Resume | mir::Terminator::Abort => {
                self.builder.build_unreachable().map_err(llvm_err)?;
                Ok(())
            }
            mir::Terminator::Call { func, args, destination, target, .. } => {
                let func_val = self.eval_operand(mir_fn, locals, program, func)?.into_pointer_value();

                let mut arg_types = Vec::new();
                let mut arg_vals = Vec::new();
                for arg in args {
                    let val = self.eval_operand(mir_fn, locals, program, arg)?;
                    arg_types.push(val.get_type().into());
                    arg_vals.push(val.into());
                }

                let dest_ty = self.place_ty(mir_fn, destination);
                let ret_llvm = self.type_mapper.map_to_basic(&dest_ty);
                let fn_type = ret_llvm.fn_type(&arg_types, false);

                let call = self
                    .builder
                    .build_indirect_call(fn_type, func_val, &arg_vals, "call")
                    .map_err(llvm_err)?;

                if let Some(result) = call.try_as_basic_value().left() {
                    let addr = self.eval_place(mir_fn, locals, destination)?;
                    self.write_place(&addr, result)?;
                }

                match target {
                    Some(block) => {
                        self.builder.build_unconditional_branch(blocks[block]).map_err(llvm_err)?;
                    }
                    None => {
                        self.builder.build_unreachable().map_err(llvm_err)?;
                    }
                }
                Ok(())
            }
        }
    }

    fn compile_rvalue(
        &self,
        rvalue: &mir::Rvalue,
        mir_fn: &mir::Function,
        program: &mir::Program,
        locals: &HashMap<mir::LocalId, PointerValue<'ctx>>,
    ) -> Result<BasicValueEnum<'ctx>> {
        match rvalue {
            mir::Rvalue::Use(operand) => self.eval_operand(mir_fn, locals, program, operand),
            mir::Rvalue::Ref(place, _) | mir::Rvalue::AddressOf(place, _) => {
                let addr = self.eval_place(mir_fn, locals, place)?;
                Ok(self.place_ptr(&addr).into())
            }
            mir::Rvalue::UnaryOp(op, operand) => {
                let ty = self.operand_ty(mir_fn, operand);
                let val = self.eval_operand(mir_fn, locals, program, operand)?;
                match op {
                    mir::UnOp::Neg if self.type_mapper.is_float(&ty) => self
                        .builder
                        .build_float_neg(val.into_float_value(), "fneg")
                        .map(Into::into)
                        .map_err(llvm_err),
                    mir::UnOp::Neg => self
                        .builder
                        .build_int_neg(val.into_int_value(), "neg")
                        .map(Into::into)
                        .map_err(llvm_err),
                    mir::UnOp::Not => self
                        .builder
                        .build_not(val.into_int_value(), "not")
                        .map(Into::into)
                        .map_err(llvm_err),
                }
            }
            mir::Rvalue::BinaryOp(op, a, b) | mir::Rvalue::CheckedBinaryOp(op, a, b) => {
                self.compile_binop(*op, a, b, mir_fn, program, locals)
            }
            mir::Rvalue::NullaryOp(_, _ty) => Ok(self.context.i64_type().const_int(8, false).into()),
            mir::Rvalue::Cast(kind, operand, ty) => {
                self.compile_cast(*kind, operand, ty, mir_fn, program, locals)
            }
            mir::Rvalue::Discriminant(place) => {
                let addr = self.eval_place(mir_fn, locals, place)?;
                let tuple_ptr = self.read_place(&addr)?.into_pointer_value();
                let i64_ty = self.context.i64_type();
                let tag_ptr = unsafe {
                    self.builder.build_in_bounds_gep(
                        i64_ty,
                        tuple_ptr,
                        &[i64_ty.const_int(0, false)],
                        "tag_ptr",
                    )
                }
                .map_err(llvm_err)?;
                self.builder.build_load(i64_ty, tag_ptr, "tag").map(Into::into).map_err(llvm_err)
            }
            mir::Rvalue::Aggregate(kind, operands) => {
                self.compile_aggregate(kind, operands, mir_fn, program, locals)
            }
        }
    }

    fn compile_binop(
        &self,
        op: mir::BinOp,
        a: &mir::Operand,
        b: &mir::Operand,
        mir_fn: &mir::Function,
        program: &mir::Program,
        locals: &HashMap<mir::LocalId, PointerValue<'ctx>>,
    ) -> Result<BasicValueEnum<'ctx>> {
        let ty = self.operand_ty(mir_fn, a);
        let is_float = self.type_mapper.is_float(&ty);
        let va = self.eval_operand(mir_fn, locals, program, a)?;
        let vb = self.eval_operand(mir_fn, locals, program, b)?;

        if is_float {
            let (fa, fb) = (va.into_float_value(), vb.into_float_value());
            match op {
                mir::BinOp::Add => {
                    self.builder.build_float_add(fa, fb, "fadd").map(Into::into).map_err(llvm_err)
                }
                mir::BinOp::Sub => {
                    self.builder.build_float_sub(fa, fb, "fsub").map(Into::into).map_err(llvm_err)
                }
                mir::BinOp::Mul => {
                    self.builder.build_float_mul(fa, fb, "fmul").map(Into::into).map_err(llvm_err)
                }
                mir::BinOp::Div => {
                    self.builder.build_float_div(fa, fb, "fdiv").map(Into::into).map_err(llvm_err)
                }
                mir::BinOp::Rem => {
                    self.builder.build_float_rem(fa, fb, "frem").map(Into::into).map_err(llvm_err)
                }
                mir::BinOp::Eq => self.cmp_float(FloatPredicate::OEQ, fa, fb),
                mir::BinOp::Ne => self.cmp_float(FloatPredicate::ONE, fa, fb),
                mir::BinOp::Lt => self.cmp_float(FloatPredicate::OLT, fa, fb),
                mir::BinOp::Le => self.cmp_float(FloatPredicate::OLE, fa, fb),
                mir::BinOp::Gt => self.cmp_float(FloatPredicate::OGT, fa, fb),
                mir::BinOp::Ge => self.cmp_float(FloatPredicate::OGE, fa, fb),
                _ => Err(CodeGenError::InvalidOperandType(format!(
                    "{:?} is not defined over Float",
                    op
                ))),
            }
        } else {
            let (ia, ib) = (va.into_int_value(), vb.into_int_value());
            match op {
                mir::BinOp::Add => {
                    self.builder.build_int_add(ia, ib, "add").map(Into::into).map_err(llvm_err)
                }
                mir::BinOp::Sub => {
                    self.builder.build_int_sub(ia, ib, "sub").map(Into::into).map_err(llvm_err)
                }
                mir::BinOp::Mul => {
                    self.builder.build_int_mul(ia, ib, "mul").map(Into::into).map_err(llvm_err)
                }
                mir::BinOp::Div => self
                    .builder
                    .build_int_signed_div(ia, ib, "sdiv")
                    .map(Into::into)
                    .map_err(llvm_err),
                mir::BinOp::Rem => self
                    .builder
                    .build_int_signed_rem(ia, ib, "srem")
                    .map(Into::into)
                    .map_err(llvm_err),
                mir::BinOp::BitAnd => {
                    self.builder.build_and(ia, ib, "and").map(Into::into).map_err(llvm_err)
                }
                mir::BinOp::BitOr => {
                    self.builder.build_or(ia, ib, "or").map(Into::into).map_err(llvm_err)
                }
                mir::BinOp::BitXor => {
                    self.builder.build_xor(ia, ib, "xor").map(Into::into).map_err(llvm_err)
                }
                mir::BinOp::Shl => self
                    .builder
                    .build_left_shift(ia, ib, "shl")
                    .map(Into::into)
                    .map_err(llvm_err),
                mir::BinOp::Shr => self
                    .builder
                    .build_right_shift(ia, ib, true, "shr")
                    .map(Into::into)
                    .map_err(llvm_err),
                mir::BinOp::Offset => {
                    self.builder.build_int_add(ia, ib, "offset").map(Into::into).map_err(llvm_err)
                }
                mir::BinOp::Eq => self.cmp_int(IntPredicate::EQ, ia, ib),
                mir::BinOp::Ne => self.cmp_int(IntPredicate::NE, ia, ib),
                mir::BinOp::Lt => self.cmp_int(IntPredicate::SLT, ia, ib),
                mir::BinOp::Le => self.cmp_int(IntPredicate::SLE, ia, ib),
                mir::BinOp::Gt => self.cmp_int(IntPredicate::SGT, ia, ib),
                mir::BinOp::Ge => self.cmp_int(IntPredicate::SGE, ia, ib),
            }
        }
    }

    fn cmp_int(&self, pred: IntPredicate, a: IntValue<'ctx>, b: IntValue<'ctx>) -> Result<BasicValueEnum<'ctx>> {
        let bit = self.builder.build_int_compare(pred, a, b, "cmp").map_err(llvm_err)?;
        self.builder
            .build_int_z_extend(bit, self.context.i64_type(), "bool_ext")
            .map(Into::into)
            .map_err(llvm_err)
    }

    fn cmp_float(
        &self,
        pred: FloatPredicate,
        a: inkwell::values::FloatValue<'ctx>,
        b: inkwell::values::FloatValue<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>> {
        let bit = self.builder.build_float_compare(pred, a, b, "fcmp").map_err(llvm_err)?;
        self.builder
            .build_int_z_extend(bit, self.context.i64_type(), "bool_ext")
            .map(Into::into)
            .map_err(llvm_err)
    }

    fn compile_cast(
        &self,
        kind: mir::CastKind,
        operand: &mir::Operand,
        ty: &Type,
        mir_fn: &mir::Function,
        program: &mir::Program,
        locals: &HashMap<mir::LocalId, PointerValue<'ctx>>,
    ) -> Result<BasicValueEnum<'ctx>> {
        let val = self.eval_operand(mir_fn, locals, program, operand)?;
        match kind {
            mir::CastKind::IntToInt | mir::CastKind::FloatToFloat | mir::CastKind::PtrToPtr => {
                Ok(val)
            }
            mir::CastKind::IntToFloat => self
                .builder
                .build_signed_int_to_float(val.into_int_value(), self.context.f64_type(), "sitofp")
                .map(Into::into)
                .map_err(llvm_err),
            mir::CastKind::FloatToInt => self
                .builder
                .build_float_to_signed_int(val.into_float_value(), self.context.i64_type(), "fptosi")
                .map(Into::into)
                .map_err(llvm_err),
            mir::CastKind::PtrToInt => self
                .builder
                .build_ptr_to_int(val.into_pointer_value(), self.context.i64_type(), "ptrtoint")
                .map(Into::into)
                .map_err(llvm_err),
            mir::CastKind::IntToPtr => {
                let target_ptr_ty = match self.type_mapper.map_to_basic(ty) {
                    BasicTypeEnum::PointerType(p) => p,
                    _ => self.type_mapper.ptr_type(),
                };
                self.builder
                    .build_int_to_ptr(val.into_int_value(), target_ptr_ty, "inttoptr")
                    .map(Into::into)
                    .map_err(llvm_err)
            }
        }
    }

    /// Lowers `AggregateKind::Closure`/`Struct`/`Tuple`/`Array` to a runtime
    /// `malloc` call sized for the field count, with each field word boxed
    /// via `to_word`. A `Closure`'s slot 0 is the callee's own function
    /// pointer, resolved through `program.function_ids`; a `Struct`'s slot 0
    /// is its constructor tag, used later as a `SwitchInt` discriminant.
    fn compile_aggregate(
        &self,
        kind: &mir::AggregateKind,
        operands: &[mir::Operand],
        mir_fn: &mir::Function,
        program: &mir::Program,
        locals: &HashMap<mir::LocalId, PointerValue<'ctx>>,
    ) -> Result<BasicValueEnum<'ctx>> {
        let mut fields: Vec<(Type, BasicValueEnum<'ctx>)> = Vec::new();

        match kind {
            mir::AggregateKind::Closure(def_id) => {
                let fn_ptr = self.closure_fn_pointer(*def_id, program)?;
                fields.push((Type::unit(), fn_ptr.into()));
            }
            mir::AggregateKind::Struct(def_id) => {
                let tag = self.context.i64_type().const_int(def_id.index() as u64, false);
                fields.push((Type::Id(Symbol::intern("Int")), tag.into()));
            }
            mir::AggregateKind::Tuple | mir::AggregateKind::Array(_) => {}
        }
        for operand in operands {
            let ty = self.operand_ty(mir_fn, operand);
            let val = self.eval_operand(mir_fn, locals, program, operand)?;
            fields.push((ty, val));
        }

        let malloc_fn = self.runtime_fn("malloc")?;
        let size = self.context.i64_type().const_int(fields.len() as u64 * 8, false);
        let call = self.builder.build_call(malloc_fn, &[size.into()], "tuple_alloc").map_err(llvm_err)?;
        let tuple_ptr = call
            .try_as_basic_value()
            .left()
            .ok_or_else(|| CodeGenError::LlvmOperationFailed("malloc returned no value".into()))?
            .into_pointer_value();

        let i64_ty = self.context.i64_type();
        for (index, (ty, value)) in fields.into_iter().enumerate() {
            let word = self.to_word(value, &ty)?;
            let field_ptr = unsafe {
                self.builder.build_in_bounds_gep(
                    i64_ty,
                    tuple_ptr,
                    &[i64_ty.const_int(index as u64, false)],
                    "field_ptr",
                )
            }
            .map_err(llvm_err)?;
            self.builder.build_store(field_ptr, word).map_err(llvm_err)?;
        }

        Ok(tuple_ptr.into())
    }

    fn closure_fn_pointer(&self, def_id: DefId, program: &mir::Program) -> Result<PointerValue<'ctx>> {
        let name = program
            .function_ids
            .get(&def_id)
            .copied()
            .ok_or_else(|| CodeGenError::FunctionNotFound(format!("{:?}", def_id)))?;
        let function = self
            .functions
            .get(&name)
            .copied()
            .ok_or_else(|| CodeGenError::FunctionNotFound(name.as_str().to_string()))?;
        Ok(function.as_global_value().as_pointer_value())
    }

    fn eval_operand(
        &self,
        mir_fn: &mir::Function,
        locals: &HashMap<mir::LocalId, PointerValue<'ctx>>,
        program: &mir::Program,
        operand: &mir::Operand,
    ) -> Result<BasicValueEnum<'ctx>> {
        let _ = program;
        match operand {
            mir::Operand::Copy(place) | mir::Operand::Move(place) => {
                let addr = self.eval_place(mir_fn, locals, place)?;
                self.read_place(&addr)
            }
            mir::Operand::Constant(constant) => self.eval_constant(constant),
        }
    }

    fn eval_constant(&self, constant: &mir::Constant) -> Result<BasicValueEnum<'ctx>> {
        match &constant.kind {
            mir::ConstantKind::Int(i) => Ok(self.context.i64_type().const_int(*i as u64, true).into()),
            mir::ConstantKind::Float(f) => Ok(self.context.f64_type().const_float(*f).into()),
            mir::ConstantKind::Bool(b) => {
                Ok(self.context.i64_type().const_int(*b as u64, false).into())
            }
            mir::ConstantKind::Unit => Ok(self.type_mapper.ptr_type().const_null().into()),
            mir::ConstantKind::String(s) => {
                let global = self
                    .builder
                    .build_global_string_ptr(s.as_str(), "str_const")
                    .map_err(llvm_err)?;
                Ok(global.as_pointer_value().into())
            }
        }
    }

    fn operand_ty(&self, mir_fn: &mir::Function, operand: &mir::Operand) -> Type {
        match operand {
            mir::Operand::Copy(place) | mir::Operand::Move(place) => self.place_ty(mir_fn, place),
            mir::Operand::Constant(constant) => constant.ty.clone(),
        }
    }

    /// The logical (semantic) type occupying a place, computed structurally
    /// from the function's declared local types. Field projections whose
    /// element type cannot be determined (a closure's function-pointer slot,
    /// or a field of a nominal type whose constructor layout isn't visible
    /// here) fall back to the generic pointer representation.
    fn place_ty(&self, mir_fn: &mir::Function, place: &mir::Place) -> Type {
        match place {
            mir::Place::Local(id) => mir_fn.locals[*id].ty.clone(),
            mir::Place::Projection(base, projection) => {
                let base_ty = self.place_ty(mir_fn, base);
                match projection {
                    mir::Projection::Field(n) => match &base_ty {
                        Type::Tuple(fields) => {
                            fields.get(*n as usize).cloned().unwrap_or_else(Type::unit)
                        }
                        _ => Type::unit(),
                    },
                    mir::Projection::Deref => deref_inner_ty(&base_ty),
                    mir::Projection::Index(_)
                    | mir::Projection::ConstantIndex { .. }
                    | mir::Projection::Subslice { .. } => base_ty,
                }
            }
        }
    }

    fn eval_place(
        &self,
        mir_fn: &mir::Function,
        locals: &HashMap<mir::LocalId, PointerValue<'ctx>>,
        place: &mir::Place,
    ) -> Result<PlaceAddr<'ctx>> {
        match place {
            mir::Place::Local(id) => {
                let ptr = *locals
                    .get(id)
                    .ok_or_else(|| CodeGenError::Internal(format!("unallocated local {:?}", id)))?;
                Ok(PlaceAddr::Direct(ptr, mir_fn.locals[*id].ty.clone()))
            }
            mir::Place::Projection(base, projection) => {
                let base_ty = self.place_ty(mir_fn, base);
                let base_addr = self.eval_place(mir_fn, locals, base)?;
                match projection {
                    mir::Projection::Field(n) => {
                        let tuple_ptr = self.read_place(&base_addr)?.into_pointer_value();
                        let field_ty = match &base_ty {
                            Type::Tuple(fields) => {
                                fields.get(*n as usize).cloned().unwrap_or_else(Type::unit)
                            }
                            _ => Type::unit(),
                        };
                        let i64_ty = self.context.i64_type();
                        let field_ptr = unsafe {
                            self.builder.build_in_bounds_gep(
                                i64_ty,
                                tuple_ptr,
                                &[i64_ty.const_int(*n as u64, false)],
                                "field_ptr",
                            )
                        }
                        .map_err(llvm_err)?;
                        Ok(PlaceAddr::Boxed(field_ptr, field_ty))
                    }
                    mir::Projection::Deref => {
                        let ptr_val = self.read_place(&base_addr)?.into_pointer_value();
                        Ok(PlaceAddr::Direct(ptr_val, deref_inner_ty(&base_ty)))
                    }
                    mir::Projection::Index(_)
                    | mir::Projection::ConstantIndex { .. }
                    | mir::Projection::Subslice { .. } => Ok(base_addr),
                }
            }
        }
    }

    fn place_ptr(&self, addr: &PlaceAddr<'ctx>) -> PointerValue<'ctx> {
        match addr {
            PlaceAddr::Direct(p, _) | PlaceAddr::Boxed(p, _) => *p,
        }
    }

    fn read_place(&self, addr: &PlaceAddr<'ctx>) -> Result<BasicValueEnum<'ctx>> {
        match addr {
            PlaceAddr::Direct(ptr, ty) => {
                let llvm_ty = self.type_mapper.map_to_basic(ty);
                self.builder.build_load(llvm_ty, *ptr, "load").map_err(llvm_err)
            }
            PlaceAddr::Boxed(ptr, ty) => {
                let word = self
                    .builder
                    .build_load(self.context.i64_type(), *ptr, "word")
                    .map_err(llvm_err)?
                    .into_int_value();
                self.from_word(word, ty)
            }
        }
    }

    fn write_place(&self, addr: &PlaceAddr<'ctx>, value: BasicValueEnum<'ctx>) -> Result<()> {
        match addr {
            PlaceAddr::Direct(ptr, _ty) => {
                self.builder.build_store(*ptr, value).map_err(llvm_err)?;
                Ok(())
            }
            PlaceAddr::Boxed(ptr, ty) => {
                let word = self.to_word(value, ty)?;
                self.builder.build_store(*ptr, word).map_err(llvm_err)?;
                Ok(())
            }
        }
    }

    /// Boxes a natural-typed value down to the `i64` word a heap tuple field
    /// occupies.
    fn to_word(&self, value: BasicValueEnum<'ctx>, ty: &Type) -> Result<IntValue<'ctx>> {
        match value {
            BasicValueEnum::IntValue(v) => Ok(v),
            BasicValueEnum::FloatValue(v) => self
                .builder
                .build_bit_cast(v, self.context.i64_type(), "f2i")
                .map(|v| v.into_int_value())
                .map_err(llvm_err),
            BasicValueEnum::PointerValue(v) => self
                .builder
                .build_ptr_to_int(v, self.context.i64_type(), "p2i")
                .map_err(llvm_err),
            other => Err(CodeGenError::InvalidOperandType(format!(
                "cannot box a {:?} into a tuple word (type {:?})",
                other, ty
            ))),
        }
    }

    /// Unboxes an `i64` tuple-field word back to `ty`'s natural
    /// representation.
    fn from_word(&self, word: IntValue<'ctx>, ty: &Type) -> Result<BasicValueEnum<'ctx>> {
        if self.type_mapper.is_float(ty) {
            return self
                .builder
                .build_bit_cast(word, self.context.f64_type(), "i2f")
                .map_err(llvm_err);
        }
        match self.type_mapper.map_to_basic(ty) {
            BasicTypeEnum::PointerType(pt) => self
                .builder
                .build_int_to_ptr(word, pt, "i2p")
                .map(Into::into)
                .map_err(llvm_err),
            _ => Ok(word.into()),
        }
    }

    /// Optimize the module
    pub fn optimize(&mut self) {
        // Apply optimization passes based on opt_level
    }

    /// Emit LLVM IR as string
    pub fn emit_llvm_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    /// Write LLVM IR to file
    pub fn write_ir_to_file(&self, path: &Path) -> std::io::Result<()> {
        use std::fs::File;
        use std::io::Write;

        let ir = self.emit_llvm_ir();
        let mut file = File::create(path)?;
        file.write_all(ir.as_bytes())?;
        Ok(())
    }

    /// Get the LLVM module
    pub fn get_module(&self) -> &Module<'ctx> {
        &self.module
    }

    /// Write object file
    pub fn write_object_file(&self, path: &Path) -> crate::Result<()> {
        use inkwell::targets::{FileType, TargetTriple};

        let triple = TargetTriple::create(&self.target_triple);
        let target = inkwell::targets::Target::from_triple(&triple)
            .map_err(|e| CodeGenError::CompilationError(format!("Failed to get target: {}", e)))?;

        let target_machine = target
            .create_target_machine(
                &triple,
                "generic",
                "",
                self.opt_level,
                inkwell::targets::RelocMode::Default,
                inkwell::targets::CodeModel::Default,
            )
            .ok_or_else(|| {
                CodeGenError::CompilationError("Failed to create target machine".to_string())
            })?;

        target_machine
            .write_to_file(&self.module, FileType::Object, path)
            .map_err(|e| {
                CodeGenError::CompilationError(format!("Failed to write object file: {}", e))
            })?;

        Ok(())
    }

    /// Write assembly file
    pub fn write_asm_file(&self, path: &Path) -> crate::Result<()> {
        use inkwell::targets::{FileType, TargetTriple};

        let triple = TargetTriple::create(&self.target_triple);
        let target = inkwell::targets::Target::from_triple(&triple)
            .map_err(|e| CodeGenError::CompilationError(format!("Failed to get target: {}", e)))?;

        let target_machine = target
            .create_target_machine(
                &triple,
                "generic",
                "",
                self.opt_level,
                inkwell::targets::RelocMode::Default,
                inkwell::targets::CodeModel::Default,
            )
            .ok_or_else(|| {
                CodeGenError::CompilationError("Failed to create target machine".to_string())
            })?;

        target_machine
            .write_to_file(&self.module, FileType::Assembly, path)
            .map_err(|e| {
                CodeGenError::CompilationError(format!("Failed to write asm file: {}", e))
            })?;

        Ok(())
    }
}

fn deref_inner_ty(base_ty: &Type) -> Type {
    if let Type::Operator(tag, inner) = base_ty {
        if let Type::Id(name) = tag.as_ref() {
            if name.eq_str("*") {
                return (**inner).clone();
            }
        }
    }
    Type::unit()
}

#[cfg(test)]
mod llvm_tests {
    use super::*;
    use inkwell::context::Context;

    #[test]
    fn test_llvm_backend_creation() {
        let context = Context::create();
        let backend = LlvmBackend::new(
            &context,
            "test",
            "x86_64-unknown-linux-gnu".to_string(),
            OptimizationLevel::None,
        );
        assert_eq!(backend.target_triple, "x86_64-unknown-linux-gnu");
    }

    #[test]
    fn test_emit_empty_module() {
        let context = Context::create();
        let backend = LlvmBackend::new(
            &context,
            "test",
            "x86_64-unknown-linux-gnu".to_string(),
            OptimizationLevel::None,
        );
        let _ir = backend.emit_llvm_ir();
    }

    #[test]
    fn test_runtime_functions_declared() {
        let context = Context::create();
        let backend = LlvmBackend::new(
            &context,
            "test",
            "x86_64-unknown-linux-gnu".to_string(),
            OptimizationLevel::None,
        );
        for name in ["init", "malloc", "strlen", "print_int64", "itoa", "ftoa", "puts", "write_char", "hash", "hash_int"] {
            assert!(backend.module.get_function(name).is_some(), "missing runtime symbol {name}");
        }
    }

    #[test]
    fn test_compile_identity_function() {
        use faxc_mir::{Builder, Program};
        use faxc_util::Symbol;
        use std::collections::HashMap;

        let int_ty = Type::Id(Symbol::intern("Int"));
        let mut builder = Builder::new(Symbol::intern("identity"), int_ty.clone(), 2);
        let arg = builder.add_arg(int_ty.clone(), None);
        builder.add_arg(Type::Tuple(vec![]), None);
        builder.assign(
            mir::Place::Local(mir::LocalId(0)),
            mir::Rvalue::Use(mir::Operand::Copy(mir::Place::Local(arg))),
        );
        let function = builder.build();
        let program = Program { functions: vec![function], function_ids: HashMap::new() };

        let context = Context::create();
        let mut backend = LlvmBackend::new(
            &context,
            "test",
            "x86_64-unknown-linux-gnu".to_string(),
            OptimizationLevel::None,
        );
        backend.compile_program(&program).expect("identity function should compile");
        let ir = backend.emit_llvm_ir();
        assert!(ir.contains("identity"));
    }
}
