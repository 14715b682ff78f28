//! Integration tests for MIR construction, the builder, and optimization passes.

use crate::*;
use faxc_sem::Type;
use faxc_util::{Idx, Symbol};

fn int_ty() -> Type {
    Type::Id(Symbol::intern("Int"))
}

fn bool_ty() -> Type {
    Type::Id(Symbol::intern("Bool"))
}

#[test]
fn test_function_creation() {
    let name = Symbol::intern("test_fn");
    let func = Function::new(name, int_ty(), 2);

    assert_eq!(func.name, name);
    assert_eq!(func.return_ty, int_ty());
    assert_eq!(func.arg_count, 2);
    assert_eq!(func.block_count(), 0);
}

#[test]
fn test_builder_basic_block() {
    let name = Symbol::intern("test");
    let mut builder = Builder::new(name, int_ty(), 0);

    let entry = builder.new_block();
    assert_eq!(entry.0, 0);

    let block2 = builder.new_block();
    assert_eq!(block2.0, 1);
}

#[test]
fn test_builder_add_local() {
    let name = Symbol::intern("test");
    let mut builder = Builder::new(name, int_ty(), 0);

    let local1 = builder.add_local(int_ty(), None);
    assert_eq!(local1.0, 1); // 0 is the return place

    let local2 = builder.add_local(bool_ty(), None);
    assert_eq!(local2.0, 2);
}

#[test]
fn test_builder_add_arg_tracks_arg_locals() {
    let name = Symbol::intern("test");
    let mut builder = Builder::new(name, int_ty(), 2);

    let a = builder.add_arg(int_ty(), None);
    let b = builder.add_arg(int_ty(), None);

    assert_eq!(builder.function.arg_locals, vec![a, b]);
}

#[test]
fn test_builder_assign() {
    let name = Symbol::intern("test");
    let mut builder = Builder::new(name, int_ty(), 0);

    let entry = builder.new_block();
    builder.set_current_block(entry);

    let local = builder.add_local(int_ty(), None);
    builder.assign(
        Place::Local(local),
        Rvalue::Use(Operand::Constant(Constant {
            ty: int_ty(),
            kind: ConstantKind::Int(42),
        })),
    );

    let func = builder.build();
    assert_eq!(func.blocks.len(), 1);
    assert_eq!(func.blocks[entry].statements.len(), 1);
}

#[test]
fn test_build_inserts_entry_block_when_empty() {
    let name = Symbol::intern("test");
    let builder = Builder::new(name, int_ty(), 0);
    let func = builder.build();
    assert_eq!(func.blocks.len(), 1);
}

#[test]
fn test_constant_folding_optimization() {
    let name = Symbol::intern("test");
    let mut func = Function::new(name, int_ty(), 0);

    let entry = BlockId::from_usize(0);
    func.blocks.push(BasicBlock {
        id: entry,
        statements: vec![Statement::Assign(
            Place::Local(LocalId(1)),
            Rvalue::BinaryOp(
                BinOp::Add,
                Box::new(Operand::Constant(Constant { ty: int_ty(), kind: ConstantKind::Int(10) })),
                Box::new(Operand::Constant(Constant { ty: int_ty(), kind: ConstantKind::Int(20) })),
            ),
        )],
        terminator: Terminator::Return,
    });

    optimize_function(&mut func);

    if let Statement::Assign(_, Rvalue::Use(Operand::Constant(c))) = &func.blocks[entry].statements[0] {
        if let ConstantKind::Int(val) = c.kind {
            assert_eq!(val, 30);
        } else {
            panic!("expected an Int constant");
        }
    } else {
        panic!("expected the addition to fold into a single constant assignment");
    }
}

#[test]
fn test_dead_code_elimination_drops_unused_assignment() {
    let name = Symbol::intern("test");
    let mut func = Function::new(name, int_ty(), 0);

    let entry = BlockId::from_usize(0);
    func.blocks.push(BasicBlock {
        id: entry,
        statements: vec![Statement::Assign(
            Place::Local(LocalId(1)),
            Rvalue::Use(Operand::Constant(Constant { ty: int_ty(), kind: ConstantKind::Int(99) })),
        )],
        terminator: Terminator::Return,
    });

    let changed = dead_code(&mut func);
    assert!(changed);
    assert!(func.blocks[entry].statements.is_empty());
}

#[test]
fn test_mir_terminators() {
    let name = Symbol::intern("test");
    let mut builder = Builder::new(name, int_ty(), 0);

    let entry = builder.new_block();
    builder.set_current_block(entry);

    let target = builder.new_block();
    builder.terminator(Terminator::Goto { target });

    builder.set_current_block(target);
    builder.terminator(Terminator::Return);

    let func = builder.build();
    assert_eq!(func.blocks.len(), 2);
}

#[test]
fn test_aggregate_kinds() {
    let tuple_agg = AggregateKind::Tuple;
    let array_agg = AggregateKind::Array(int_ty());

    assert!(matches!(tuple_agg, AggregateKind::Tuple));
    assert!(matches!(array_agg, AggregateKind::Array(_)));
}

#[test]
fn test_projection_types() {
    let field_proj = Projection::Field(0);
    let index_proj = Projection::Index(LocalId(1));
    let deref_proj = Projection::Deref;

    assert!(matches!(field_proj, Projection::Field(_)));
    assert!(matches!(index_proj, Projection::Index(_)));
    assert!(matches!(deref_proj, Projection::Deref));
}

#[test]
fn test_lower_driver_produces_a_function_per_lambda() {
    use faxc_sem::{DefnId, Expr, Scheme};
    use faxc_util::{DefIdGenerator, Span};
    use std::collections::HashMap;
    use std::rc::Rc;

    let defs = DefIdGenerator::new();
    let param = defs.next();
    let lambda = Expr::Lambda {
        param,
        param_ty: int_ty(),
        body: Rc::new(Expr::Var(param, Span::DUMMY)),
        ty: Type::arrow(int_ty(), int_ty()),
        span: Span::DUMMY,
    };
    let defn_id = DefnId::new(Symbol::intern("id"), Scheme::monomorphic(Type::arrow(int_ty(), int_ty())));
    let mut map = HashMap::new();
    map.insert(defn_id, SpecializedUnit { expr: lambda, call_targets: HashMap::new() });

    let driver = LowerDriver::new(&defs);
    let program = driver.lower_program(&map).unwrap();
    assert_eq!(program.functions.len(), 1);
}
