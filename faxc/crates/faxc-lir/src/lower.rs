//! MIR to LIR lowering
//!
//! Extracts the ABI-explicit view of a closure-converted `mir::Function`:
//! the types occupying the fixed `(arg, env_ptr)` parameter positions, and
//! the tuple layout of every aggregate-typed local.

use crate::calling_convention::ClosureConvention;
use crate::lir::Function;
use crate::stack_frame::{FrameLayout, TupleLayout};
use faxc_mir as mir;
use faxc_sem::Type;

pub fn lower_mir_to_lir(mir_fn: &mir::Function) -> Function {
    assert_eq!(
        mir_fn.arg_locals.len(),
        ClosureConvention::PARAM_COUNT,
        "every lowered function takes exactly (arg, env_ptr)"
    );

    let arg_local = mir_fn.arg_locals[ClosureConvention::ARG_INDEX];
    let env_local = mir_fn.arg_locals[ClosureConvention::ENV_INDEX];
    let arg_ty = mir_fn.locals[arg_local].ty.clone();
    let env_ty = mir_fn.locals[env_local].ty.clone();

    let mut aggregate_locals = Vec::new();
    for (id, local) in mir_fn.locals.iter_enumerated() {
        if let Type::Tuple(fields) = &local.ty {
            aggregate_locals.push((id.0, TupleLayout::for_field_count(fields.len())));
        }
    }

    Function {
        name: mir_fn.name,
        arg_ty,
        env_ty,
        return_ty: mir_fn.return_ty.clone(),
        frame: FrameLayout {
            local_count: mir_fn.locals.len(),
            aggregate_locals,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_mir::Builder;
    use faxc_util::Symbol;

    fn int_ty() -> Type {
        Type::Id(Symbol::intern("Int"))
    }

    #[test]
    fn test_lower_extracts_closure_abi() {
        let name = Symbol::intern("f");
        let env_ty = Type::Tuple(vec![Type::arrow(int_ty(), int_ty())]);
        let mut builder = Builder::new(name, int_ty(), 2);
        builder.add_arg(int_ty(), None);
        builder.add_arg(env_ty.clone(), None);
        let mir_fn = builder.build();

        let lir_fn = lower_mir_to_lir(&mir_fn);
        assert_eq!(lir_fn.name, name);
        assert_eq!(lir_fn.arg_ty, int_ty());
        assert_eq!(lir_fn.env_ty, env_ty);
    }

    #[test]
    fn test_lower_records_tuple_locals() {
        let name = Symbol::intern("g");
        let mut builder = Builder::new(name, int_ty(), 2);
        builder.add_arg(int_ty(), None);
        builder.add_arg(Type::Tuple(vec![int_ty()]), None);
        builder.add_local(Type::Tuple(vec![int_ty(), int_ty()]), None);
        let mir_fn = builder.build();

        let lir_fn = lower_mir_to_lir(&mir_fn);
        // the env tuple and the extra pair local both count.
        assert_eq!(lir_fn.frame.aggregate_locals.len(), 2);
    }

    #[test]
    fn test_lower_preserves_return_type() {
        let name = Symbol::intern("h");
        let mut builder = Builder::new(name, int_ty(), 2);
        builder.add_arg(int_ty(), None);
        builder.add_arg(Type::Tuple(vec![]), None);
        let mir_fn = builder.build();

        let lir_fn = lower_mir_to_lir(&mir_fn);
        assert_eq!(lir_fn.return_ty, int_ty());
    }
}
