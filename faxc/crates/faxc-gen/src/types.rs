//! Type mapping from the semantic `Type` representation to LLVM types.
//!
//! Every value wider than a machine word (tuples, strings, closures, and
//! user-defined nominal types, which are all tagged heap tuples) is passed
//! around as an opaque pointer; the handful of scalar nominal types map
//! straight to their LLVM counterpart. There is no separate `Type` enum here
//! any more — `faxc_sem::Type` is the only type representation this crate
//! needs.

use faxc_sem::Type;
use inkwell::context::Context;
use inkwell::types::{BasicTypeEnum, PointerType};
use inkwell::AddressSpace;

pub struct TypeMapper<'ctx> {
    pub context: &'ctx Context,
}

impl<'ctx> TypeMapper<'ctx> {
    pub fn new(context: &'ctx Context) -> Self {
        Self { context }
    }

    /// The single pointer type every heap value (tuple, string, closure
    /// environment) is represented as.
    pub fn ptr_type(&self) -> PointerType<'ctx> {
        self.context.ptr_type(AddressSpace::default())
    }

    pub fn map_to_basic(&self, ty: &Type) -> BasicTypeEnum<'ctx> {
        match ty {
            Type::Id(name) if name.eq_str("Int") => self.context.i64_type().into(),
            Type::Id(name) if name.eq_str("Char") => self.context.i64_type().into(),
            Type::Id(name) if name.eq_str("Bool") => self.context.i64_type().into(),
            Type::Id(name) if name.eq_str("Float") => self.context.f64_type().into(),
            // Strings, closures, tuples, and any other nominal (user ADT)
            // type are all heap-allocated and referred to by pointer.
            _ => self.ptr_type().into(),
        }
    }

    pub fn is_float(&self, ty: &Type) -> bool {
        matches!(ty, Type::Id(name) if name.eq_str("Float"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_util::Symbol;

    #[test]
    fn test_int_maps_to_i64() {
        let context = Context::create();
        let mapper = TypeMapper::new(&context);
        let ty = Type::Id(Symbol::intern("Int"));
        assert_eq!(mapper.map_to_basic(&ty), context.i64_type().into());
    }

    #[test]
    fn test_float_maps_to_f64() {
        let context = Context::create();
        let mapper = TypeMapper::new(&context);
        let ty = Type::Id(Symbol::intern("Float"));
        assert_eq!(mapper.map_to_basic(&ty), context.f64_type().into());
    }

    #[test]
    fn test_tuple_maps_to_pointer() {
        let context = Context::create();
        let mapper = TypeMapper::new(&context);
        let ty = Type::Tuple(vec![Type::Id(Symbol::intern("Int"))]);
        assert_eq!(mapper.map_to_basic(&ty), mapper.ptr_type().into());
    }

    #[test]
    fn test_user_nominal_type_maps_to_pointer() {
        let context = Context::create();
        let mapper = TypeMapper::new(&context);
        let ty = Type::Id(Symbol::intern("Maybe"));
        assert_eq!(mapper.map_to_basic(&ty), mapper.ptr_type().into());
    }
}
