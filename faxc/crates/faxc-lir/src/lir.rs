//! LIR (Low-level Intermediate Representation)
//!
//! The flattened, calling-convention-explicit view of a closure-converted
//! function that `faxc-gen` consumes directly when building LLVM IR through
//! `inkwell`. This crate performs no instruction selection and no register
//! allocation — both belong to `inkwell`'s backend downstream. Its only job
//! is fixing the ABI shape (`calling_convention::ClosureConvention`) and the
//! tuple layout every aggregate local needs (`stack_frame::TupleLayout`).

use faxc_sem::Type;
use faxc_util::Symbol;

use crate::stack_frame::FrameLayout;

/// One source function, lowered to its ABI-explicit shape.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: Symbol,
    pub arg_ty: Type,
    pub env_ty: Type,
    pub return_ty: Type,
    pub frame: FrameLayout,
}

impl Function {
    pub fn local_count(&self) -> usize {
        self.frame.local_count
    }
}
