//! LIR (Low-level Intermediate Representation) Crate
//!
//! The ABI-explicit, calling-convention-fixed view of a closure-converted
//! program that `faxc-gen` lowers straight into LLVM IR. Register allocation
//! and instruction selection are `inkwell`'s job; this crate only fixes the
//! two-argument closure calling convention and tuple layout bookkeeping.

pub mod calling_convention;
pub mod lir;
pub mod lower;
pub mod stack_frame;

pub use calling_convention::*;
pub use lir::*;
pub use lower::*;
pub use stack_frame::*;
