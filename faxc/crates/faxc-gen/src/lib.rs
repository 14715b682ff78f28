//! Code generation: lowers a closure-converted program straight to LLVM IR.
//!
//! `llvm::LlvmBackend` is the sink — it owns type mapping, the runtime ABI
//! declarations, and the per-function MIR walk. Register allocation and
//! instruction selection are left entirely to `inkwell`'s own backend.

pub mod error;
pub mod llvm;
pub mod types;

pub use error::{CodeGenError, Result};
pub use llvm::*;
pub use types::*;
