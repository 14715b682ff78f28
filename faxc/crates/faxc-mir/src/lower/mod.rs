//! HIR to MIR lowering: closure conversion and SSA-friendly block structure.

pub mod hir_to_mir;

pub use hir_to_mir::{LowerDriver, LoweringError, Program};
