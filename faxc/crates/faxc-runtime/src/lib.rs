//! Fax Runtime Library
//!
//! Provides runtime support for Fax programs including:
//! - GC allocation functions (via FGC)
//! - Runtime initialization
//! - The load-bearing `abi` symbol table generated code links against

mod abi;
mod gc;

pub use abi::*;
pub use gc::*;
