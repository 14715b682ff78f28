//! MIR optimization passes.

pub mod optimize;

pub use optimize::*;
