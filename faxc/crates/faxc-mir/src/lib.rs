//! Mid-level IR: generic CFG types, HIR-to-MIR lowering (closure conversion,
//! SSA-friendly block structure), monomorphization, and optimization passes.

pub mod mir;
pub mod builder;
pub mod lower;
pub mod opt;
pub mod analysis;
pub mod specialize;

#[cfg(test)]
mod tests;
#[cfg(test)]
mod edge_cases;

pub use mir::*;
pub use builder::*;
pub use lower::*;
pub use opt::*;
pub use analysis::*;
pub use specialize::*;
