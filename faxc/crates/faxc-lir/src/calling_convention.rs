//! The closure calling convention every lowered function uses.
//!
//! Every `mir::Function` produced by closure conversion takes exactly two
//! arguments: the source-level argument, then the environment tuple pointer
//! whose slot 0 is the function's own function-pointer value. `faxc-gen`
//! builds every LLVM function signature from this fixed shape directly;
//! there are no register classes or stack-passed arguments to classify here
//! because register allocation belongs to `inkwell`'s backend, not to this
//! crate.

/// Fixes the `(arg, env_ptr)` shape of every lowered function.
pub struct ClosureConvention;

impl ClosureConvention {
    /// Position of the source-level argument.
    pub const ARG_INDEX: usize = 0;
    /// Position of the environment tuple pointer.
    pub const ENV_INDEX: usize = 1;
    /// Every lowered function takes exactly this many arguments.
    pub const PARAM_COUNT: usize = 2;

    /// Slot 0 of the environment tuple is always the function's own
    /// function-pointer value (`AggregateKind::Closure`); captured free
    /// variables start at slot 1.
    pub const SELF_SLOT: u32 = 0;
    pub const FIRST_CAPTURE_SLOT: u32 = 1;

    /// Word offset of the `index`-th captured free variable within the
    /// environment tuple.
    pub fn capture_slot(index: u32) -> u32 {
        Self::FIRST_CAPTURE_SLOT + index
    }
}

#[cfg(test)]
mod abi_tests {
    use super::*;

    #[test]
    fn test_param_positions() {
        assert_eq!(ClosureConvention::ARG_INDEX, 0);
        assert_eq!(ClosureConvention::ENV_INDEX, 1);
        assert_eq!(ClosureConvention::PARAM_COUNT, 2);
    }

    #[test]
    fn test_capture_slots_start_after_self() {
        assert_eq!(ClosureConvention::SELF_SLOT, 0);
        assert_eq!(ClosureConvention::capture_slot(0), 1);
        assert_eq!(ClosureConvention::capture_slot(2), 3);
    }
}
