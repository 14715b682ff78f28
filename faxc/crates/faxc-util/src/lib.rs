//! faxc-util - Core Utilities and Foundation Types
//!
//! ============================================================================
//! MODULE OVERVIEW
//! ============================================================================
//!
//! This module provides fundamental utilities and types that form the foundation
//! of the entire faxc compiler infrastructure. These utilities are designed to be
//! zero-cost abstractions that improve code clarity, type safety, and performance
//! without runtime overhead.
//!
//! DESIGN PRINCIPLES:
//! ------------------
//! 1. ZERO-COST ABSTRACTIONS
//!    All utilities compile down to efficient code with no runtime penalty
//!    compared to hand-written implementations.
//!
//! 2. TYPE SAFETY
//!    Leverage Rust's type system to prevent bugs at compile time.
//!    Examples: Typed indices prevent mixing different ID spaces.
//
// 3. PERFORMANCE
//    Optimize for the common case while maintaining correctness.
//    Examples: Efficient string interning, lock-free data structures.
//
// 4. ERGONOMICS
//    APIs should be intuitive and easy to use correctly.
//    Examples: Builder patterns, type inference-friendly interfaces.
//
// ============================================================================
// STRING INTERNING (SYMBOL)
// ============================================================================
//
// THEORY OF STRING INTERNING:
// ---------------------------
//
// String interning is a technique for storing only one copy of each distinct
// string value, which must be immutable. All occurrences of the same string
// point to the same memory location, enabling fast equality comparisons and
// reducing memory usage.
//
// MATHEMATICAL BASIS:
// -------------------
// Let S be the set of all strings in a program.
// Let I: S → ℕ be the interning function that maps each string to a unique ID.
//
// Properties:
// - ∀s₁, s₂ ∈ S: I(s₁) = I(s₂) ⟺ s₁ = s₂  (injective mapping)
// - |Range(I)| ≤ |S|  (compression through deduplication)
//
// TIME COMPLEXITY:
// ----------------
// Without interning:
// - Comparison: O(n) where n is string length
// - Hash computation: O(n)
// - Memory: O(total length of all strings)
//
// With interning:
// - Comparison: O(1) (integer comparison)
// - Hash computation: O(1) (precomputed)
// - Memory: O(unique strings × avg length) + O(|S| × sizeof(ID))
//
// MEMORY LAYOUT:
// --------------
// ```
// String Table (Global):
// ┌─────────────────────────────────────────────────────────────┐
// │ Slot 0 │ Slot 1 │ Slot 2 │ Slot 3 │ ... │ Slot N            │
// ├────────┴────────┴────────┴────────┴─────┴───────────────────┤
// │ "main" │ "fn"   │ "let"  │ "x"    │ ... │ "very_long_id"   │
// └─────────────────────────────────────────────────────────────┘
//        ↑
//        Interned strings stored contiguously or in arena
//
// Symbol (4 bytes):
// ┌──────────────┐
// │    index     │  u32: index into string table
// │   (32-bit)   │
// └──────────────┘
//
// String (24 bytes on 64-bit):
// ┌────────┬────────┬────────┐
// │ pointer│ length │ capacity│  Heap allocation for data
// │  8B    │   8B   │   8B   │
// └────────┴────────┴────────┘
// ```
//
// USE CASES IN COMPILERS:
// -----------------------
// 1. IDENTIFIERS: Variable names, function names appear thousands of times
// 2. KEYWORDS: "let", "fn", "if" are repeated throughout source
// 3. TYPE NAMES: "int", "string", custom types
// 4. STRING LITERALS: May be repeated in source code
//
// THREAD-SAFE IMPLEMENTATION:
// ---------------------------
// Global string table must support concurrent access:
//
// Approach 1: Read-Write Lock (RwLock)
// - Multiple readers can access concurrently
// - Writers (new intern operations) require exclusive access
// - Good for read-heavy workloads
//
// Approach 2: Lock-Free Hash Table (e.g., DashMap)
// - No locks for read or write
// - Better concurrency under heavy contention
// - Higher memory overhead
//
// Approach 3: Thread-Local Tables with Merge
// - Each thread has local table
// - Periodic merge to global table
// - Best for maximum parallelism, complex implementation
//
// COLLISION HANDLING:
// -------------------
// Strings are hashed for O(1) lookup. Collisions handled via:
// - Chaining: Linked list of strings with same hash
// - Open addressing: Probe sequence until empty slot found
//
// Example (chaining):
// ```
// Hash Table (buckets):
// Bucket 0: ["main" → 0]
// Bucket 1: ["fn" → 1] → ["if" → 5]  (collision resolved via chain)
// Bucket 2: ["let" → 2]
// ```
//
// IMPLEMENTATION STRATEGIES:
// --------------------------
// 1. LAZY INTERNING
//    Strings interned on first use
//    Pro: Only pay for what you use
//    Con: First access slower
//
// 2. EAGER INTERNING
//    All strings interned upfront (e.g., all keywords)
//    Pro: Predictable performance
//    Con: Higher memory if not all used
//
// 3. LAZY + CACHE
//    Cache recent lookups to avoid table access
//    Pro: Fast for repeated lookups
//    Con: Cache management overhead


// ============================================================================
// CRATE LAYOUT
// ============================================================================
//
// The types sketched above in this module's doc comment are implemented for
// real in their own submodules rather than inline here. Keeping the theory
// preamble next to a thin re-export layer means every downstream crate reads
// `faxc_util::Symbol`, `faxc_util::Span`, `faxc_util::diagnostic::Handler`
// and gets the working implementation, not a placeholder.

pub mod def_id;
pub mod diagnostic;
pub mod error;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use def_id::{DefId, DefIdGenerator};
pub use diagnostic::{Diagnostic, DiagnosticBuilder, Handler, Level};
pub use index_vec::{define_idx, Idx, IndexVec};
pub use span::{FileId, SourceFile, SourceMap, Span};
pub use symbol::Symbol;

// Re-export commonly used types
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
