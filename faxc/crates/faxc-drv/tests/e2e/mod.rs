//! End-to-end scenarios for the compiler driver.
//!
//! `faxc-lex`/`faxc-par`'s tokenizer and grammar internals are out of scope
//! (see DESIGN.md), so these scenarios cannot drive the pipeline from real
//! source text through the `faxc` binary the way a finished front end would.
//! Instead each one hand-builds the `faxc_par::ast` a finished front end
//! would have produced and drives it through the same `faxc_sem`/`faxc_mir`
//! calls `faxc_drv::{analyze, lower}` make internally.

mod support;

mod ambiguous_instance;
mod closure_capture;
mod identity;
mod integer_overload;
mod non_exhaustive_match;
mod occurs_check;
