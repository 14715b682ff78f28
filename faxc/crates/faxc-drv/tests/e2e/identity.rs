//! Scenario 1 — identity: infer `id : forall a. a -> a`, specialize it at
//! `Int -> Int`, and run the specialized program all the way through
//! closure-converted MIR with no diagnostics.
//!
//! ```text
//! fn id(x: Int) -> Int { x }
//! fn main() -> Int { id(1) }
//! ```

use super::support::*;
use faxc_par::ast::Item;
use faxc_util::{DefIdGenerator, Handler};

#[test]
fn id_specializes_to_int_arrow_int_and_lowers_cleanly() {
    let id_fn = fn_item("id", vec![param("x", "Int")], "Int", path_expr("x"));
    let main_fn = fn_item("main", vec![], "Int", call("id", vec![int_lit(1)]));
    let items = vec![Item::Fn(id_fn), Item::Fn(main_fn)];

    let def_ids = DefIdGenerator::new();
    let mut handler = Handler::new();
    let module = faxc_sem::analyze_program(&items, &def_ids, &mut handler).expect("analysis runs");
    assert!(!handler.has_errors(), "no diagnostics expected: {:?}", handler.diagnostics());

    let translation_map = faxc_mir::Specializer::new(&module).run().expect("specialization succeeds");
    let id_name = faxc_util::Symbol::intern("id");
    let id_defn = translation_map.keys().find(|d| d.name == id_name).expect("id is demanded by main");
    assert_eq!(id_defn.scheme.ty.repr(), faxc_sem::Type::arrow(faxc_sem::Type::Id(faxc_util::Symbol::intern("Int")), faxc_sem::Type::Id(faxc_util::Symbol::intern("Int"))).repr());

    let program = faxc_mir::LowerDriver::new(&def_ids).lower_program(&translation_map).expect("lowering succeeds");
    assert!(program.functions.iter().any(|f| f.name.as_str().starts_with("main")));
}
