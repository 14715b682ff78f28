//! faxc-drv — the compiler driver: argument parsing, session state, and the
//! six documented subcommands that walk the pipeline from source text to
//! emitted LLVM IR.
//!
//! ```text
//! faxc <command> <entry-module>
//!
//!   help                  print usage and exit
//!   find <name>           resolve a top-level name, report what it is
//!   parse <prog>          lex + parse, report success/failure
//!   compile <prog>        run the full pipeline, emit LLVM IR
//!   specialize <prog>     run through monomorphization, list specialized units
//!   ssa-gen <prog>        run through closure conversion, print the MIR
//!
//!   <anything else>       shorthand for `ssa-gen <anything else>`
//! ```
//!
//! Diagnostic dumps are controlled by `-show-env`/`-show-types`/
//! `-show-expr-types`/`-show-defn-types` (or their `SHOW_ENV`/`SHOW_TYPES`/
//! `SHOW_EXPR_TYPES`/`SHOW_DEFN_TYPES` environment mirrors) and are written
//! through `tracing` at `info` level, so a caller controls verbosity the
//! same way any other `tracing-subscriber`-backed tool does
//! (`RUST_LOG=faxc_drv=info`).

use std::path::PathBuf;

use faxc_mir::{LowerDriver, Program as MirProgram, Specializer};
use faxc_sem::Module;
use faxc_util::diagnostic::Handler;
use faxc_util::{DefIdGenerator, Symbol};

mod cli;
mod pipeline;

pub use cli::{parse_args, CliError, Command, Config};
pub use pipeline::PipelineError;

/// One compiler invocation's process-wide state: the fresh-symbol/`DefId`
/// counter and the diagnostic sink every phase reports through. Neither is
/// shared across invocations — each `faxc` process gets its own `Session`.
pub struct Session {
    pub config: Config,
    pub def_ids: DefIdGenerator,
    pub handler: Handler,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self { config, def_ids: DefIdGenerator::new(), handler: Handler::new() }
    }

    pub(crate) fn read_entry_module(&self, name: &str) -> Result<String, PipelineError> {
        let path = entry_module_path(name);
        std::fs::read_to_string(&path).map_err(|e| PipelineError::Io(path, e))
    }
}

fn entry_module_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(name);
    if path.extension().is_none() {
        path.set_extension("fax");
    }
    path
}

/// Runs one subcommand to completion, returning the process exit code.
/// Installs a `SIGINT` handler for the duration of the run so an
/// interrupted compile reports exit code 2 instead of the shell default.
pub fn run(command: Command, config: Config) -> i32 {
    let interrupted = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        let _ = ctrlc::set_handler(move || {
            interrupted.store(true, std::sync::atomic::Ordering::SeqCst);
        });
    }

    let mut session = Session::new(config);
    let result = dispatch(&mut session, command);

    if interrupted.load(std::sync::atomic::Ordering::SeqCst) {
        return 2;
    }

    match result {
        Ok(()) => {
            if session.handler.has_errors() {
                report_diagnostics(&session.handler);
                1
            } else {
                0
            }
        }
        Err(e) => {
            report_diagnostics(&session.handler);
            tracing::error!("{e}");
            eprintln!("error: {e}");
            1
        }
    }
}

fn dispatch(session: &mut Session, command: Command) -> Result<(), PipelineError> {
    match command {
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Find(name) => pipeline::find(session, &name),
        Command::Parse(prog) => pipeline::parse(session, &prog),
        Command::Compile(prog) => pipeline::compile(session, &prog),
        Command::Specialize(prog) => pipeline::specialize(session, &prog),
        Command::SsaGen(prog) => pipeline::ssa_gen(session, &prog),
    }
}

fn report_diagnostics(handler: &Handler) {
    for diag in handler.diagnostics() {
        eprintln!("{}: {}", diag.level, diag.message);
        for note in &diag.notes {
            eprintln!("  note: {note}");
        }
        for help in &diag.helps {
            eprintln!("  help: {help}");
        }
    }
}

fn print_help() {
    println!(
        "usage: faxc <command> <entry-module>\n\n\
         commands:\n  \
         help                  show this message\n  \
         find <name>           resolve a top-level name\n  \
         parse <prog>          lex and parse only\n  \
         compile <prog>        run the full pipeline and emit LLVM IR\n  \
         specialize <prog>     monomorphize and list specialized units\n  \
         ssa-gen <prog>        lower to closure-converted MIR\n\n\
         flags:\n  \
         -show-env             dump the top-level binding environment\n  \
         -show-types           dump every binding's generalized scheme\n  \
         -show-expr-types      dump inferred types at every expression node\n  \
         -show-defn-types      dump specialized definitions' concrete types"
    );
}

/// Runs analysis (modules B/C/D/E) over a freshly parsed entry module, the
/// shared prefix every subcommand past `parse` needs.
pub(crate) fn analyze(session: &mut Session, source: &str) -> Result<Module, PipelineError> {
    let tokens = pipeline::lex(source, &mut session.handler);
    let items = pipeline::parse_tokens(tokens, &mut session.handler);
    let module = faxc_sem::analyze_program(&items, &session.def_ids, &mut session.handler)
        .ok_or(PipelineError::AnalysisFailed)?;

    if session.config.show_env {
        tracing::info!(bindings = module.bindings.len(), "top-level environment");
        for binding in &module.bindings {
            tracing::info!(name = %binding.name.as_str(), "bound");
        }
    }
    if session.config.show_types {
        for binding in &module.bindings {
            tracing::info!(name = %binding.name.as_str(), scheme = %binding.scheme, "binding scheme");
        }
    }
    Ok(module)
}

/// Runs modules F/G (specialization + closure conversion) over an analyzed
/// module, the shared suffix `compile`/`ssa-gen` both need.
pub(crate) fn lower(session: &mut Session, module: &Module) -> Result<MirProgram, PipelineError> {
    let translation_map = Specializer::new(module).run().map_err(PipelineError::Specialization)?;

    if session.config.show_defn_types {
        for defn_id in translation_map.keys() {
            tracing::info!(defn = %defn_id, "specialized");
        }
    }

    let program = LowerDriver::new(&session.def_ids)
        .lower_program(&translation_map)
        .map_err(PipelineError::Lowering)?;

    if session.config.show_expr_types {
        for function in &program.functions {
            tracing::info!(name = %function.name.as_str(), locals = function.locals.len(), "lowered function");
        }
    }

    Ok(program)
}

pub(crate) fn resolve_symbol(module: &Module, name: &str) -> Option<Symbol> {
    let symbol = Symbol::intern(name);
    module.bindings.iter().find(|b| b.name == symbol).map(|b| b.name).or_else(|| {
        module.constructors.contains_key(&symbol).then_some(symbol)
    })
}
