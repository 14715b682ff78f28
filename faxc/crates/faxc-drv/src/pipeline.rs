//! The six subcommands, each running the pipeline only as far as it needs
//! to (`parse` stops at the AST, `specialize` stops before closure
//! conversion, `compile` runs all the way to LLVM IR).

use std::fmt;
use std::path::PathBuf;

use faxc_lex::{Lexer, Token};
use faxc_par::{Ast, Parser};
use faxc_util::diagnostic::Handler;
use inkwell::context::Context;
use inkwell::targets::{InitializationConfig, Target, TargetMachine};
use inkwell::OptimizationLevel;

use crate::{analyze, lower, resolve_symbol, Session};

#[derive(Debug)]
pub enum PipelineError {
    Io(PathBuf, std::io::Error),
    AnalysisFailed,
    UnknownName(String),
    Specialization(faxc_mir::SpecializationError),
    Lowering(faxc_mir::LoweringError),
    CodeGen(faxc_gen::CodeGenError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Io(path, e) => write!(f, "couldn't read `{}`: {e}", path.display()),
            PipelineError::AnalysisFailed => write!(f, "semantic analysis failed"),
            PipelineError::UnknownName(name) => write!(f, "no top-level definition named `{name}`"),
            PipelineError::Specialization(e) => write!(f, "specialization error: {e}"),
            PipelineError::Lowering(e) => write!(f, "lowering error: {e}"),
            PipelineError::CodeGen(e) => write!(f, "code generation error: {e}"),
        }
    }
}

impl std::error::Error for PipelineError {}

pub(crate) fn lex(source: &str, handler: &mut Handler) -> Vec<Token> {
    let mut lexer = Lexer::new(source, handler);
    std::iter::from_fn(|| Some(lexer.next_token()))
        .take_while(|t| *t != Token::Eof)
        .collect()
}

pub(crate) fn parse_tokens(tokens: Vec<Token>, handler: &mut Handler) -> Ast {
    let mut parser = Parser::new(tokens, handler);
    parser.parse()
}

pub fn parse(session: &mut Session, prog: &str) -> Result<(), PipelineError> {
    let source = session.read_entry_module(prog)?;
    let tokens = lex(&source, &mut session.handler);
    let items = parse_tokens(tokens, &mut session.handler);
    println!("parsed {} top-level item(s)", items.len());
    Ok(())
}

pub fn find(session: &mut Session, name: &str) -> Result<(), PipelineError> {
    let source = session.read_entry_module(name)?;
    let module = analyze(session, &source)?;
    match resolve_symbol(&module, name) {
        Some(sym) => {
            println!("found `{}`", sym.as_str());
            Ok(())
        }
        None => Err(PipelineError::UnknownName(name.to_string())),
    }
}

pub fn specialize(session: &mut Session, prog: &str) -> Result<(), PipelineError> {
    let source = session.read_entry_module(prog)?;
    let module = analyze(session, &source)?;
    let translation_map =
        faxc_mir::Specializer::new(&module).run().map_err(PipelineError::Specialization)?;
    println!("{} specialized definition(s):", translation_map.len());
    for defn_id in translation_map.keys() {
        println!("  {defn_id}");
    }
    Ok(())
}

pub fn ssa_gen(session: &mut Session, prog: &str) -> Result<(), PipelineError> {
    let source = session.read_entry_module(prog)?;
    let module = analyze(session, &source)?;
    let program = lower(session, &module)?;
    println!("{} function(s) after closure conversion:", program.functions.len());
    for function in &program.functions {
        println!("  {} ({} locals, {} blocks)", function.name.as_str(), function.locals.len(), function.blocks.len());
    }
    Ok(())
}

pub fn compile(session: &mut Session, prog: &str) -> Result<(), PipelineError> {
    let source = session.read_entry_module(prog)?;
    let module = analyze(session, &source)?;
    let program = lower(session, &module)?;

    Target::initialize_native(&InitializationConfig::default())
        .map_err(|e| PipelineError::CodeGen(faxc_gen::CodeGenError::LlvmOperationFailed(e)))?;
    let triple = TargetMachine::get_default_triple().as_str().to_string_lossy().into_owned();

    let context = Context::create();
    let mut backend =
        faxc_gen::llvm::LlvmBackend::new(&context, prog, triple, OptimizationLevel::Default);
    backend.compile_program(&program).map_err(PipelineError::CodeGen)?;
    println!("{}", backend.emit_llvm_ir());
    Ok(())
}
