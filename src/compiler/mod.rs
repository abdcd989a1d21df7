/*!
The compilation pipeline.

Scanning and parsing produce the arena AST; the passes then run strictly in
sequence: symbol construction, impl relocation and graph building, cycle
detection, semantic checking, memory layout, and code emission. Semantic
findings never abort the pipeline (they accumulate in the diagnostic stream
and flip the accept flag), but assembly is only produced for an accepted
program.
*/

pub mod ast;
pub mod lexer;
pub mod memory;
pub mod moon;
pub mod parser;
pub mod report;
pub mod semantics;

use std::fmt;

use crate::diagnostics::Reporter;
use ast::{Ast, NodeId};
use lexer::{Lexer, LexerError};
use parser::{Parser, ParserError, TokenStream};
use semantics::cycles::{detect_cycles, GraphKind};
use semantics::symbol_table::{ScopeId, ScopeTree};

/// A failure in the front end. Unlike semantic findings these stop the
/// pipeline: there is no tree to keep analyzing.
#[derive(Debug)]
pub enum FrontEndError {
    Lexer(Vec<LexerError>),
    Parser(ParserError),
}

impl fmt::Display for FrontEndError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrontEndError::Lexer(errors) => {
                for e in errors {
                    writeln!(f, "{}", e)?;
                }
                Ok(())
            }
            FrontEndError::Parser(e) => writeln!(f, "{}", e),
        }
    }
}

/// Everything a compilation run produces.
pub struct Compilation {
    pub ast: Ast,
    pub root: NodeId,
    pub tree: ScopeTree,
    pub global: ScopeId,
    pub reporter: Reporter,
    pub accept: bool,
    pub symbol_report: String,
    pub assembly: Option<String>,
}

pub fn compile(source: &str) -> Result<Compilation, FrontEndError> {
    let items = Lexer::new(source).tokenize();
    let mut tokens = Vec::new();
    let mut lex_errors = Vec::new();
    for item in items {
        match item {
            Ok(t) => tokens.push(t),
            Err(e) => lex_errors.push(e),
        }
    }
    if !lex_errors.is_empty() {
        return Err(FrontEndError::Lexer(lex_errors));
    }

    let (ast, root) = Parser::new(TokenStream::new(tokens))
        .parse()
        .map_err(FrontEndError::Parser)?;

    Ok(analyze(ast, root))
}

/// The back half of the pipeline, starting from a parsed tree: C2 through
/// C7 in order, with the report rendered whatever the outcome.
pub fn analyze(mut ast: Ast, root: NodeId) -> Compilation {
    let mut reporter = Reporter::new();
    let (mut tree, global, build_accept) =
        semantics::scope_builder::ScopeBuilder::build(&mut ast, root, &mut reporter);

    let relocation = semantics::relocate::relocate_impls(&mut tree, global, &mut reporter);
    let cyclic_inheritance =
        detect_cycles(&relocation.inheritance, GraphKind::Inheritance, &mut reporter);
    let cyclic_dependency =
        detect_cycles(&relocation.dependency, GraphKind::Dependency, &mut reporter);

    let check_accept = semantics::checker::check(&mut ast, root, &tree, &mut reporter);

    let accept = build_accept
        && relocation.accept
        && check_accept
        && !cyclic_inheritance
        && !cyclic_dependency;

    let assembly = if accept {
        memory::layout::compute_layout(&mut ast, root, &mut tree, global);
        Some(moon::emitter::emit_program(&ast, root, &tree, global))
    } else {
        None
    };

    let symbol_report = report::render_symbol_tables(&tree, global);

    Compilation {
        ast,
        root,
        tree,
        global,
        reporter,
        accept,
        symbol_report,
        assembly,
    }
}
