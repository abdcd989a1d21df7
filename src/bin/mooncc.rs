extern crate log;
extern crate simplelog;

use std::path::{Path, PathBuf};
use std::time::Instant;

use mooncc::cli::*;
use mooncc::compiler::analyze;
use mooncc::compiler::lexer::Lexer;
use mooncc::compiler::parser::{Parser, TokenStream};
use mooncc::diagnostics::config::{Tracing, TracingConfig};
use mooncc::io::{read_source, write_artifact};

fn main() -> Result<(), i32> {
    let config = configure_cli().get_matches();

    if let Some(level) = get_log_level(&config) {
        configure_logging(level).expect("Failed to configure logger.")
    }

    let input = config
        .value_of("input")
        .expect("Expected an input source file to compile");
    let src_path = Path::new(input);
    let source = match read_source(src_path) {
        Ok(text) => text,
        Err(e) => {
            print_errs(&[e]);
            return Err(ERR_NO_INPUT);
        }
    };

    let out_dir = config
        .value_of("output-dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| src_path.parent().unwrap_or(Path::new(".")).to_path_buf());
    let stem = src_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("out");

    let lex_time = Instant::now();
    let mut lexer = Lexer::new(&source);
    lexer.set_tracing(tracing_from(&config, "trace-lexer"));
    let items = lexer.tokenize();
    let mut tokens = Vec::new();
    let mut lex_errors = Vec::new();
    for item in items {
        match item {
            Ok(t) => tokens.push(t),
            Err(e) => lex_errors.push(e.to_string()),
        }
    }
    if !lex_errors.is_empty() {
        print_errs(&lex_errors);
        return Err(ERR_LEXER_ERROR);
    }
    eprintln!("Lexer: {}", lex_time.elapsed().as_secs_f32());

    let parse_time = Instant::now();
    let mut parser = Parser::new(TokenStream::new(tokens));
    parser.set_tracing(tracing_from(&config, "trace-parser"));
    let (ast, root) = match parser.parse() {
        Ok(parsed) => parsed,
        Err(e) => {
            print_errs(&[e.to_string()]);
            return Err(ERR_PARSER_ERROR);
        }
    };
    eprintln!("Parser: {}", parse_time.elapsed().as_secs_f32());

    let semantic_time = Instant::now();
    let compilation = analyze(ast, root);
    eprintln!("Semantics: {}", semantic_time.elapsed().as_secs_f32());

    write_output(&out_dir, stem, "outsymboltables", &compilation.symbol_report)?;
    write_output(
        &out_dir,
        stem,
        "outsemanticerrors",
        &compilation.reporter.render(),
    )?;
    for d in compilation.reporter.diagnostics() {
        eprintln!("{}", d);
    }

    match compilation.assembly {
        Some(assembly) => {
            write_output(&out_dir, stem, "moon", &assembly)?;
            Ok(())
        }
        None => Err(ERR_SEMANTIC),
    }
}

fn write_output(dir: &Path, stem: &str, extension: &str, content: &str) -> Result<(), i32> {
    let path = dir.join(format!("{}.{}", stem, extension));
    write_artifact(&path, content).map_err(|e| {
        print_errs(&[e]);
        ERR_WRITE_ERROR
    })
}

fn tracing_from(config: &clap::ArgMatches, flag: &str) -> TracingConfig {
    match config.value_of(flag) {
        Some("all") => TracingConfig::All,
        Some(value) => value
            .parse()
            .map(TracingConfig::Only)
            .unwrap_or(TracingConfig::Off),
        None => TracingConfig::Off,
    }
}
