use clap::{App, Arg, ArgMatches};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

// Exit codes for the different failure stages
pub const ERR_SEMANTIC: i32 = 1;
pub const ERR_NO_INPUT: i32 = 2;
pub const ERR_PARSER_ERROR: i32 = 3;
pub const ERR_WRITE_ERROR: i32 = 4;
pub const ERR_LEXER_ERROR: i32 = 5;

pub fn print_errs(errs: &[String]) {
    for e in errs {
        eprintln!("{}", e);
    }
}

pub fn configure_cli() -> clap::App<'static, 'static> {
    App::new("Moon Compiler")
        .version("0.3.0")
        .about("Compiles Moon language source files into assembly for the Moon virtual machine")
        .arg(
            Arg::with_name("input")
                .short("i")
                .long("input")
                .takes_value(true)
                .required(true)
                .help("Source code file to compile"),
        )
        .arg(
            Arg::with_name("output-dir")
                .short("o")
                .long("output-dir")
                .takes_value(true)
                .help("Directory the output files are written to; defaults to the input's directory"),
        )
        .arg(
            Arg::with_name("log-level")
                .long("log-level")
                .takes_value(true)
                .possible_values(&["debug", "info", "warn", "error"])
                .help("Enables console logging at the given level"),
        )
        .arg(
            Arg::with_name("trace-lexer")
                .long("trace-lexer")
                .takes_value(true)
                .help("Prints a trace of every scanner step at the given source line.
                This is for debugging the scanner when adding new tokens."),
        )
        .arg(
            Arg::with_name("trace-parser")
                .long("trace-parser")
                .takes_value(true)
                .help("Prints a trace of every parser step at the given source line.
                This is for debugging the parser when adding new syntactical elements."),
        )
}

pub fn get_log_level(args: &ArgMatches) -> Option<LevelFilter> {
    match args.value_of("log-level") {
        Some("debug") => Some(LevelFilter::Debug),
        Some("info") => Some(LevelFilter::Info),
        Some("warn") => Some(LevelFilter::Warn),
        Some("error") => Some(LevelFilter::Error),
        _ => None,
    }
}

pub fn configure_logging(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
}
