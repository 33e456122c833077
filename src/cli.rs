//! Command-line argument parsing for the `tanager` binary.

use clap::{Parser, ValueEnum};

/// Struct containing the CLI configuration for `tanager`.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// The path to the source file to interpret.
    #[arg(index = 1)]
    pub file: std::path::PathBuf,

    /// Redirect the interpreted program's own `read()` stdin from a file
    /// instead of the process's stdin.
    #[arg(long)]
    pub input: Option<std::path::PathBuf>,

    /// Dump the lexeme stream at debug level before parsing.
    #[arg(long)]
    pub dump_tokens: bool,

    /// Dump the parsed program at debug level before compiling.
    #[arg(long)]
    pub dump_ast: bool,

    /// Specify the log level of the interpreter.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default())]
    pub verbosity: LogLevel,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }
}

/// Enum for specifying the log level of `tanager`.
#[derive(ValueEnum, Clone, Default, Debug)]
pub enum LogLevel {
    /// The default log level. Only critical errors will be logged.
    #[default]
    #[value(alias("0"))]
    Error,

    /// Also log warnings.
    #[value(alias("1"))]
    Warn,

    /// Also log information about which phase (lex/parse/compile/run) is
    /// running.
    #[value(alias("2"))]
    Info,

    /// Log per-token and per-node detail from the lexer, parser, and emitter.
    /// Note: this output can be quite verbose.
    #[value(alias("3"))]
    Debug,

    /// Log everything, including non-fatal internal detail.
    #[value(alias("4"))]
    Trace,
}

impl From<&LogLevel> for log::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}
