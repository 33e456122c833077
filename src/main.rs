mod cli;

use std::error::Error;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};

use log::{debug, error, info};

use cli::Cli;
use tanager::emitter::Emitter;
use tanager::lexer::Lexer;
use tanager::parser::Parser;
use tanager::vm::Vm;

fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::init();

    simple_logger::init_with_level((&args.verbosity).into()).unwrap();

    info!("reading {}", args.file.to_string_lossy());
    let source = match fs::read_to_string(&args.file) {
        Ok(source) => source,
        Err(io_error) => {
            error!("could not read '{}': {io_error}", args.file.to_string_lossy());
            std::process::exit(-1);
        }
    };

    if let Err(run_error) = run(&source, &args) {
        error!("{run_error}");
        std::process::exit(-1);
    }

    Ok(())
}

fn run(source: &str, args: &Cli) -> Result<(), Box<dyn Error>> {
    if args.dump_tokens && log::log_enabled!(log::Level::Debug) {
        let tokens = Lexer::new(source).collect::<Result<Vec<_>, _>>()?;
        debug!("lexeme stream:\n{tokens:#?}");
    }

    info!("parsing");
    let program = Parser::new(source)?.parse_program()?;

    if args.dump_ast && log::log_enabled!(log::Level::Debug) {
        debug!("parsed program:\n{program:#?}");
    }

    info!("compiling");
    let compiled = Emitter::compile(&program)?;

    info!("running");
    let stdin: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(std::io::stdin())),
    };
    let stdout = std::io::stdout();
    let mut vm = Vm::new(compiled, stdin, stdout.lock());

    vm.run()?;
    debug!("program finished");
    Ok(())
}
