//! # BASIC
//!
//! Load a BASIC program from a file and run it.
//!

use ansi_term::Style;
use basic::lang::Error;
use basic::mach::{Config, Program, Scope, Session};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "basic", version, about = "Run a line-numbered BASIC program")]
struct Args {
    /// Program file to load
    file: PathBuf,

    /// Nested program activations allowed before CALL DEPTH EXCEEDED
    #[arg(long, default_value_t = Config::default().max_call_depth)]
    max_depth: usize,

    /// Don't type check variable stores
    #[arg(long, action = ArgAction::SetTrue)]
    dynamic: bool,

    /// Print the listing instead of running
    #[arg(long, action = ArgAction::SetTrue)]
    list: bool,

    /// Protect the program before listing or running it
    #[arg(long, action = ArgAction::SetTrue)]
    protect: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = Config {
        max_call_depth: args.max_depth,
        static_types: !args.dynamic,
        ..Config::default()
    };
    let mut session = Session::new(config);
    let interrupted = session.interrupt_flag();
    if let Err(error) = ctrlc::set_handler(move || {
        interrupted.store(true, std::sync::atomic::Ordering::SeqCst);
    }) {
        log::warn!("no Ctrl-C handler: {}", error);
    }

    match run(&args, &mut session) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if !error.is_reported() {
                eprintln!("{}", Style::new().bold().paint(error.to_string()));
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, session: &mut Session) -> Result<(), Error> {
    let text = match std::fs::read_to_string(&args.file) {
        Ok(text) => text,
        Err(error) => {
            return Err(basic::error!(UndefinedProgram; format!(
                "{}: {}",
                args.file.display(),
                error
            )))
        }
    };
    let name = args
        .file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "PROGRAM".to_string());
    let mut program = session.new_program(&name);
    program.set_source(&args.file);
    program.load_str(&text)?;
    program.set_saved();
    if args.protect {
        program.protect()?;
    }
    if args.list {
        for line in program.listing() {
            println!("{}", line);
        }
        return Ok(());
    }
    let program = session.catalog.register(program);
    let result = run_program(&mut program.borrow_mut(), session);
    print!("{}", session.take_output());
    for error in session.take_errors() {
        eprintln!("{}", Style::new().bold().paint(error.to_string()));
    }
    result
}

fn run_program(program: &mut Program, session: &mut Session) -> Result<(), Error> {
    let mut scope = Scope::new();
    program.run(session, &mut scope, None, None)?;
    Ok(())
}
