use std::{
    io::{self, BufRead, IsTerminal, Write},
    path::PathBuf,
};

pub use cli::CLIParser;
pub use error::Error;

use command::interpreter::{init_module, CommandInterpreter};
use debugger::{
    process::LiveProcess, snapshot::MemorySnapshot, symbols::SymbolTable, Process, Session,
};
use mat::layout::MatLayout;
use viewer::{DisplaySettings, Viewer};

mod cli;
pub mod command;
pub mod debugger;
mod error;
mod logger;
pub mod mat;
pub mod pixels;
pub mod viewer;
mod writer;

pub type Result<T> = std::result::Result<T, error::Error>;

const PROMPT: &str = "(cv_imshow) ";
const QUIT_COMMANDS: [&str; 3] = ["quit", "exit", "q"];

#[derive(Clone, Debug, PartialEq)]
pub enum MemorySource {
    Process(u32),
    Dump { path: PathBuf, base: u64 },
}

pub struct Arguments {
    memory_source: MemorySource,
    symbols: Vec<(String, u64)>,
    layout: MatLayout,
    output_directory: Option<PathBuf>,
    viewer: Viewer,
    commands: Vec<String>,
}

fn open_process(source: &MemorySource) -> Result<Box<dyn Process>> {
    match source {
        MemorySource::Process(pid) => Ok(Box::new(LiveProcess::attach(*pid)?)),
        MemorySource::Dump { path, base } => {
            Ok(Box::new(MemorySnapshot::from_dump_file(path, *base)?))
        }
    }
}

pub fn create_session<E: Write>(arguments: &Arguments, error_stream: E) -> Result<Session<E>> {
    let process = open_process(&arguments.memory_source)?;
    let mut symbols = SymbolTable::new();
    for (name, address) in &arguments.symbols {
        symbols.insert(name, *address);
    }
    let display = DisplaySettings {
        output_directory: arguments.output_directory.clone(),
        viewer: arguments.viewer.clone(),
    };
    Ok(Session::new(
        process,
        symbols,
        arguments.layout,
        display,
        error_stream,
    ))
}

/// Runs one command line and prints its result. Returns whether it succeeded.
pub fn execute_command<E: Write, W: Write>(
    interpreter: &CommandInterpreter<E>,
    session: &mut Session<E>,
    line: &str,
    output: &mut W,
) -> Result<bool> {
    let result = interpreter.handle_command(session, line);
    output
        .write_all(result.output().as_bytes())
        .map_err(Error::UnableToWriteOutput)?;
    if let Some(message) = result.error() {
        session.write_error(&format!("error: {}", message));
    }
    Ok(result.succeeded())
}

/// Reads command lines until end of input or a quit command. Returns the
/// number of failed commands.
pub fn run_interactive<E: Write, R: BufRead, W: Write>(
    interpreter: &CommandInterpreter<E>,
    session: &mut Session<E>,
    input: R,
    output: &mut W,
    show_prompt: bool,
) -> Result<usize> {
    let mut failures = 0;
    let mut lines = input.lines();
    loop {
        if show_prompt {
            write!(output, "{}", PROMPT).map_err(Error::UnableToWriteOutput)?;
            output.flush().map_err(Error::UnableToWriteOutput)?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.map_err(Error::UnableToReadCommand)?;
        if QUIT_COMMANDS.contains(&line.trim()) {
            break;
        }
        if !execute_command(interpreter, session, &line, output)? {
            failures += 1;
        }
    }
    Ok(failures)
}

/// Runs the commands given in `arguments`, or the commands read from stdin
/// when there are none. Returns the number of failed commands.
pub fn run(arguments: &Arguments) -> Result<usize> {
    let mut session = create_session(arguments, io::stderr())?;
    let mut interpreter = CommandInterpreter::new();
    init_module(&mut interpreter);
    let mut output = io::stdout().lock();

    if arguments.commands.is_empty() {
        let stdin = io::stdin();
        let show_prompt = stdin.is_terminal();
        return run_interactive(
            &interpreter,
            &mut session,
            stdin.lock(),
            &mut output,
            show_prompt,
        );
    }

    let mut failures = 0;
    for line in &arguments.commands {
        if !execute_command(&interpreter, &mut session, line, &mut output)? {
            failures += 1;
        }
    }
    Ok(failures)
}
