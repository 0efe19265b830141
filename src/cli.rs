use crate::debugger::symbols::{parse_address, parse_symbol_definition};
use crate::mat::layout::MatLayout;
use crate::viewer::Viewer;
use crate::{Arguments, MemorySource};
use clap::{
    arg, crate_authors, crate_description, crate_name, crate_version, value_parser, Arg, ArgAction,
    ArgGroup, ArgMatches, Command,
};
use std::ffi::OsString;
use std::path::PathBuf;

pub struct CLIParser {
    command: Command,
}

impl CLIParser {
    pub fn new() -> Self {
        let command = Self::create_base_command();
        let command = Self::register_arguments(command);
        CLIParser { command }
    }

    pub fn parse<I, T>(&mut self, itr: I) -> Arguments
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self
            .command
            .try_get_matches_from_mut(itr)
            .unwrap_or_else(|e| e.exit());
        Self::extract_arguments(&matches)
    }

    fn register_arguments(command: Command) -> Command {
        let command = Self::register_memory_source_arguments(command);
        let command = Self::register_symbol_argument(command);
        let command = Self::register_layout_argument(command);
        let command = Self::register_output_directory_argument(command);
        let command = Self::register_viewer_arguments(command);
        Self::register_command_argument(command)
    }

    fn register_memory_source_arguments(command: Command) -> Command {
        command
            .arg(Self::create_pid_argument())
            .arg(Self::create_dump_argument())
            .arg(Self::create_dump_base_argument())
            .group(
                ArgGroup::new("memory_source")
                    .args(["pid", "dump"])
                    .required(true),
            )
    }

    fn register_symbol_argument(command: Command) -> Command {
        command.arg(Self::create_symbol_argument())
    }

    fn register_layout_argument(command: Command) -> Command {
        command.arg(Self::create_layout_argument())
    }

    fn register_output_directory_argument(command: Command) -> Command {
        command.arg(Self::create_output_directory_argument())
    }

    fn register_viewer_arguments(command: Command) -> Command {
        command
            .arg(Self::create_viewer_argument())
            .arg(Self::create_no_viewer_argument())
    }

    fn register_command_argument(command: Command) -> Command {
        command.arg(Self::create_command_argument())
    }

    fn create_base_command() -> Command {
        Command::new(crate_name!())
            .version(crate_version!())
            .author(crate_authors!())
            .about(crate_description!())
    }

    fn create_pid_argument() -> Arg {
        arg!(pid: -p --pid <PID> "Process whose memory is inspected")
            .value_parser(value_parser!(u32))
    }

    fn create_dump_argument() -> Arg {
        arg!(dump: --dump <FILE> "Raw memory dump to inspect instead of a live process")
            .value_parser(value_parser!(PathBuf))
            .requires("dump_base")
    }

    fn create_dump_base_argument() -> Arg {
        arg!(dump_base: --"dump-base" <ADDRESS> "Address the memory dump starts at")
            .value_parser(parse_address_value)
            .requires("dump")
    }

    fn create_symbol_argument() -> Arg {
        arg!(symbol: -s --symbol <DEFINITION> "Variable of the selected frame, as NAME=ADDRESS")
            .action(ArgAction::Append)
            .value_parser(parse_symbol_value)
    }

    fn create_layout_argument() -> Arg {
        arg!(layout: --layout <BITS> "Pointer width of the debuggee")
            .default_value("64")
            .value_parser(value_parser!(MatLayout))
    }

    fn create_output_directory_argument() -> Arg {
        arg!(output_directory: --"output-dir" <DIR> "Directory for written images [default: $TMPDIR/cv_imshow]")
            .value_parser(value_parser!(PathBuf))
    }

    fn create_viewer_argument() -> Arg {
        arg!(viewer: --viewer <PROGRAM> "Program opening the written images instead of the system viewer")
    }

    fn create_no_viewer_argument() -> Arg {
        arg!(no_viewer: --"no-viewer" "Only write the images")
            .action(ArgAction::SetTrue)
            .conflicts_with("viewer")
    }

    fn create_command_argument() -> Arg {
        Arg::new("command")
            .short('c')
            .long("command")
            .value_name("LINE")
            .help("Command to run; without any, commands are read from stdin")
            .action(ArgAction::Append)
    }

    fn extract_arguments(matches: &ArgMatches) -> Arguments {
        Arguments {
            memory_source: Self::extract_memory_source_argument(matches),
            symbols: Self::extract_symbol_argument(matches),
            layout: Self::extract_layout_argument(matches),
            output_directory: Self::extract_output_directory_argument(matches),
            viewer: Self::extract_viewer_argument(matches),
            commands: Self::extract_command_argument(matches),
        }
    }

    fn extract_memory_source_argument(matches: &ArgMatches) -> MemorySource {
        if let Some(pid) = matches.get_one::<u32>("pid") {
            return MemorySource::Process(*pid);
        }
        MemorySource::Dump {
            path: matches
                .get_one::<PathBuf>("dump")
                .expect("Either pid or dump must be provided")
                .clone(),
            base: *matches
                .get_one::<u64>("dump_base")
                .expect("Dump base is required together with dump"),
        }
    }

    fn extract_symbol_argument(matches: &ArgMatches) -> Vec<(String, u64)> {
        matches
            .get_many::<(String, u64)>("symbol")
            .map(|symbols| symbols.cloned().collect())
            .unwrap_or_default()
    }

    fn extract_layout_argument(matches: &ArgMatches) -> MatLayout {
        matches
            .get_one::<MatLayout>("layout")
            .expect("Layout must be provided, but was unset.")
            .to_owned()
    }

    fn extract_output_directory_argument(matches: &ArgMatches) -> Option<PathBuf> {
        matches.get_one::<PathBuf>("output_directory").cloned()
    }

    fn extract_viewer_argument(matches: &ArgMatches) -> Viewer {
        if matches.get_flag("no_viewer") {
            return Viewer::Disabled;
        }
        match matches.get_one::<String>("viewer") {
            Some(program) => Viewer::Command(program.clone()),
            None => Viewer::System,
        }
    }

    fn extract_command_argument(matches: &ArgMatches) -> Vec<String> {
        matches
            .get_many::<String>("command")
            .map(|commands| commands.cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for CLIParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_address_value(value: &str) -> Result<u64, String> {
    parse_address(value).map_err(|e| e.to_string())
}

fn parse_symbol_value(value: &str) -> Result<(String, u64), String> {
    parse_symbol_definition(value).map_err(|e| e.to_string())
}
