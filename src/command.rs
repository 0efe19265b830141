use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

use clap::{arg, error::ErrorKind, Arg, ArgMatches, Command};

use crate::{
    debugger::{CommandReturn, Session, Variable},
    mat::MatInfo,
    pixels::{PixelBuffer, PixelFormat},
    viewer::{ensure_directory_exists, image_path},
    writer::save_png,
    Error,
};

pub mod interpreter;
pub mod tokenizer;

pub const COMMAND_NAME: &str = "cv_imshow";
pub const COMMAND_HELP: &str =
    "Visualize a cv::Mat object using the native image displaying application";

const DEFAULT_WINDOW_NAME: &str = "img";
const IMAGE_NOT_FOUND_MESSAGE: &str = "The image is not found.";
const UNSUPPORTED_DEPTH_MESSAGE: &str = "Unsupported cv::Mat depth";
const UNSUPPORTED_CHANNELS_MESSAGE: &str = "Only 1 or 3 channels supported";
const UNABLE_TO_SHOW_MESSAGE: &str = "Unable to show the image";

#[derive(Debug, PartialEq)]
pub struct ImshowOptions {
    pub variable: String,
    pub window_name: String,
}

#[derive(Debug, PartialEq)]
pub enum ParsedCommand {
    Show(ImshowOptions),
    /// help was requested, nothing to show
    Help(String),
}

pub struct ImshowCommandParser {
    command: Command,
}

impl ImshowCommandParser {
    pub fn new() -> Self {
        let command = Self::create_base_command();
        let command = Self::register_window_name_argument(command);
        let command = Self::register_variable_argument(command);
        Self { command }
    }

    /// Parses the words following the command name. Errors carry the
    /// rendered usage message.
    pub fn parse<I, T>(&mut self, words: I) -> Result<ParsedCommand, String>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let itr = std::iter::once(OsString::from(COMMAND_NAME))
            .chain(words.into_iter().map(Into::into));
        match self.command.try_get_matches_from_mut(itr) {
            Ok(matches) => Ok(ParsedCommand::Show(Self::extract_options(&matches))),
            Err(e) if e.kind() == ErrorKind::DisplayHelp => {
                Ok(ParsedCommand::Help(e.render().to_string()))
            }
            Err(e) => Err(e.render().to_string()),
        }
    }

    fn create_base_command() -> Command {
        Command::new(COMMAND_NAME)
            .about(COMMAND_HELP)
            .disable_version_flag(true)
    }

    fn register_window_name_argument(command: Command) -> Command {
        command.arg(Self::create_window_name_argument())
    }

    fn register_variable_argument(command: Command) -> Command {
        command.arg(Self::create_variable_argument())
    }

    fn create_window_name_argument() -> Arg {
        arg!(window_name: -w --"window-name" <NAME> "The window name for displaying the image")
            .default_value(DEFAULT_WINDOW_NAME)
    }

    fn create_variable_argument() -> Arg {
        Arg::new("variable")
            .value_name("VARIABLE")
            .help("The cv::Mat variable to display")
            .required(true)
    }

    fn extract_options(matches: &ArgMatches) -> ImshowOptions {
        ImshowOptions {
            variable: Self::extract_variable_argument(matches),
            window_name: Self::extract_window_name_argument(matches),
        }
    }

    fn extract_variable_argument(matches: &ArgMatches) -> String {
        matches
            .get_one::<String>("variable")
            .expect("Required argument variable not provided")
            .clone()
    }

    fn extract_window_name_argument(matches: &ArgMatches) -> String {
        matches
            .get_one::<String>("window_name")
            .expect("Window name has a default value, but was unset.")
            .clone()
    }
}

impl Default for ImshowCommandParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders the matrix named in `command` to a PNG and opens it.
///
/// Unsupported element types and channel counts are reported on the
/// session's error stream; every other failure becomes the command error.
pub fn cv_imshow<E: Write>(session: &mut Session<E>, command: &str, result: &mut CommandReturn) {
    let words = match tokenizer::split(command) {
        Ok(words) => words,
        Err(e) => {
            result.set_error(e.to_string());
            return;
        }
    };
    let options = match ImshowCommandParser::new().parse(words) {
        Ok(ParsedCommand::Show(options)) => options,
        Ok(ParsedCommand::Help(help)) => {
            result.append_output(&help);
            return;
        }
        Err(usage) => {
            result.set_error(usage);
            return;
        }
    };
    let Some(variable) = session.find_variable(&options.variable) else {
        result.set_error(IMAGE_NOT_FOUND_MESSAGE);
        return;
    };

    match show_matrix(session, &variable, &options.window_name) {
        Ok(path) => result.append_output(&format!("Image written to {}", path.display())),
        Err(e @ Error::UnsupportedDepth(_)) => {
            log::error!("{}: {}", variable.name, e);
            session.write_error(UNSUPPORTED_DEPTH_MESSAGE);
        }
        Err(e @ Error::UnsupportedChannelCount(_)) => {
            log::error!("{}: {}", variable.name, e);
            session.write_error(UNSUPPORTED_CHANNELS_MESSAGE);
        }
        Err(e) => {
            log::error!("{}: {}", variable.name, e);
            result.set_error(format!("{}: {}", UNABLE_TO_SHOW_MESSAGE, e));
        }
    }
}

fn show_matrix<E: Write>(
    session: &Session<E>,
    variable: &Variable,
    window_name: &str,
) -> crate::Result<PathBuf> {
    let directory = session.display().resolve_output_directory();
    let path = image_path(&directory, window_name)?;
    let info = MatInfo::read(session, variable)?;
    PixelFormat::from_channels(info.channels)?;
    let bytes = session.read_memory(info.data_address, info.data_size()?)?;
    let image = PixelBuffer::decode(&info, &bytes)?;
    ensure_directory_exists(&directory)?;
    save_png(&path, &image)?;
    log::info!(
        "Wrote {}x{} image of '{}' to '{}'",
        image.width(),
        image.height(),
        variable.name,
        path.display()
    );
    session.display().viewer.show(&path)?;
    Ok(path)
}

#[cfg(test)]
mod test {
    use clap::Command;

    use super::{ImshowCommandParser, ImshowOptions, ParsedCommand, COMMAND_NAME};

    #[test]
    fn parse_variable_argument() {
        let command = Command::new("test");
        let command = ImshowCommandParser::register_variable_argument(command);
        let matches = command.get_matches_from(vec![COMMAND_NAME, "frame"]);
        let variable = ImshowCommandParser::extract_variable_argument(&matches);
        assert_eq!(variable, "frame");
    }

    #[test]
    fn parse_window_name_argument() {
        let command = Command::new("test");
        let command = ImshowCommandParser::register_window_name_argument(command);
        let matches = command.get_matches_from(vec![COMMAND_NAME, "--window-name", "edges"]);
        let window_name = ImshowCommandParser::extract_window_name_argument(&matches);
        assert_eq!(window_name, "edges");
    }

    #[test]
    fn window_name_defaults_to_img() {
        let mut parser = ImshowCommandParser::default();
        let parsed = parser.parse(["frame"]).unwrap();
        assert_eq!(
            parsed,
            ParsedCommand::Show(ImshowOptions {
                variable: "frame".to_owned(),
                window_name: "img".to_owned(),
            })
        );
    }

    #[test]
    fn short_window_name_option() {
        let mut parser = ImshowCommandParser::new();
        let parsed = parser.parse(["-w", "gray", "frame"]).unwrap();
        assert_eq!(
            parsed,
            ParsedCommand::Show(ImshowOptions {
                variable: "frame".to_owned(),
                window_name: "gray".to_owned(),
            })
        );
    }

    #[test]
    fn missing_variable_is_reported_with_usage() {
        let mut parser = ImshowCommandParser::new();
        let words: [&str; 0] = [];
        let message = parser.parse(words).unwrap_err();
        assert!(message.contains("<VARIABLE>"), "unexpected message: {}", message);
    }

    #[test]
    fn help_is_not_an_error() {
        let mut parser = ImshowCommandParser::new();
        match parser.parse(["--help"]) {
            Ok(ParsedCommand::Help(text)) => assert!(text.contains("--window-name")),
            other => panic!("Help was not recognized: {:?}", other),
        }
    }
}
