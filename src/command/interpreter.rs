use std::collections::BTreeMap;
use std::io::Write;

use super::{cv_imshow, COMMAND_HELP, COMMAND_NAME};
use crate::debugger::{CommandReturn, Session};

const HELP_COMMAND_NAME: &str = "help";

pub type CommandHandler<E> = fn(&mut Session<E>, &str, &mut CommandReturn);

struct RegisteredCommand<E: Write> {
    handler: CommandHandler<E>,
    help: &'static str,
}

/// Dispatches command lines to the commands registered by name.
pub struct CommandInterpreter<E: Write> {
    commands: BTreeMap<String, RegisteredCommand<E>>,
}

impl<E: Write> CommandInterpreter<E> {
    pub fn new() -> Self {
        Self {
            commands: BTreeMap::new(),
        }
    }

    pub fn add_command(&mut self, name: &str, handler: CommandHandler<E>, help: &'static str) {
        log::debug!("Registering command '{}'", name);
        self.commands
            .insert(name.to_owned(), RegisteredCommand { handler, help });
    }

    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Runs one command line. The first word names the command, the rest of
    /// the line is handed to it unparsed.
    pub fn handle_command(&self, session: &mut Session<E>, line: &str) -> CommandReturn {
        let mut result = CommandReturn::new();
        let line = line.trim();
        let (name, arguments) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));
        if name.is_empty() {
            return result;
        }
        if name == HELP_COMMAND_NAME {
            result.append_output(&self.help_text());
            return result;
        }
        match self.commands.get(name) {
            Some(command) => (command.handler)(session, arguments.trim_start(), &mut result),
            None => result.set_error(format!("'{}' is not a valid command.", name)),
        }
        result
    }

    fn help_text(&self) -> String {
        let mut text = String::from("Registered commands:\n");
        for (name, command) in &self.commands {
            text.push_str(&format!("  {:<12} -- {}\n", name, command.help));
        }
        text
    }
}

impl<E: Write> Default for CommandInterpreter<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Registers the commands of this crate.
pub fn init_module<E: Write>(interpreter: &mut CommandInterpreter<E>) {
    interpreter.add_command(COMMAND_NAME, cv_imshow::<E>, COMMAND_HELP);
}
