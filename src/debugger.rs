use std::io::Write;

use crate::{mat::layout::MatLayout, viewer::DisplaySettings};

pub mod process;
pub mod snapshot;
pub mod symbols;

use symbols::{parse_address, SymbolTable};

/// Read access to the address space of the debuggee.
pub trait Process {
    /// Reads exactly `size` bytes starting at `address`.
    fn read_memory(&self, address: u64, size: usize) -> crate::Result<Vec<u8>>;
}

/// A variable of the selected frame, resolved to the address of its storage.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    pub name: String,
    pub address: u64,
}

/// Everything a command needs from the debugger: the selected process,
/// the frame's variables and the stream for diagnostics.
pub struct Session<E: Write> {
    process: Box<dyn Process>,
    symbols: SymbolTable,
    layout: MatLayout,
    display: DisplaySettings,
    error_stream: E,
}

impl<E: Write> Session<E> {
    pub fn new(
        process: Box<dyn Process>,
        symbols: SymbolTable,
        layout: MatLayout,
        display: DisplaySettings,
        error_stream: E,
    ) -> Self {
        Self {
            process,
            symbols,
            layout,
            display,
            error_stream,
        }
    }

    /// Resolves `name` through the symbol table. Address literals resolve to
    /// themselves.
    pub fn find_variable(&self, name: &str) -> Option<Variable> {
        let address = self
            .symbols
            .lookup(name)
            .or_else(|| parse_address(name).ok())?;
        Some(Variable {
            name: name.to_owned(),
            address,
        })
    }

    pub fn read_memory(&self, address: u64, size: usize) -> crate::Result<Vec<u8>> {
        self.process.read_memory(address, size)
    }

    pub fn layout(&self) -> MatLayout {
        self.layout
    }

    pub fn display(&self) -> &DisplaySettings {
        &self.display
    }

    pub fn write_error(&mut self, message: &str) {
        if let Err(e) = writeln!(self.error_stream, "{}", message) {
            log::error!("Writing to the error stream failed: {}", e);
        }
    }

    pub fn error_stream(&self) -> &E {
        &self.error_stream
    }
}

/// Result channel of a single command invocation.
#[derive(Debug, Default)]
pub struct CommandReturn {
    output: String,
    error: Option<String>,
}

impl CommandReturn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_output(&mut self, message: &str) {
        self.output.push_str(message);
        if !message.ends_with('\n') {
            self.output.push('\n');
        }
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod test {
    use super::{snapshot::MemorySnapshot, symbols::SymbolTable, CommandReturn, Session};
    use crate::{mat::layout::MatLayout, viewer::DisplaySettings};

    fn create_session(symbols: SymbolTable) -> Session<Vec<u8>> {
        let mut snapshot = MemorySnapshot::new();
        snapshot.add_region(0x1000, vec![1, 2, 3, 4]);
        Session::new(
            Box::new(snapshot),
            symbols,
            MatLayout::Bits64,
            DisplaySettings::default(),
            Vec::new(),
        )
    }

    #[test]
    fn find_variable_by_symbol() {
        let mut symbols = SymbolTable::new();
        symbols.insert("frame", 0x1000);
        let session = create_session(symbols);
        let variable = session.find_variable("frame").expect("frame must resolve");
        assert_eq!(variable.address, 0x1000);
        assert_eq!(variable.name, "frame");
    }

    #[test]
    fn find_variable_by_address_literal() {
        let session = create_session(SymbolTable::new());
        let variable = session.find_variable("0x1002").expect("literal must resolve");
        assert_eq!(variable.address, 0x1002);
    }

    #[test]
    fn unknown_variable() {
        let session = create_session(SymbolTable::new());
        assert!(session.find_variable("missing").is_none());
    }

    #[test]
    fn read_through_session() {
        let session = create_session(SymbolTable::new());
        let bytes = session.read_memory(0x1001, 2).unwrap();
        assert_eq!(bytes, vec![2, 3]);
    }

    #[test]
    fn write_error_appends_line() {
        let mut session = create_session(SymbolTable::new());
        session.write_error("first");
        session.write_error("second");
        assert_eq!(session.error_stream().as_slice(), b"first\nsecond\n");
    }

    #[test]
    fn command_return_tracks_error() {
        let mut result = CommandReturn::new();
        result.append_output("written");
        assert!(result.succeeded());
        assert_eq!(result.output(), "written\n");
        result.set_error("broken");
        assert!(!result.succeeded());
        assert_eq!(result.error(), Some("broken"));
    }
}
