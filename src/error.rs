use std::fmt::Display;

#[derive(Debug)]
pub enum Error {
    UnsupportedDepth(u32),
    UnsupportedChannelCount(u32),
    UnsupportedDimensions(i32),
    InvalidMatrixHeader(&'static str),
    InvalidStride(usize, usize),
    EmptyMatrix,
    MatrixTooLarge,
    MemoryReadFailed(u64, usize),
    UnableToOpenProcessMemory(u32, std::io::Error),
    UnableToReadDumpFile(String, std::io::Error),
    InvalidAddress(String),
    InvalidSymbolDefinition(String),
    InvalidWindowName(String),
    UnableToCreateOutputDirectory(String, std::io::Error),
    UnableToOpenOutputFileForWriting(String, std::io::Error),
    FailedToEncodeImage(String),
    FailedToLaunchViewer(String, std::io::Error),
    UnsupportedPlatform(&'static str),
    InvalidCommandLine(&'static str),
    UnableToReadCommand(std::io::Error),
    UnableToWriteOutput(std::io::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedDepth(code) => {
                write!(f, "Unsupported cv::Mat depth {}", code)
            }
            Self::UnsupportedChannelCount(channels) => {
                write!(
                    f,
                    "Only 1 or 3 channels supported, matrix has {}",
                    channels
                )
            }
            Self::UnsupportedDimensions(dims) => {
                write!(f, "Only 2-dimensional matrices supported, matrix has {}", dims)
            }
            Self::InvalidMatrixHeader(field) => {
                write!(f, "Matrix header field '{}' holds an invalid value", field)
            }
            Self::InvalidStride(step, row_bytes) => {
                write!(
                    f,
                    "Row stride of {} bytes is smaller than a row of {} bytes",
                    step, row_bytes
                )
            }
            Self::EmptyMatrix => write!(f, "The image is empty"),
            Self::MatrixTooLarge => write!(f, "Matrix size exceeds the addressable range"),
            Self::MemoryReadFailed(address, size) => {
                write!(
                    f,
                    "Unable to read {} bytes of memory at {:#x}",
                    size, address
                )
            }
            Self::UnableToOpenProcessMemory(pid, error) => {
                write!(f, "Unable to open memory of process {}: {}", pid, error)
            }
            Self::UnableToReadDumpFile(path, error) => {
                write!(f, "Unable to read memory dump '{}': {}", path, error)
            }
            Self::InvalidAddress(text) => {
                write!(f, "'{}' is not a valid address", text)
            }
            Self::InvalidSymbolDefinition(text) => {
                write!(
                    f,
                    "Symbol definition '{}' must have the form NAME=ADDRESS",
                    text
                )
            }
            Self::InvalidWindowName(name) => {
                write!(f, "'{}' cannot be used as a window name", name)
            }
            Self::UnableToCreateOutputDirectory(path, error) => {
                write!(
                    f,
                    "Unable to create output directory '{}': {}",
                    path, error
                )
            }
            Self::UnableToOpenOutputFileForWriting(path, error) => {
                write!(
                    f,
                    "Unable to open output file '{}' for writing: {}",
                    path, error
                )
            }
            Self::FailedToEncodeImage(reason) => {
                write!(f, "Failed to encode image: {}", reason)
            }
            Self::FailedToLaunchViewer(program, error) => {
                write!(f, "Failed to launch viewer '{}': {}", program, error)
            }
            Self::UnsupportedPlatform(feature) => {
                write!(f, "{} is not supported on this platform", feature)
            }
            Self::InvalidCommandLine(reason) => {
                write!(f, "Invalid command line: {}", reason)
            }
            Self::UnableToReadCommand(error) => {
                write!(f, "Unable to read command: {}", error)
            }
            Self::UnableToWriteOutput(error) => {
                write!(f, "Unable to write command output: {}", error)
            }
        }
    }
}

impl std::error::Error for Error {}
