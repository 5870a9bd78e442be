//! Exit codes for the CLI tool.

use jarshade::Error;

/// Exit code constants
pub const SUCCESS: i32 = 0;
/// Completed, but entries were skipped as duplicates
pub const WARNING: i32 = 1;
/// Fatal error occurred
pub const FATAL_ERROR: i32 = 2;
/// Archive or class-file format error
pub const BAD_ARCHIVE: i32 = 3;
/// I/O error
pub const IO_ERROR: i32 = 4;
/// Invalid command line arguments or worklist
pub const BAD_ARGS: i32 = 255;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    Warning,
    FatalError,
    BadArchive,
    IoError,
    BadArgs,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::Warning => WARNING,
            Self::FatalError => FATAL_ERROR,
            Self::BadArchive => BAD_ARCHIVE,
            Self::IoError => IO_ERROR,
            Self::BadArgs => BAD_ARGS,
        }
    }
}

/// Converts a jarshade error to an exit code
pub fn error_to_exit_code(error: &Error) -> ExitCode {
    match error {
        Error::Io(_) | Error::DestinationUnwritable { .. } => ExitCode::IoError,
        Error::ArchiveUnreadable { source, .. } => match source.as_ref() {
            Error::Io(_) => ExitCode::IoError,
            _ => ExitCode::BadArchive,
        },
        Error::Entry { source, .. } => error_to_exit_code(source),
        Error::Zip(_)
        | Error::MalformedClass { .. }
        | Error::InvalidDescriptor { .. }
        | Error::ConstantPoolOverflow { .. } => ExitCode::BadArchive,
        e if e.is_configuration_error() => ExitCode::BadArgs,
        Error::InvalidArchivePath(_) => ExitCode::BadArgs,
        // Future error variants - required by #[non_exhaustive]
        _ => ExitCode::FatalError,
    }
}
