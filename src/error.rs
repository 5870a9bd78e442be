//! Error types for shading operations.
//!
//! This module provides the [`Error`] enum which represents every failure mode
//! of a shading run, along with a convenient [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`. Fatal
//! conditions unwind straight to the caller with enough context (archive,
//! entry path, transformer) to diagnose them without re-running:
//!
//! ```rust,no_run
//! use jarshade::{Error, ShadeRequest, Shader};
//!
//! fn run(request: ShadeRequest) -> jarshade::Result<()> {
//!     match Shader::default().shade(request) {
//!         Ok(result) => {
//!             println!("wrote {} entries", result.entries_written);
//!             Ok(())
//!         }
//!         Err(e @ Error::ArchiveUnreadable { .. }) => {
//!             eprintln!("cannot read input: {}", e);
//!             Err(e)
//!         }
//!         Err(e) if e.is_configuration_error() => {
//!             eprintln!("fix the configuration: {}", e);
//!             Err(e)
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```
//!
//! Non-fatal conditions (a plain resource shadowed by an earlier archive) are
//! never errors; they are recorded in [`ShadeResult::duplicates`].
//!
//! [`ShadeResult::duplicates`]: crate::shade::ShadeResult::duplicates

use std::io;
use std::path::PathBuf;

/// Helper struct for formatting transformer error messages.
struct TransformerDisplay<'a> {
    transformer: &'a str,
    archive: Option<&'a str>,
    entry: Option<&'a str>,
    reason: &'a str,
}

impl std::fmt::Display for TransformerDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Transformer '{}' failed", self.transformer)?;
        match (self.entry, self.archive) {
            (Some(entry), Some(archive)) => write!(f, " on '{}' from {}", entry, archive)?,
            (Some(entry), None) => write!(f, " on '{}'", entry)?,
            (None, Some(archive)) => write!(f, " while processing {}", archive)?,
            (None, None) => {}
        }
        write!(f, ": {}", self.reason)
    }
}

/// The main error type for shading operations.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io], [`ArchiveUnreadable`][Self::ArchiveUnreadable], [`DestinationUnwritable`][Self::DestinationUnwritable] | File system, broken containers |
/// | Format | [`Zip`][Self::Zip], [`MalformedClass`][Self::MalformedClass], [`InvalidDescriptor`][Self::InvalidDescriptor], [`ConstantPoolOverflow`][Self::ConstantPoolOverflow] | Invalid archive or bytecode |
/// | Transformer | [`Transformer`][Self::Transformer] | Resource merge failures |
/// | Configuration | [`InvalidConfiguration`][Self::InvalidConfiguration], [`InvalidArchivePath`][Self::InvalidArchivePath] | Bad patterns or paths |
/// | Invariants | [`DuplicateEntry`][Self::DuplicateEntry], [`ResourceLimitExceeded`][Self::ResourceLimitExceeded] | Write-once and safety limits |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The ZIP container codec reported an error.
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A source archive could not be opened or read.
    ///
    /// This aborts the whole run; no output is committed.
    #[error("Cannot read archive {archive}: {source}")]
    ArchiveUnreadable {
        /// Label (usually the file path) of the offending archive.
        archive: String,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// The destination archive could not be created or committed.
    #[error("Cannot write destination '{}': {source}", path.display())]
    DestinationUnwritable {
        /// The destination path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Class-file bytes could not be parsed for relocation.
    ///
    /// The offset is relative to the start of the class file.
    #[error("Malformed class file at offset {offset:#x}: {reason}")]
    MalformedClass {
        /// The byte offset where parsing failed.
        offset: u64,
        /// A description of the problem.
        reason: String,
    },

    /// A type descriptor or generic signature inside a class file is malformed.
    #[error("Invalid descriptor {descriptor:?}: {reason}")]
    InvalidDescriptor {
        /// The offending descriptor or signature text.
        descriptor: String,
        /// A description of the problem.
        reason: String,
    },

    /// A remapped class needs more constant-pool slots than the format allows.
    #[error("Constant pool overflow: {count} entries exceed the 65535 limit")]
    ConstantPoolOverflow {
        /// The number of slots that would have been required.
        count: usize,
    },

    /// A fatal failure while handling one entry of one source archive.
    ///
    /// The shader wraps the underlying error so the caller always learns
    /// which archive and which entry triggered it.
    #[error("Failed on entry '{entry}' of {archive}: {source}")]
    Entry {
        /// Label of the source archive.
        archive: String,
        /// Archive-relative path of the entry.
        entry: String,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// A resource transformer failed while accumulating or flushing.
    #[error("{}", TransformerDisplay {
        transformer,
        archive: archive.as_deref(),
        entry: entry.as_deref(),
        reason,
    })]
    Transformer {
        /// Identity of the transformer.
        transformer: String,
        /// Source archive being processed, if any.
        archive: Option<String>,
        /// Entry being processed, if any.
        entry: Option<String>,
        /// Description of the failure.
        reason: String,
    },

    /// A relocator, transformer or option was configured with an invalid value.
    ///
    /// Raised before any archive is opened.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An archive entry path is invalid.
    ///
    /// Archive paths must:
    /// - Not contain null bytes
    /// - Not be empty
    /// - Not be absolute
    /// - Not contain `.` or `..` segments
    #[error("Invalid archive path: {0}")]
    InvalidArchivePath(String),

    /// The same archive-relative path was written to the output twice.
    #[error("Entry already written: {path}")]
    DuplicateEntry {
        /// The path that was already written.
        path: String,
    },

    /// A resource limit was exceeded while reading a source archive.
    #[error("Resource limit exceeded: {0}")]
    ResourceLimitExceeded(String),

    /// The JSON worklist could not be parsed.
    #[cfg(feature = "config")]
    #[error("Invalid worklist: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` if this error stems from invalid configuration.
    ///
    /// Configuration errors are detected before any archive is opened.
    pub fn is_configuration_error(&self) -> bool {
        match self {
            Error::InvalidConfiguration(_) => true,
            #[cfg(feature = "config")]
            Error::Config(_) => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a data corruption error.
    pub fn is_corruption(&self) -> bool {
        match self {
            Error::MalformedClass { .. } | Error::InvalidDescriptor { .. } | Error::Zip(_) => true,
            Error::ArchiveUnreadable { source, .. } | Error::Entry { source, .. } => {
                source.is_corruption()
            }
            _ => false,
        }
    }

    /// Returns the source archive associated with this error, if any.
    pub fn archive(&self) -> Option<&str> {
        match self {
            Error::ArchiveUnreadable { archive, .. } => Some(archive),
            Error::Entry { archive, .. } => Some(archive),
            Error::Transformer { archive, .. } => archive.as_deref(),
            _ => None,
        }
    }

    /// Returns the entry path associated with this error, if any.
    ///
    /// # Example
    ///
    /// ```rust
    /// use jarshade::Error;
    ///
    /// fn log_error(error: &Error) {
    ///     if let Some(name) = error.entry_name() {
    ///         eprintln!("Error for '{}': {}", name, error);
    ///     }
    /// }
    /// ```
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Error::Entry { entry, .. } => Some(entry),
            Error::Transformer { entry, .. } => entry.as_deref(),
            Error::DuplicateEntry { path } => Some(path),
            _ => None,
        }
    }

    /// Creates a MalformedClass error.
    pub fn malformed_class(offset: u64, reason: impl Into<String>) -> Self {
        Error::MalformedClass {
            offset,
            reason: reason.into(),
        }
    }

    /// Creates a Transformer error without archive context.
    ///
    /// The shader fills in the archive and entry when the error crosses it.
    pub fn transformer(transformer: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Transformer {
            transformer: transformer.into(),
            archive: None,
            entry: None,
            reason: reason.into(),
        }
    }

    /// Attaches archive and entry context to a transformer error.
    ///
    /// Other errors are wrapped in [`Error::Entry`].
    pub(crate) fn in_entry(self, archive: &str, entry: &str) -> Self {
        match self {
            Error::Transformer {
                transformer,
                archive: None,
                entry: None,
                reason,
            } => Error::Transformer {
                transformer,
                archive: Some(archive.to_string()),
                entry: Some(entry.to_string()),
                reason,
            },
            e @ (Error::Transformer { .. } | Error::Entry { .. }) => e,
            other => Error::Entry {
                archive: archive.to_string(),
                entry: entry.to_string(),
                source: Box::new(other),
            },
        }
    }
}

/// A specialized Result type for shading operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_malformed_class() {
        let err = Error::malformed_class(0x1c, "bad constant tag 99");
        assert_eq!(
            err.to_string(),
            "Malformed class file at offset 0x1c: bad constant tag 99"
        );
        assert!(err.is_corruption());
    }

    #[test]
    fn test_transformer_display_with_context() {
        let err = Error::transformer("components-xml", "unexpected end of document")
            .in_entry("lib/a.jar", "META-INF/plexus/components.xml");
        assert_eq!(
            err.to_string(),
            "Transformer 'components-xml' failed on 'META-INF/plexus/components.xml' \
             from lib/a.jar: unexpected end of document"
        );
        assert_eq!(err.archive(), Some("lib/a.jar"));
        assert_eq!(err.entry_name(), Some("META-INF/plexus/components.xml"));
    }

    #[test]
    fn test_transformer_display_without_context() {
        let err = Error::transformer("manifest", "bad header line");
        assert_eq!(err.to_string(), "Transformer 'manifest' failed: bad header line");
        assert_eq!(err.archive(), None);
    }

    #[test]
    fn test_in_entry_wraps_other_errors() {
        let err = Error::malformed_class(4, "truncated").in_entry("a.jar", "com/foo/Bar.class");
        assert!(matches!(err, Error::Entry { .. }));
        assert_eq!(err.archive(), Some("a.jar"));
        assert_eq!(err.entry_name(), Some("com/foo/Bar.class"));
        assert!(err.is_corruption());
    }

    #[test]
    fn test_in_entry_keeps_existing_context() {
        let inner = Error::malformed_class(4, "truncated").in_entry("a.jar", "A.class");
        let outer = inner.in_entry("b.jar", "B.class");
        assert_eq!(outer.archive(), Some("a.jar"));
    }

    #[test]
    fn test_configuration_error() {
        let err = Error::InvalidConfiguration("empty relocation pattern".into());
        assert!(err.is_configuration_error());
        assert!(!err.is_corruption());
    }

    #[test]
    fn test_duplicate_entry() {
        let err = Error::DuplicateEntry {
            path: "META-INF/NOTICE".into(),
        };
        assert_eq!(err.to_string(), "Entry already written: META-INF/NOTICE");
        assert_eq!(err.entry_name(), Some("META-INF/NOTICE"));
    }

    #[test]
    fn test_archive_unreadable_source_chain() {
        let err = Error::ArchiveUnreadable {
            archive: "broken.jar".into(),
            source: Box::new(Error::Zip(zip::result::ZipError::FileNotFound)),
        };
        assert!(err.to_string().starts_with("Cannot read archive broken.jar"));
        assert!(err.is_corruption());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
