//! Archive entry paths and entry classification.
//!
//! Every entry read from or written to a jar carries an [`ArchivePath`]: a
//! validated, slash-separated, archive-relative name. [`EntryKind`] decides
//! how the shader treats the entry (class, resource or directory).

use crate::{Error, Result};
use std::fmt;

/// Maximum length for archive paths (in bytes).
///
/// The ZIP format stores names with a 16-bit length field.
const MAX_PATH_LENGTH: usize = u16::MAX as usize;

/// Directory holding release-specific classes in a multi-release jar.
const VERSIONS_PREFIX: &str = "META-INF/versions/";

/// Suffix that marks a compiled class entry.
pub const CLASS_SUFFIX: &str = ".class";

/// How an archive entry is handled during shading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A compiled class file (`*.class`).
    Class,
    /// Any other file entry.
    Resource,
    /// A directory marker (name ending in `/`).
    Directory,
}

impl EntryKind {
    /// Classifies a raw entry name as stored in the container.
    ///
    /// # Examples
    ///
    /// ```
    /// use jarshade::EntryKind;
    ///
    /// assert_eq!(EntryKind::classify("com/foo/Bar.class"), EntryKind::Class);
    /// assert_eq!(EntryKind::classify("META-INF/MANIFEST.MF"), EntryKind::Resource);
    /// assert_eq!(EntryKind::classify("com/foo/"), EntryKind::Directory);
    /// ```
    pub fn classify(raw_name: &str) -> Self {
        if raw_name.ends_with('/') {
            EntryKind::Directory
        } else if raw_name.len() > CLASS_SUFFIX.len() && raw_name.ends_with(CLASS_SUFFIX) {
            EntryKind::Class
        } else {
            EntryKind::Resource
        }
    }

    /// Returns a short lowercase label, used in listings.
    pub fn label(self) -> &'static str {
        match self {
            EntryKind::Class => "class",
            EntryKind::Resource => "resource",
            EntryKind::Directory => "directory",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// A validated archive-relative path.
///
/// `ArchivePath` guarantees that:
/// - No NUL bytes are present
/// - The path is not absolute (does not start with `/`)
/// - No empty segments exist (no `//` or trailing `/`)
/// - No `.` or `..` segments are present
///
/// # Examples
///
/// ```
/// use jarshade::ArchivePath;
///
/// let path = ArchivePath::new("com/foo/Bar.class").unwrap();
/// assert_eq!(path.class_name().as_deref(), Some("com.foo.Bar"));
///
/// assert!(ArchivePath::new("../secret").is_err());
/// assert!(ArchivePath::new("/absolute/path").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchivePath(String);

impl ArchivePath {
    /// Creates a new `ArchivePath` from a string, validating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the path:
    /// - Contains NUL bytes
    /// - Is an absolute path (starts with `/`)
    /// - Contains empty segments (e.g., `a//b`) or a trailing slash
    /// - Contains `.` or `..` segments
    /// - Is empty
    pub fn new(s: &str) -> Result<Self> {
        Self::validate(s)?;
        Ok(Self(s.to_string()))
    }

    /// Creates the path of the class file for a dotted class name.
    ///
    /// ```
    /// use jarshade::ArchivePath;
    ///
    /// let path = ArchivePath::for_class("shaded.com.foo.Bar").unwrap();
    /// assert_eq!(path.as_str(), "shaded/com/foo/Bar.class");
    /// ```
    pub fn for_class(class_name: &str) -> Result<Self> {
        let mut s = class_name.replace('.', "/");
        s.push_str(CLASS_SUFFIX);
        Self::try_from(s)
    }

    fn validate(s: &str) -> Result<()> {
        if s.contains('\0') {
            return Err(Error::InvalidArchivePath("contains NUL byte".into()));
        }

        if s.is_empty() {
            return Err(Error::InvalidArchivePath("empty path".into()));
        }

        if s.len() > MAX_PATH_LENGTH {
            return Err(Error::InvalidArchivePath(format!(
                "path exceeds maximum length of {} bytes",
                MAX_PATH_LENGTH
            )));
        }

        if s.starts_with('/') {
            return Err(Error::InvalidArchivePath(
                "absolute path not allowed".into(),
            ));
        }

        if s.ends_with('/') {
            return Err(Error::InvalidArchivePath(
                "trailing slash not allowed".into(),
            ));
        }

        for segment in s.split('/') {
            if segment.is_empty() {
                return Err(Error::InvalidArchivePath(
                    "empty segment (consecutive slashes)".into(),
                ));
            }
            if segment == "." {
                return Err(Error::InvalidArchivePath("'.' segment not allowed".into()));
            }
            if segment == ".." {
                return Err(Error::InvalidArchivePath(
                    "'..' segment not allowed (path traversal)".into(),
                ));
            }
        }

        Ok(())
    }

    /// Returns the path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the kind this path would be classified as.
    pub fn kind(&self) -> EntryKind {
        EntryKind::classify(&self.0)
    }

    /// Returns the dotted class name for a class entry.
    ///
    /// Returns `None` when the path does not name a class file.
    pub fn class_name(&self) -> Option<String> {
        self.internal_class_name().map(|name| name.replace('/', "."))
    }

    /// Returns the slashed (JVM internal) class name for a class entry.
    pub fn internal_class_name(&self) -> Option<&str> {
        match self.kind() {
            EntryKind::Class => Some(&self.0[..self.0.len() - CLASS_SUFFIX.len()]),
            _ => None,
        }
    }

    /// Returns the parent directory of this path, if any.
    pub fn parent(&self) -> Option<Self> {
        self.0.rfind('/').map(|idx| Self(self.0[..idx].to_string()))
    }

    /// Returns the file name (last segment) of this path.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Returns the file extension, if any.
    ///
    /// A leading dot does not start an extension (`.gitignore` has none).
    ///
    /// ```
    /// use jarshade::ArchivePath;
    ///
    /// let path = ArchivePath::new("META-INF/LICENSE.txt").unwrap();
    /// assert_eq!(path.extension(), Some("txt"));
    /// ```
    pub fn extension(&self) -> Option<&str> {
        let file_name = self.file_name();
        let dot_pos = file_name.rfind('.')?;
        if dot_pos == 0 {
            None
        } else {
            Some(&file_name[dot_pos + 1..])
        }
    }

    /// Returns an iterator over the path segments.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Returns true if this path starts with the given prefix, component-wise.
    ///
    /// `"META-INF/services/x"` starts with `"META-INF/services"` but not with
    /// `"META-INF/serv"`.
    pub fn starts_with(&self, prefix: &str) -> bool {
        if prefix.is_empty() {
            return true;
        }
        let mut own = self.0.split('/');
        prefix.split('/').all(|p| own.next() == Some(p))
    }

    /// Splits a multi-release prefix (`META-INF/versions/<n>/`) off the path.
    ///
    /// Returns an empty prefix for ordinary entries.
    ///
    /// ```
    /// use jarshade::ArchivePath;
    ///
    /// let path = ArchivePath::new("META-INF/versions/11/com/foo/Bar.class").unwrap();
    /// assert_eq!(path.split_release(), ("META-INF/versions/11/", "com/foo/Bar.class"));
    /// ```
    pub fn split_release(&self) -> (&str, &str) {
        let Some(rest) = self.0.strip_prefix(VERSIONS_PREFIX) else {
            return ("", &self.0);
        };
        match rest.find('/') {
            Some(slash)
                if slash > 0
                    && rest[..slash].bytes().all(|b| b.is_ascii_digit())
                    && slash + 1 < rest.len() =>
            {
                let cut = VERSIONS_PREFIX.len() + slash + 1;
                (&self.0[..cut], &self.0[cut..])
            }
            _ => ("", &self.0),
        }
    }
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for ArchivePath {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ArchivePath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::validate(&s)?;
        Ok(Self(s))
    }
}
