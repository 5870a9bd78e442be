//! Prefix-based package relocation.

use glob::{MatchOptions, Pattern};

use super::Relocator;
use crate::{Error, Result};

/// Root prepended to the pattern when no shaded pattern is configured.
pub const DEFAULT_SHADED_ROOT: &str = "hidden";

/// An excluded class name, either literal or a glob over dotted names.
#[derive(Debug, Clone)]
enum Exclusion {
    Literal(String),
    Glob(Pattern),
}

impl Exclusion {
    fn parse(name: &str) -> Result<Self> {
        let name = normalize(name, "exclusion")?;
        if name.contains(['*', '?', '[']) {
            let pattern = Pattern::new(&name).map_err(|e| {
                Error::InvalidConfiguration(format!("invalid exclusion '{}': {}", name, e))
            })?;
            Ok(Exclusion::Glob(pattern))
        } else {
            Ok(Exclusion::Literal(name))
        }
    }

    fn matches(&self, class_name: &str) -> bool {
        match self {
            Exclusion::Literal(name) => name == class_name,
            Exclusion::Glob(pattern) => pattern.matches_with(
                class_name,
                MatchOptions {
                    case_sensitive: true,
                    require_literal_separator: false,
                    require_literal_leading_dot: false,
                },
            ),
        }
    }
}

/// Validates a package or class name and converts it to dotted form.
///
/// Both `com.foo` and `com/foo` are accepted.
fn normalize(raw: &str, what: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidConfiguration(format!("empty {}", what)));
    }
    if let Some(bad) = trimmed
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, ';' | '<' | '>' | '\\'))
    {
        return Err(Error::InvalidConfiguration(format!(
            "{} '{}' contains invalid character {:?}",
            what, trimmed, bad
        )));
    }
    let dotted = trimmed.replace('/', ".");
    if dotted.starts_with('.') || dotted.contains("..") {
        return Err(Error::InvalidConfiguration(format!(
            "{} '{}' has an empty package segment",
            what, trimmed
        )));
    }
    Ok(dotted)
}

/// Relocates every class whose name starts with a package prefix.
///
/// The match is a raw prefix test on the name, and the relocated name
/// replaces that prefix with the shaded pattern. Without an explicit shaded
/// pattern, names move under `hidden.`:
///
/// ```
/// use jarshade::relocation::{Relocator, SimpleRelocator};
///
/// let relocator = SimpleRelocator::new("org.codehaus.plexus")?;
/// assert!(relocator.can_relocate_class("org.codehaus.plexus.util.IOUtil"));
/// assert_eq!(
///     relocator.relocate_class("org.codehaus.plexus.util.IOUtil"),
///     "hidden.org.codehaus.plexus.util.IOUtil"
/// );
/// # Ok::<(), jarshade::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct SimpleRelocator {
    pattern: String,
    path_pattern: String,
    shaded_pattern: String,
    shaded_path_pattern: String,
    excludes: Vec<Exclusion>,
}

impl SimpleRelocator {
    /// Creates a relocator for a package prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for an empty or malformed prefix.
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = normalize(pattern, "relocation pattern")?;
        let shaded_pattern = format!("{}.{}", DEFAULT_SHADED_ROOT, pattern);
        Ok(Self {
            path_pattern: pattern.replace('.', "/"),
            shaded_path_pattern: shaded_pattern.replace('.', "/"),
            pattern,
            shaded_pattern,
            excludes: Vec::new(),
        })
    }

    /// Sets the prefix that replaces the matched pattern.
    pub fn shaded_pattern(mut self, shaded: &str) -> Result<Self> {
        let shaded = normalize(shaded, "shaded pattern")?;
        self.shaded_path_pattern = shaded.replace('.', "/");
        self.shaded_pattern = shaded;
        Ok(self)
    }

    /// Excludes a class from relocation.
    ///
    /// Accepts a literal dotted class name or a glob such as
    /// `com.foo.internal.*`.
    pub fn exclude(mut self, name: &str) -> Result<Self> {
        self.excludes.push(Exclusion::parse(name)?);
        Ok(self)
    }

    /// Excludes several classes from relocation.
    pub fn excludes<I, S>(self, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .try_fold(self, |relocator, name| relocator.exclude(name.as_ref()))
    }

    /// Returns the dotted source prefix.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the dotted replacement prefix.
    pub fn shaded(&self) -> &str {
        &self.shaded_pattern
    }

    fn is_excluded(&self, class_name: &str) -> bool {
        self.excludes.iter().any(|e| e.matches(class_name))
    }
}

impl Relocator for SimpleRelocator {
    fn can_relocate_class(&self, class_name: &str) -> bool {
        class_name.starts_with(&self.pattern) && !self.is_excluded(class_name)
    }

    fn relocate_class(&self, class_name: &str) -> String {
        format!(
            "{}{}",
            self.shaded_pattern,
            &class_name[self.pattern.len()..]
        )
    }

    fn can_relocate_path(&self, path: &str) -> bool {
        path.starts_with(&self.path_pattern) && !self.is_excluded(&path.replace('/', "."))
    }

    fn relocate_path(&self, path: &str) -> String {
        format!(
            "{}{}",
            self.shaded_path_pattern,
            &path[self.path_pattern.len()..]
        )
    }
}
