//! Options and request types for a shading run.

use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::read::ReadLimits;
use crate::relocation::{Relocator, Relocators};
use crate::transform::ResourceTransformer;
use crate::write::WriteOptions;
use crate::{Error, Result};

/// Options controlling how a run treats its inputs and output.
///
/// # Example
///
/// ```rust
/// use jarshade::shade::ShadeOptions;
/// use jarshade::write::WriteOptions;
///
/// let options = ShadeOptions::new()
///     .write(WriteOptions::new().level(9)?)
///     .relocate_resource_paths(true)
///     .exclude_input("*-sources.jar");
/// # Ok::<(), jarshade::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ShadeOptions {
    /// Output archive settings.
    pub write: WriteOptions,
    /// Per-input read limits.
    pub limits: ReadLimits,
    /// Whether string constants naming relocated classes are rewritten.
    pub relocate_string_literals: bool,
    /// Whether plain resource paths are relocated like class paths.
    pub relocate_resource_paths: bool,
    /// Glob patterns on input file names; matching inputs are skipped.
    pub exclude_inputs: Vec<String>,
}

impl Default for ShadeOptions {
    fn default() -> Self {
        Self {
            write: WriteOptions::default(),
            limits: ReadLimits::default(),
            relocate_string_literals: true,
            relocate_resource_paths: false,
            exclude_inputs: Vec::new(),
        }
    }
}

impl ShadeOptions {
    /// Creates options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the output archive settings.
    pub fn write(mut self, write: WriteOptions) -> Self {
        self.write = write;
        self
    }

    /// Sets the per-input read limits.
    pub fn limits(mut self, limits: ReadLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets whether string constants are relocated.
    pub fn relocate_string_literals(mut self, enabled: bool) -> Self {
        self.relocate_string_literals = enabled;
        self
    }

    /// Sets whether resource paths are relocated.
    pub fn relocate_resource_paths(mut self, enabled: bool) -> Self {
        self.relocate_resource_paths = enabled;
        self
    }

    /// Adds a glob pattern excluding inputs by file name.
    pub fn exclude_input(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_inputs.push(pattern.into());
        self
    }

    /// Checks that every exclusion pattern compiles.
    pub fn validate(&self) -> Result<()> {
        self.input_filter().map(|_| ())
    }

    /// Compiles the input exclusion patterns.
    pub(crate) fn input_filter(&self) -> Result<InputFilter> {
        let patterns = self
            .exclude_inputs
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| {
                    Error::InvalidConfiguration(format!("invalid input exclusion '{}': {}", p, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(InputFilter { patterns })
    }
}

/// Compiled input exclusions.
#[derive(Debug)]
pub(crate) struct InputFilter {
    patterns: Vec<Pattern>,
}

impl InputFilter {
    /// Returns `true` if the input's file name matches an exclusion.
    pub(crate) fn excludes(&self, input: &Path) -> bool {
        let Some(name) = input.file_name() else {
            return false;
        };
        let name = name.to_string_lossy();
        self.patterns.iter().any(|p| p.matches(&name))
    }
}

/// Everything one shading run consumes.
///
/// The request owns its relocators and transformers for the duration of
/// the run; inputs are only read.
#[derive(Debug, Default)]
pub struct ShadeRequest {
    /// Input archives, in priority order.
    pub inputs: Vec<PathBuf>,
    /// Path of the merged archive.
    pub destination: PathBuf,
    /// Ordered relocation rules.
    pub relocators: Relocators,
    /// Ordered resource transformers.
    pub transformers: Vec<Box<dyn ResourceTransformer>>,
}

impl ShadeRequest {
    /// Creates a request writing to `destination`.
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            ..Self::default()
        }
    }

    /// Appends an input archive.
    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(path.into());
        self
    }

    /// Appends several input archives.
    pub fn inputs<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.inputs.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Appends a relocation rule after the existing ones.
    pub fn relocator(mut self, relocator: impl Relocator + 'static) -> Self {
        self.relocators.push(Box::new(relocator));
        self
    }

    /// Appends a resource transformer after the existing ones.
    pub fn transformer(mut self, transformer: impl ResourceTransformer + 'static) -> Self {
        self.transformers.push(Box::new(transformer));
        self
    }
}
