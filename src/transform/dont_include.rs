//! Suppression of resources by glob pattern.

use glob::Pattern;

use super::{Disposition, ResourceTransformer};
use crate::relocation::Relocators;
use crate::write::OutputSink;
use crate::{ArchivePath, Error, Result};

/// Drops every resource whose path matches one of the configured globs.
///
/// ```
/// use jarshade::ArchivePath;
/// use jarshade::transform::{DontIncludeResourceTransformer, ResourceTransformer};
///
/// let t = DontIncludeResourceTransformer::new(["META-INF/*.SF", "META-INF/*.RSA"])?;
/// assert!(t.can_transform_resource(&ArchivePath::new("META-INF/SIGNER.SF")?));
/// assert!(!t.can_transform_resource(&ArchivePath::new("META-INF/MANIFEST.MF")?));
/// # Ok::<(), jarshade::Error>(())
/// ```
#[derive(Debug)]
pub struct DontIncludeResourceTransformer {
    patterns: Vec<Pattern>,
    suppressed: usize,
}

impl DontIncludeResourceTransformer {
    /// Creates a transformer from glob patterns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for an empty list or an
    /// invalid pattern.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Pattern::new(p).map_err(|e| {
                    Error::InvalidConfiguration(format!("invalid resource pattern '{}': {}", p, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if patterns.is_empty() {
            return Err(Error::InvalidConfiguration(
                "dont-include transformer needs at least one pattern".into(),
            ));
        }
        Ok(Self {
            patterns,
            suppressed: 0,
        })
    }

    /// Returns how many entries were dropped.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }
}

impl ResourceTransformer for DontIncludeResourceTransformer {
    fn name(&self) -> &str {
        "dont-include"
    }

    fn can_transform_resource(&self, path: &ArchivePath) -> bool {
        self.patterns.iter().any(|p| p.matches(path.as_str()))
    }

    fn process_resource(&mut self, path: &ArchivePath, _: &[u8], _: &Relocators) -> Result<()> {
        log::debug!("dropping {}", path);
        self.suppressed += 1;
        Ok(())
    }

    fn has_transformed_resource(&self) -> bool {
        self.suppressed > 0
    }

    fn modify_output(&mut self, _sink: &mut dyn OutputSink) -> Result<()> {
        Ok(())
    }

    fn disposition(&self) -> Disposition {
        Disposition::Suppress
    }
}
