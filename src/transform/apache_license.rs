//! Suppression of bundled Apache license files.

use super::{Disposition, ResourceTransformer, matches_any_ignore_case};
use crate::relocation::Relocators;
use crate::write::OutputSink;
use crate::{ArchivePath, Result};

const LICENSE_PATHS: &[&str] = &["META-INF/LICENSE", "META-INF/LICENSE.txt"];

/// Drops `META-INF/LICENSE` and `META-INF/LICENSE.txt` from every input.
///
/// Names are matched ignoring case. Nothing is written at flush time; the
/// number of suppressed files is available from
/// [`suppressed`](Self::suppressed).
#[derive(Debug, Default)]
pub struct ApacheLicenseResourceTransformer {
    suppressed: usize,
}

impl ApacheLicenseResourceTransformer {
    /// Creates the transformer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many license files were dropped.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }
}

impl ResourceTransformer for ApacheLicenseResourceTransformer {
    fn name(&self) -> &str {
        "apache-license"
    }

    fn can_transform_resource(&self, path: &ArchivePath) -> bool {
        matches_any_ignore_case(path, LICENSE_PATHS)
    }

    fn process_resource(&mut self, _: &ArchivePath, _: &[u8], _: &Relocators) -> Result<()> {
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
