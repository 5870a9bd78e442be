//! Concatenation of one resource across inputs.

use super::ResourceTransformer;
use crate::relocation::Relocators;
use crate::write::OutputSink;
use crate::{ArchivePath, Result};

/// Concatenates every copy of a single resource path.
///
/// Contents are appended in input order; a newline is inserted between
/// contributions that do not already end with one.
#[derive(Debug)]
pub struct AppendingTransformer {
    resource: ArchivePath,
    data: Vec<u8>,
    count: usize,
}

impl AppendingTransformer {
    /// Creates a transformer for `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidArchivePath`] if `resource` is not a
    /// valid archive path.
    pub fn new(resource: &str) -> Result<Self> {
        Ok(Self {
            resource: ArchivePath::new(resource)?,
            data: Vec::new(),
            count: 0,
        })
    }

    /// Returns the path this transformer claims.
    pub fn resource(&self) -> &ArchivePath {
        &self.resource
    }
}

impl ResourceTransformer for AppendingTransformer {
    fn name(&self) -> &str {
        "appending"
    }

    fn can_transform_resource(&self, path: &ArchivePath) -> bool {
        *path == self.resource
    }

    fn process_resource(&mut self, _: &ArchivePath, data: &[u8], _: &Relocators) -> Result<()> {
        if !self.data.is_empty() && !self.data.ends_with(b"\n") {
            self.data.push(b'\n');
        }
        self.data.extend_from_slice(data);
        self.count += 1;
        Ok(())
    }

    fn has_transformed_resource(&self) -> bool {
        self.count > 0
    }

    fn modify_output(&mut self, sink: &mut dyn OutputSink) -> Result<()> {
        sink.put_entry(&self.resource, &self.data)
    }
}
