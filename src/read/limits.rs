//! Resource limits applied while reading source archives.

use crate::{Error, Result};

/// Bounds on what a single source archive may expand to.
///
/// Guards against decompression bombs: entry sizes are checked against the
/// declared size before reading and again against the bytes actually
/// produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadLimits {
    /// Maximum number of entries in one archive.
    pub max_entries: usize,
    /// Maximum uncompressed size of a single entry.
    pub max_entry_size: u64,
    /// Maximum uncompressed size of all entries of one archive.
    pub max_total_size: u64,
}

impl Default for ReadLimits {
    /// Creates limits with the following default values:
    ///
    /// | Limit | Default Value |
    /// |-------|---------------|
    /// | `max_entries` | 1,000,000 |
    /// | `max_entry_size` | 1 GiB |
    /// | `max_total_size` | 16 GiB |
    fn default() -> Self {
        Self {
            max_entries: 1_000_000,
            max_entry_size: 1 << 30,
            max_total_size: 16 << 30,
        }
    }
}

impl ReadLimits {
    /// Creates limits with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates limits with no restrictions.
    pub fn unlimited() -> Self {
        Self {
            max_entries: usize::MAX,
            max_entry_size: u64::MAX,
            max_total_size: u64::MAX,
        }
    }

    /// Sets the maximum number of entries.
    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Sets the maximum size of a single entry.
    pub fn max_entry_size(mut self, max: u64) -> Self {
        self.max_entry_size = max;
        self
    }

    /// Sets the maximum total size of one archive.
    pub fn max_total_size(mut self, max: u64) -> Self {
        self.max_total_size = max;
        self
    }

    pub(crate) fn check_entries(&self, archive: &str, count: usize) -> Result<()> {
        if count > self.max_entries {
            return Err(Error::ResourceLimitExceeded(format!(
                "{} has {} entries, limit is {}",
                archive, count, self.max_entries
            )));
        }
        Ok(())
    }

    pub(crate) fn check_entry_size(&self, archive: &str, entry: &str, size: u64) -> Result<()> {
        if size > self.max_entry_size {
            return Err(Error::ResourceLimitExceeded(format!(
                "entry '{}' in {} is {} bytes, limit is {}",
                entry, archive, size, self.max_entry_size
            )));
        }
        Ok(())
    }

    pub(crate) fn check_total_size(&self, archive: &str, total: u64) -> Result<()> {
        if total > self.max_total_size {
            return Err(Error::ResourceLimitExceeded(format!(
                "{} expands to more than {} bytes",
                archive, self.max_total_size
            )));
        }
        Ok(())
    }
}
