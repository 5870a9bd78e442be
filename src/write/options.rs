//! Write options and results for output archives.

use crate::{Error, Result};

/// Compression applied to output entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Compression {
    /// Entries are stored without compression.
    Stored,
    /// Entries are deflated (requires the `deflate` feature).
    #[cfg(feature = "deflate")]
    Deflated,
}

impl Default for Compression {
    fn default() -> Self {
        #[cfg(feature = "deflate")]
        {
            Compression::Deflated
        }
        #[cfg(not(feature = "deflate"))]
        {
            Compression::Stored
        }
    }
}

/// Options for writing the output archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Compression method for every entry.
    pub compression: Compression,
    /// Compression level (0-9); ignored for [`Compression::Stored`].
    pub level: u32,
    /// Whether to stamp every entry with a fixed timestamp.
    ///
    /// Deterministic output uses 1980-01-01 00:00:00, the earliest time a
    /// ZIP entry can carry, so identical inputs produce identical bytes.
    pub deterministic: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            level: 6,
            deterministic: true,
        }
    }
}

impl WriteOptions {
    /// Creates write options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the compression method.
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Sets the compression level (0-9).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `level` is greater than 9.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jarshade::write::WriteOptions;
    ///
    /// assert!(WriteOptions::new().level(9).is_ok());
    /// assert!(WriteOptions::new().level(10).is_err());
    /// ```
    pub fn level(mut self, level: u32) -> Result<Self> {
        if level > 9 {
            return Err(Error::InvalidConfiguration(format!(
                "compression level must be 0-9, got {}",
                level
            )));
        }
        self.level = level;
        Ok(self)
    }

    /// Sets whether timestamps are fixed for reproducible output.
    pub fn deterministic(mut self, deterministic: bool) -> Self {
        self.deterministic = deterministic;
        self
    }

    pub(crate) fn file_options(&self) -> zip::write::SimpleFileOptions {
        let mut options = zip::write::SimpleFileOptions::default().unix_permissions(0o644);
        options = match self.compression {
            Compression::Stored => options.compression_method(zip::CompressionMethod::Stored),
            #[cfg(feature = "deflate")]
            Compression::Deflated => options
                .compression_method(zip::CompressionMethod::Deflated)
                .compression_level(Some(i64::from(self.level))),
        };
        if self.deterministic {
            options = options.last_modified_time(zip::DateTime::default());
        }
        options
    }
}

/// Result of writing an output archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteResult {
    /// Number of entries written.
    pub entries_written: usize,
    /// Total uncompressed bytes.
    pub total_bytes: u64,
}
