//! Reading of source archives.
//!
//! [`JarReader`] opens a ZIP-compatible container and reads every entry into
//! memory in central-directory order, enforcing [`ReadLimits`]. Any failure to
//! open or decompress the container is reported as
//! [`Error::ArchiveUnreadable`] naming the archive.
//!
//! # Example
//!
//! ```rust,no_run
//! use jarshade::read::JarReader;
//!
//! let mut reader = JarReader::open_path("lib/commons.jar")?;
//! for entry in reader.entries()? {
//!     println!("{} {} ({} bytes)", entry.kind(), entry.path(), entry.size());
//! }
//! # Ok::<(), jarshade::Error>(())
//! ```

mod entry;
mod limits;

pub use entry::{ArchiveEntry, SourceArchive};
pub use limits::ReadLimits;

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use zip::ZipArchive;

use crate::{ArchivePath, EntryKind, Error, Result};

fn unreadable(archive: &str, source: Error) -> Error {
    Error::ArchiveUnreadable {
        archive: archive.to_string(),
        source: Box::new(source),
    }
}

/// A reader over one source archive.
pub struct JarReader<R> {
    archive: ZipArchive<R>,
    label: String,
    limits: ReadLimits,
}

impl<R: Read + Seek> std::fmt::Debug for JarReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JarReader")
            .field("label", &self.label)
            .field("entries", &self.archive.len())
            .field("limits", &self.limits)
            .finish()
    }
}

impl<R: Read + Seek> JarReader<R> {
    /// Opens an archive from any seekable reader.
    ///
    /// `label` names the archive in errors and logs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArchiveUnreadable`] if the central directory cannot
    /// be read.
    pub fn open(reader: R, label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        let archive = ZipArchive::new(reader).map_err(|e| unreadable(&label, e.into()))?;
        Ok(Self {
            archive,
            label,
            limits: ReadLimits::default(),
        })
    }

    /// Replaces the default resource limits.
    pub fn with_limits(mut self, limits: ReadLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns the archive label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the number of entries, directories included.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    /// Returns `true` if the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Reads every entry in archive order.
    ///
    /// Directory entries are returned with [`EntryKind::Directory`]; the
    /// shader decides what to do with them. A file entry whose name is not a
    /// valid [`ArchivePath`] fails with [`Error::Entry`].
    pub fn entries(&mut self) -> Result<Vec<ArchiveEntry>> {
        let count = self.archive.len();
        self.limits.check_entries(&self.label, count)?;

        let mut entries = Vec::with_capacity(count);
        let mut total: u64 = 0;

        for index in 0..count {
            let mut file = self
                .archive
                .by_index(index)
                .map_err(|e| unreadable(&self.label, e.into()))?;
            let raw_name = file.name().to_string();

            if EntryKind::classify(&raw_name) == EntryKind::Directory {
                match ArchivePath::new(raw_name.trim_end_matches('/')) {
                    Ok(path) => entries.push(ArchiveEntry::directory(path)),
                    Err(_) => log::debug!("{}: ignoring directory '{}'", self.label, raw_name),
                }
                continue;
            }

            let path = ArchivePath::new(&raw_name).map_err(|e| Error::Entry {
                archive: self.label.clone(),
                entry: raw_name.clone(),
                source: Box::new(e),
            })?;

            self.limits
                .check_entry_size(&self.label, &raw_name, file.size())?;

            let capacity = file.size().min(1 << 20) as usize;
            let mut data = Vec::with_capacity(capacity);
            file.by_ref()
                .take(self.limits.max_entry_size.saturating_add(1))
                .read_to_end(&mut data)
                .map_err(|e| unreadable(&self.label, e.into()))?;
            self.limits
                .check_entry_size(&self.label, &raw_name, data.len() as u64)?;

            total = total.saturating_add(data.len() as u64);
            self.limits.check_total_size(&self.label, total)?;

            entries.push(ArchiveEntry::new(path, data));
        }

        log::debug!(
            "{}: read {} entries ({} bytes)",
            self.label,
            entries.len(),
            total
        );
        Ok(entries)
    }

    /// Reads every entry and packages them as the `index`-th input.
    pub fn into_source(mut self, index: usize) -> Result<SourceArchive> {
        let entries = self.entries()?;
        Ok(SourceArchive::new(index, self.label, entries))
    }
}

impl JarReader<BufReader<File>> {
    /// Opens an archive file.
    ///
    /// The path (as displayed) becomes the archive label.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let label = path.display().to_string();
        let file = File::open(path).map_err(|e| unreadable(&label, Error::Io(e)))?;
        Self::open(BufReader::new(file), label)
    }
}

/// Reads the archive at `path` as the `index`-th input.
pub fn read_source(path: &Path, index: usize, limits: ReadLimits) -> Result<SourceArchive> {
    JarReader::open_path(path)?
        .with_limits(limits)
        .into_source(index)
}
