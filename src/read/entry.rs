//! Entries read from a source archive.

use crate::{ArchivePath, EntryKind};

/// One entry of a source archive with its uncompressed content.
///
/// Entries are immutable once read; the shader only ever borrows them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    path: ArchivePath,
    data: Vec<u8>,
    kind: EntryKind,
}

impl ArchiveEntry {
    /// Creates a file entry; the kind follows from the path.
    pub fn new(path: ArchivePath, data: Vec<u8>) -> Self {
        let kind = path.kind();
        Self { path, data, kind }
    }

    /// Creates a directory entry (stored without its trailing slash).
    pub fn directory(path: ArchivePath) -> Self {
        Self {
            path,
            data: Vec::new(),
            kind: EntryKind::Directory,
        }
    }

    /// Returns the archive-relative path.
    pub fn path(&self) -> &ArchivePath {
        &self.path
    }

    /// Returns the uncompressed content.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the entry kind.
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Returns the uncompressed size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Consumes the entry, returning its content.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// A fully read input archive.
#[derive(Debug, Clone)]
pub struct SourceArchive {
    /// Position of the archive in the input list.
    pub index: usize,
    /// Human-readable label, usually the file path.
    pub label: String,
    /// Entries in archive (central directory) order.
    pub entries: Vec<ArchiveEntry>,
}

impl SourceArchive {
    /// Creates a source archive from already-read entries.
    pub fn new(index: usize, label: impl Into<String>, entries: Vec<ArchiveEntry>) -> Self {
        Self {
            index,
            label: label.into(),
            entries,
        }
    }

    /// Returns the total uncompressed size of all entries.
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(ArchiveEntry::size).sum()
    }
}
