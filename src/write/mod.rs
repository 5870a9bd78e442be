//! Writing of the output archive.
//!
//! The output is a write-once sequential container: every archive-relative
//! path may be written at most once and directory entries are never written,
//! the directory structure being implied by entry paths.
//!
//! # Example
//!
//! ```rust,no_run
//! use jarshade::ArchivePath;
//! use jarshade::write::{JarWriter, OutputSink, WriteOptions};
//!
//! let mut writer = JarWriter::create_path("out/app.jar", WriteOptions::default())?;
//! writer.put_entry(&ArchivePath::new("META-INF/NOTICE")?, b"notice")?;
//!
//! // Nothing appears at the destination until commit.
//! let result = writer.commit()?;
//! println!("Wrote {} entries", result.entries_written);
//! # Ok::<(), jarshade::Error>(())
//! ```

mod options;
mod staged;

pub use options::{Compression, WriteOptions, WriteResult};
pub use staged::StagedFile;

use std::collections::HashSet;
use std::io::{Seek, Write};
use std::path::Path;

use zip::ZipWriter;

use crate::{ArchivePath, Error, Result};

/// Destination capability for merged output.
///
/// Handed to resource transformers when they flush their merged state.
pub trait OutputSink {
    /// Writes one file entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateEntry`] if the path was already written.
    fn put_entry(&mut self, path: &ArchivePath, data: &[u8]) -> Result<()>;

    /// Returns `true` if an entry was already written at `path`.
    fn contains(&self, path: &ArchivePath) -> bool;
}

/// Sequential writer for the output archive.
pub struct JarWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    file_options: zip::write::SimpleFileOptions,
    written: HashSet<ArchivePath>,
    result: WriteResult,
}

impl<W: Write + Seek> JarWriter<W> {
    /// Creates a writer over any seekable sink.
    pub fn new(inner: W, options: WriteOptions) -> Self {
        Self {
            zip: ZipWriter::new(inner),
            file_options: options.file_options(),
            written: HashSet::new(),
            result: WriteResult::default(),
        }
    }

    /// Returns the number of entries written so far.
    pub fn len(&self) -> usize {
        self.result.entries_written
    }

    /// Returns `true` if nothing was written yet.
    pub fn is_empty(&self) -> bool {
        self.result.entries_written == 0
    }

    /// Writes the central directory and returns the inner sink.
    pub fn finish(self) -> Result<(W, WriteResult)> {
        let inner = self.zip.finish()?;
        Ok((inner, self.result))
    }
}

impl<W: Write + Seek> OutputSink for JarWriter<W> {
    fn put_entry(&mut self, path: &ArchivePath, data: &[u8]) -> Result<()> {
        if !self.written.insert(path.clone()) {
            return Err(Error::DuplicateEntry {
                path: path.as_str().to_string(),
            });
        }
        self.zip.start_file(path.as_str(), self.file_options)?;
        self.zip.write_all(data)?;
        self.result.entries_written += 1;
        self.result.total_bytes += data.len() as u64;
        Ok(())
    }

    fn contains(&self, path: &ArchivePath) -> bool {
        self.written.contains(path)
    }
}

impl JarWriter<StagedFile> {
    /// Creates a writer for a destination file.
    ///
    /// Entries go to a sibling temporary file; [`commit`](Self::commit)
    /// moves it into place. If the writer is dropped without committing,
    /// the temporary file is removed and the destination is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DestinationUnwritable`] if the temporary file cannot
    /// be created.
    pub fn create_path(destination: impl AsRef<Path>, options: WriteOptions) -> Result<Self> {
        let staged = StagedFile::create(destination.as_ref())?;
        Ok(Self::new(staged, options))
    }

    /// Finishes the archive and atomically replaces the destination.
    pub fn commit(self) -> Result<WriteResult> {
        let (staged, result) = self.finish()?;
        staged.commit()?;
        Ok(result)
    }
}

/// In-memory output, mostly useful for tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    entries: Vec<(ArchivePath, Vec<u8>)>,
    index: HashSet<ArchivePath>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the written entries in write order.
    pub fn entries(&self) -> &[(ArchivePath, Vec<u8>)] {
        &self.entries
    }

    /// Returns the content written at `path`.
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(p, _)| p.as_str() == path)
            .map(|(_, data)| data.as_slice())
    }

    /// Returns the written paths in write order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(p, _)| p.as_str())
    }

    /// Consumes the sink, returning its entries.
    pub fn into_entries(self) -> Vec<(ArchivePath, Vec<u8>)> {
        self.entries
    }
}

impl OutputSink for MemorySink {
    fn put_entry(&mut self, path: &ArchivePath, data: &[u8]) -> Result<()> {
        if !self.index.insert(path.clone()) {
            return Err(Error::DuplicateEntry {
                path: path.as_str().to_string(),
            });
        }
        self.entries.push((path.clone(), data.to_vec()));
        Ok(())
    }

    fn contains(&self, path: &ArchivePath) -> bool {
        self.index.contains(path)
    }
}
