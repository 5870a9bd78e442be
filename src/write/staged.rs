//! Temporary-file staging for atomic destination replacement.

use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{Error, Result};

/// Distinguishes staged files created by the same process.
static NEXT_STAGE: AtomicU64 = AtomicU64::new(0);

/// A sibling temporary file that replaces its destination on commit.
///
/// Dropping a `StagedFile` without committing removes the temporary file.
#[derive(Debug)]
pub struct StagedFile {
    file: Option<BufWriter<File>>,
    temp_path: PathBuf,
    destination: PathBuf,
}

impl StagedFile {
    pub(crate) fn create(destination: &Path) -> Result<Self> {
        let file_name = destination
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| Error::DestinationUnwritable {
                path: destination.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "destination has no file name"),
            })?;
        let stage = NEXT_STAGE.fetch_add(1, Ordering::Relaxed);
        let temp_path = destination.with_file_name(format!(
            ".{}.{}.{}.tmp",
            file_name,
            std::process::id(),
            stage
        ));

        let file = File::create_new(&temp_path).map_err(|source| Error::DestinationUnwritable {
            path: destination.to_path_buf(),
            source,
        })?;

        Ok(Self {
            file: Some(BufWriter::new(file)),
            temp_path,
            destination: destination.to_path_buf(),
        })
    }

    /// Returns the final destination path.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    fn writer(&mut self) -> io::Result<&mut BufWriter<File>> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("staged file already closed"))
    }

    pub(crate) fn commit(mut self) -> Result<()> {
        let unwritable = |source| Error::DestinationUnwritable {
            path: self.destination.clone(),
            source,
        };

        let file = self.file.take().ok_or_else(|| {
            unwritable(io::Error::other("staged file already closed"))
        })?;
        let file = file.into_inner().map_err(|e| unwritable(e.into_error()))?;
        file.sync_all().map_err(unwritable)?;
        drop(file);

        fs::rename(&self.temp_path, &self.destination).map_err(unwritable)?;
        log::debug!("committed {}", self.destination.display());
        // Prevent Drop from deleting the committed file.
        self.temp_path = PathBuf::new();
        Ok(())
    }
}

impl Write for StagedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer()?.flush()
    }
}

impl Seek for StagedFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.writer()?.seek(pos)
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        drop(self.file.take());
        if !self.temp_path.as_os_str().is_empty() {
            if let Err(e) = fs::remove_file(&self.temp_path) {
                log::warn!(
                    "failed to remove temporary file {}: {}",
                    self.temp_path.display(),
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_files(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "tmp"))
            .collect()
    }

    #[test]
    fn test_concurrent_stages_use_distinct_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("out.jar");

        let mut first = StagedFile::create(&destination).unwrap();
        let mut second = StagedFile::create(&destination).unwrap();
        assert_ne!(first.temp_path, second.temp_path);
        assert_eq!(temp_files(dir.path()).len(), 2);

        first.write_all(b"first").unwrap();
        second.write_all(b"second").unwrap();
        first.commit().unwrap();
        assert_eq!(fs::read(&destination).unwrap(), b"first");
        second.commit().unwrap();
        assert_eq!(fs::read(&destination).unwrap(), b"second");
        assert!(temp_files(dir.path()).is_empty());
    }

    #[test]
    fn test_drop_removes_only_own_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("out.jar");

        let mut kept = StagedFile::create(&destination).unwrap();
        let abandoned = StagedFile::create(&destination).unwrap();
        drop(abandoned);
        assert_eq!(temp_files(dir.path()), vec![kept.temp_path.clone()]);

        kept.write_all(b"data").unwrap();
        kept.commit().unwrap();
        assert_eq!(fs::read(&destination).unwrap(), b"data");
        assert!(temp_files(dir.path()).is_empty());
    }

    #[test]
    fn test_missing_file_name_is_unwritable() {
        let err = StagedFile::create(Path::new("/")).unwrap_err();
        assert!(matches!(err, Error::DestinationUnwritable { .. }));
    }
}
