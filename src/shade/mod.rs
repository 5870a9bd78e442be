//! The shading engine.
//!
//! A [`Shader`] merges an ordered list of input archives into one output
//! archive. Every entry goes through exactly one of three terminal paths:
//!
//! - **class**: relocated and rewritten with the run's relocators, or copied
//!   byte-identical when nothing refers to a relocated name;
//! - **transformer claim**: the first transformer whose
//!   [`can_transform_resource`](crate::transform::ResourceTransformer::can_transform_resource)
//!   accepts the path accumulates it (or suppresses it);
//! - **plain copy**: written once, the first archive in input order wins.
//!
//! Directory entries are dropped. After the last archive, every transformer
//! that saw input flushes its merged entry, in configured order.
//!
//! # Example
//!
//! ```rust,no_run
//! use jarshade::relocation::SimpleRelocator;
//! use jarshade::shade::{ShadeRequest, Shader};
//! use jarshade::transform::ServicesResourceTransformer;
//!
//! let request = ShadeRequest::new("target/app-shaded.jar")
//!     .inputs(["target/app.jar", "lib/commons.jar"])
//!     .relocator(SimpleRelocator::new("org.apache.commons")?.shaded_pattern("app.shaded.commons")?)
//!     .transformer(ServicesResourceTransformer::new());
//!
//! let result = Shader::default().shade(request)?;
//! println!(
//!     "{} entries, {} classes relocated, {} duplicates skipped",
//!     result.entries_written,
//!     result.classes_relocated,
//!     result.duplicates.len()
//! );
//! # Ok::<(), jarshade::Error>(())
//! ```

mod listener;
mod options;
mod result;

pub use listener::{NoListener, ShadeListener};
pub use options::{ShadeOptions, ShadeRequest};
pub use result::{DuplicateEntry, EntryAction, ShadeResult};

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::classfile::ClassRemapper;
use crate::read::{ArchiveEntry, SourceArchive, read_source};
use crate::relocation::Relocators;
use crate::transform::{Disposition, ResourceTransformer};
use crate::write::{JarWriter, OutputSink};
use crate::{ArchivePath, EntryKind, Error, Result};

/// Merges input archives into one, relocating classes and merging resources.
pub struct Shader {
    options: ShadeOptions,
    listener: Box<dyn ShadeListener>,
}

impl Default for Shader {
    fn default() -> Self {
        Self::new(ShadeOptions::default())
    }
}

impl fmt::Debug for Shader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shader")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Shader {
    /// Creates a shader with the given options.
    pub fn new(options: ShadeOptions) -> Self {
        Self {
            options,
            listener: Box::new(NoListener),
        }
    }

    /// Sets the listener notified while shading.
    pub fn listener(mut self, listener: impl ShadeListener + 'static) -> Self {
        self.listener = Box::new(listener);
        self
    }

    /// Returns the options.
    pub fn options(&self) -> &ShadeOptions {
        &self.options
    }

    /// Runs a complete shading job.
    ///
    /// Configuration is validated before any archive is opened. The output
    /// is staged next to the destination and only replaces it once every
    /// input was processed and every transformer flushed; on failure the
    /// destination is left untouched.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfiguration`] for an empty input list or a bad
    ///   exclusion pattern.
    /// - [`Error::ArchiveUnreadable`] if an input cannot be read.
    /// - [`Error::Entry`] or [`Error::Transformer`] naming the archive and
    ///   entry for per-entry failures.
    /// - [`Error::DestinationUnwritable`] if the output cannot be written.
    pub fn shade(&mut self, request: ShadeRequest) -> Result<ShadeResult> {
        let ShadeRequest {
            inputs,
            destination,
            relocators,
            mut transformers,
        } = request;

        if inputs.is_empty() {
            return Err(Error::InvalidConfiguration("no input archives".into()));
        }
        let filter = self.options.input_filter()?;
        let (inputs, excluded): (Vec<PathBuf>, Vec<PathBuf>) =
            inputs.into_iter().partition(|p| !filter.excludes(p));
        for path in &excluded {
            log::info!("excluding input {}", path.display());
        }
        if inputs.is_empty() {
            log::warn!("every input archive is excluded; the output will be empty");
        }

        let mut writer = JarWriter::create_path(&destination, self.options.write.clone())?;
        let limits = self.options.limits;

        #[cfg(feature = "parallel")]
        let mut result = {
            use rayon::prelude::*;

            let sources: Vec<Result<SourceArchive>> = inputs
                .par_iter()
                .enumerate()
                .map(|(index, path)| read_source(path, index, limits))
                .collect();
            self.run(sources.into_iter(), &mut writer, &relocators, &mut transformers)?
        };
        #[cfg(not(feature = "parallel"))]
        let mut result = {
            let sources = inputs
                .iter()
                .enumerate()
                .map(|(index, path)| read_source(path, index, limits));
            self.run(sources, &mut writer, &relocators, &mut transformers)?
        };

        let written = writer.commit()?;
        result.entries_written = written.entries_written;
        result.total_bytes = written.total_bytes;
        result.excluded_inputs = excluded;

        log::info!(
            "shaded {} archive(s) into {}: {} entries, {} classes relocated, {} duplicates skipped",
            result.archives,
            destination.display(),
            result.entries_written,
            result.classes_relocated,
            result.duplicates.len()
        );
        Ok(result)
    }

    /// Shades already-read archives into any sink.
    ///
    /// This is the core of [`shade`](Self::shade) without file handling:
    /// sources are processed in iteration order and transformers are
    /// flushed into `sink` at the end.
    pub fn shade_sources<I>(
        &mut self,
        sources: I,
        sink: &mut dyn OutputSink,
        relocators: &Relocators,
        transformers: &mut [Box<dyn ResourceTransformer>],
    ) -> Result<ShadeResult>
    where
        I: IntoIterator<Item = SourceArchive>,
    {
        self.run(sources.into_iter().map(Ok), sink, relocators, transformers)
    }

    fn run<I>(
        &mut self,
        sources: I,
        sink: &mut dyn OutputSink,
        relocators: &Relocators,
        transformers: &mut [Box<dyn ResourceTransformer>],
    ) -> Result<ShadeResult>
    where
        I: Iterator<Item = Result<SourceArchive>>,
    {
        let mut sink = CountingSink::new(sink);
        let mut run = Run {
            options: &self.options,
            remapper: ClassRemapper::new(relocators)
                .relocate_string_literals(self.options.relocate_string_literals),
            relocators,
            transformers,
            listener: self.listener.as_mut(),
            labels: Vec::new(),
            written: HashMap::new(),
            result: ShadeResult::default(),
        };

        for source in sources {
            run.archive(source?, &mut sink)?;
        }
        run.flush(&mut sink)?;

        let mut result = run.result;
        result.entries_written = sink.entries;
        result.total_bytes = sink.bytes;
        Ok(result)
    }
}

/// Where an output path came from.
#[derive(Debug, Clone, Copy)]
struct Origin {
    archive: usize,
    crc: u32,
    len: usize,
}

/// State of one run.
struct Run<'a> {
    options: &'a ShadeOptions,
    remapper: ClassRemapper<'a>,
    relocators: &'a Relocators,
    transformers: &'a mut [Box<dyn ResourceTransformer>],
    listener: &'a mut dyn ShadeListener,
    labels: Vec<String>,
    written: HashMap<ArchivePath, Origin>,
    result: ShadeResult,
}

impl Run<'_> {
    fn archive(&mut self, source: SourceArchive, sink: &mut CountingSink<'_>) -> Result<()> {
        let SourceArchive { label, entries, .. } = source;
        let archive = self.labels.len();
        log::debug!("processing {} ({} entries)", label, entries.len());
        self.listener
            .on_archive_start(archive, &label, entries.len());

        for entry in &entries {
            let (path, action) = self
                .entry(archive, &label, entry, sink)
                .map_err(|e| e.in_entry(&label, entry.path().as_str()))?;
            self.result.record(action);
            self.listener.on_entry(&path, action);
        }

        self.labels.push(label);
        self.result.archives += 1;
        Ok(())
    }

    fn entry(
        &mut self,
        archive: usize,
        label: &str,
        entry: &ArchiveEntry,
        sink: &mut CountingSink<'_>,
    ) -> Result<(ArchivePath, EntryAction)> {
        match entry.kind() {
            EntryKind::Directory => Ok((entry.path().clone(), EntryAction::DirectorySkipped)),
            EntryKind::Class => self.class(archive, label, entry, sink),
            EntryKind::Resource => self.resource(archive, label, entry, sink),
        }
    }

    fn class(
        &mut self,
        archive: usize,
        label: &str,
        entry: &ArchiveEntry,
        sink: &mut CountingSink<'_>,
    ) -> Result<(ArchivePath, EntryAction)> {
        let remapped = self.remapper.remap_bytes(entry.data())?;
        let path = self.relocated_class_path(entry.path())?;

        let action = if remapped.is_changed() || path != *entry.path() {
            EntryAction::ClassRewrite
        } else {
            EntryAction::ClassCopy
        };
        if !remapped.relocations.is_empty() {
            log::debug!(
                "{}: {} name(s) rewritten",
                entry.path(),
                remapped.relocations.len()
            );
        }

        if !self.put_once(archive, label, &path, &remapped.bytes, sink)? {
            return Ok((path, EntryAction::DuplicateSkipped));
        }
        self.result.relocations += remapped.relocations.len();
        Ok((path, action))
    }

    /// Output path of a class entry, keeping any multi-release prefix.
    fn relocated_class_path(&self, path: &ArchivePath) -> Result<ArchivePath> {
        let (release, rest) = path.split_release();
        let Some(internal) = rest.strip_suffix(crate::archive_path::CLASS_SUFFIX) else {
            return Ok(path.clone());
        };
        match self.relocators.relocate_class(&internal.replace('/', ".")) {
            Some(relocated) => ArchivePath::new(&format!(
                "{}{}{}",
                release,
                relocated.replace('.', "/"),
                crate::archive_path::CLASS_SUFFIX
            )),
            None => Ok(path.clone()),
        }
    }

    fn resource(
        &mut self,
        archive: usize,
        label: &str,
        entry: &ArchiveEntry,
        sink: &mut CountingSink<'_>,
    ) -> Result<(ArchivePath, EntryAction)> {
        let path = entry.path();
        if let Some(transformer) = self
            .transformers
            .iter_mut()
            .find(|t| t.can_transform_resource(path))
        {
            transformer.process_resource(path, entry.data(), self.relocators)?;
            let action = match transformer.disposition() {
                Disposition::Merge => EntryAction::TransformClaim,
                Disposition::Suppress => EntryAction::Suppressed,
            };
            log::debug!("{}: {} by {}", path, action.label(), transformer.name());
            return Ok((path.clone(), action));
        }

        let output = self.relocated_resource_path(path)?;
        if !self.put_once(archive, label, &output, entry.data(), sink)? {
            return Ok((output, EntryAction::DuplicateSkipped));
        }
        Ok((output, EntryAction::PlainCopy))
    }

    fn relocated_resource_path(&self, path: &ArchivePath) -> Result<ArchivePath> {
        if !self.options.relocate_resource_paths {
            return Ok(path.clone());
        }
        let (release, rest) = path.split_release();
        match self.relocators.relocate_path(rest) {
            Some(relocated) => ArchivePath::new(&format!("{}{}", release, relocated)),
            None => Ok(path.clone()),
        }
    }

    /// Writes `data` unless `path` was already written; first writer wins.
    ///
    /// Returns `false` when the entry was skipped as a duplicate.
    fn put_once(
        &mut self,
        archive: usize,
        label: &str,
        path: &ArchivePath,
        data: &[u8],
        sink: &mut CountingSink<'_>,
    ) -> Result<bool> {
        let crc = crc32fast::hash(data);
        if let Some(first) = self.written.get(path) {
            let identical = first.crc == crc && first.len == data.len();
            let first_archive = self
                .labels
                .get(first.archive)
                .map(String::as_str)
                .unwrap_or(label);
            if identical {
                log::debug!("skipping identical duplicate {} from {}", path, label);
            } else {
                let message = format!(
                    "{} from {} differs from the copy kept from {}",
                    path, label, first_archive
                );
                log::warn!("{}", message);
                self.listener.on_warning(&message);
            }
            self.result.duplicates.push(DuplicateEntry {
                path: path.to_string(),
                first_archive: first_archive.to_string(),
                archive: label.to_string(),
                identical,
            });
            return Ok(false);
        }

        sink.put_entry(path, data)?;
        self.written.insert(
            path.clone(),
            Origin {
                archive,
                crc,
                len: data.len(),
            },
        );
        Ok(true)
    }

    fn flush(&mut self, sink: &mut CountingSink<'_>) -> Result<()> {
        for transformer in self.transformers.iter_mut() {
            if !transformer.has_transformed_resource() {
                continue;
            }
            transformer.modify_output(sink).map_err(|e| match e {
                e @ Error::Transformer { .. } => e,
                other => Error::transformer(transformer.name(), other.to_string()),
            })?;
            log::debug!("flushed transformer {}", transformer.name());
            self.result
                .transformers_flushed
                .push(transformer.name().to_string());
        }
        Ok(())
    }
}

/// Sink adapter counting what reaches the output.
struct CountingSink<'s> {
    inner: &'s mut dyn OutputSink,
    entries: usize,
    bytes: u64,
}

impl<'s> CountingSink<'s> {
    fn new(inner: &'s mut dyn OutputSink) -> Self {
        Self {
            inner,
            entries: 0,
            bytes: 0,
        }
    }
}

impl OutputSink for CountingSink<'_> {
    fn put_entry(&mut self, path: &ArchivePath, data: &[u8]) -> Result<()> {
        self.inner.put_entry(path, data)?;
        self.entries += 1;
        self.bytes += data.len() as u64;
        Ok(())
    }

    fn contains(&self, path: &ArchivePath) -> bool {
        self.inner.contains(path)
    }
}
