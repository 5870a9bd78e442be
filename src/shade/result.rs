//! Outcome of a shading run.

use std::path::PathBuf;

/// What the shader did with one input entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum EntryAction {
    /// A class was renamed or had references rewritten.
    ClassRewrite,
    /// A class was copied byte-identical.
    ClassCopy,
    /// A resource was claimed by a merging transformer.
    TransformClaim,
    /// A resource was claimed by a suppressing transformer.
    Suppressed,
    /// A resource was copied as is.
    PlainCopy,
    /// An entry was dropped because an earlier archive already wrote its path.
    DuplicateSkipped,
    /// A directory entry was dropped.
    DirectorySkipped,
}

impl EntryAction {
    /// Returns a short label for display.
    pub fn label(self) -> &'static str {
        match self {
            EntryAction::ClassRewrite => "relocated",
            EntryAction::ClassCopy => "class",
            EntryAction::TransformClaim => "merged",
            EntryAction::Suppressed => "suppressed",
            EntryAction::PlainCopy => "copied",
            EntryAction::DuplicateSkipped => "duplicate",
            EntryAction::DirectorySkipped => "directory",
        }
    }
}

/// A plain entry shadowed by an earlier archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateEntry {
    /// Output path of the entry.
    pub path: String,
    /// Archive whose copy was kept.
    pub first_archive: String,
    /// Archive whose copy was dropped.
    pub archive: String,
    /// Whether both copies have the same content.
    pub identical: bool,
}

/// Statistics of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShadeResult {
    /// Number of input archives processed.
    pub archives: usize,
    /// Inputs skipped by an exclusion pattern.
    pub excluded_inputs: Vec<PathBuf>,
    /// Classes renamed or rewritten.
    pub classes_relocated: usize,
    /// Classes copied unchanged.
    pub classes_copied: usize,
    /// Resources copied unchanged.
    pub resources_copied: usize,
    /// Resources handed to merging transformers.
    pub resources_transformed: usize,
    /// Resources dropped by suppressing transformers.
    pub resources_suppressed: usize,
    /// Directory entries dropped.
    pub directories_skipped: usize,
    /// Distinct name rewrites applied across all classes.
    pub relocations: usize,
    /// Entries dropped because their path was already written.
    pub duplicates: Vec<DuplicateEntry>,
    /// Names of transformers that wrote merged output, in flush order.
    pub transformers_flushed: Vec<String>,
    /// Entries written to the output.
    pub entries_written: usize,
    /// Uncompressed bytes written to the output.
    pub total_bytes: u64,
}

impl ShadeResult {
    /// Returns `true` if any shadowed entry had different content.
    pub fn has_conflicts(&self) -> bool {
        self.duplicates.iter().any(|d| !d.identical)
    }

    pub(crate) fn record(&mut self, action: EntryAction) {
        match action {
            EntryAction::ClassRewrite => self.classes_relocated += 1,
            EntryAction::ClassCopy => self.classes_copied += 1,
            EntryAction::TransformClaim => self.resources_transformed += 1,
            EntryAction::Suppressed => self.resources_suppressed += 1,
            EntryAction::PlainCopy => self.resources_copied += 1,
            EntryAction::DirectorySkipped => self.directories_skipped += 1,
            EntryAction::DuplicateSkipped => {}
        }
    }
}
