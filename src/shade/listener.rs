//! Observation hooks for a shading run.

use super::EntryAction;
use crate::ArchivePath;

/// Receives events while archives are shaded.
///
/// Every method has an empty default, so implementors only override what
/// they need.
pub trait ShadeListener: Send {
    /// Called before the entries of an input archive are processed.
    fn on_archive_start(&mut self, index: usize, label: &str, entries: usize) {
        let _ = (index, label, entries);
    }

    /// Called after each entry with the action taken and its output path.
    fn on_entry(&mut self, path: &ArchivePath, action: EntryAction) {
        let _ = (path, action);
    }

    /// Called for non-fatal conditions such as conflicting duplicates.
    fn on_warning(&mut self, message: &str) {
        let _ = message;
    }
}

/// A listener that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoListener;

impl ShadeListener for NoListener {}
