//! Merging of Apache `NOTICE` files.

use std::collections::HashSet;

use super::{ResourceTransformer, decode_text, matches_any_ignore_case};
use crate::relocation::Relocators;
use crate::write::OutputSink;
use crate::{ArchivePath, Result};

const NOTICE_PATHS: &[&str] = &["META-INF/NOTICE", "META-INF/NOTICE.txt"];

/// Path of the merged notice.
pub const NOTICE_OUTPUT_PATH: &str = "META-INF/NOTICE";

/// Aggregates every input's `NOTICE` into one `META-INF/NOTICE`.
///
/// Notices are normalized to `\n` line endings and trimmed; identical
/// notices are kept once, in input order, separated by a blank line. An
/// optional preamble is written first.
#[derive(Debug, Default)]
pub struct ApacheNoticeResourceTransformer {
    preamble: Option<String>,
    notices: Vec<String>,
    seen: HashSet<String>,
    contributions: usize,
}

impl ApacheNoticeResourceTransformer {
    /// Creates the transformer without a preamble.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets text written before the collected notices.
    pub fn preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = Some(preamble.into());
        self
    }

    /// Returns how many notice files were processed, duplicates included.
    pub fn contributions(&self) -> usize {
        self.contributions
    }
}

impl ResourceTransformer for ApacheNoticeResourceTransformer {
    fn name(&self) -> &str {
        "apache-notice"
    }

    fn can_transform_resource(&self, path: &ArchivePath) -> bool {
        matches_any_ignore_case(path, NOTICE_PATHS)
    }

    fn process_resource(&mut self, _: &ArchivePath, data: &[u8], _: &Relocators) -> Result<()> {
        let text = decode_text(self.name(), data)?;
        let notice = text
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();

        self.contributions += 1;
        if !notice.is_empty() && self.seen.insert(notice.clone()) {
            self.notices.push(notice);
        }
        Ok(())
    }

    fn has_transformed_resource(&self) -> bool {
        self.contributions > 0
    }

    fn modify_output(&mut self, sink: &mut dyn OutputSink) -> Result<()> {
        let mut sections: Vec<&str> = Vec::with_capacity(self.notices.len() + 1);
        if let Some(preamble) = &self.preamble {
            sections.push(preamble.trim());
        }
        sections.extend(self.notices.iter().map(String::as_str));

        let mut content = sections.join("\n\n");
        content.push('\n');
        sink.put_entry(&ArchivePath::new(NOTICE_OUTPUT_PATH)?, content.as_bytes())
    }
}
