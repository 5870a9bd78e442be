//! Resource transformers.
//!
//! A [`ResourceTransformer`] claims resource entries by path, accumulates
//! their content across every input archive and writes its merged result
//! once at the end of the run. Claimed entries never reach the plain-copy
//! step.
//!
//! Each transformer declares what happens to the entries it claims through
//! [`ResourceTransformer::disposition`]: they are either merged into output
//! written at flush time, or suppressed entirely.
//!
//! | Transformer | Claims | Disposition |
//! |-------------|--------|-------------|
//! | [`ServicesResourceTransformer`] | `META-INF/services/*` | merge |
//! | [`ComponentsXmlResourceTransformer`] | `META-INF/plexus/components.xml` | merge |
//! | [`ApacheLicenseResourceTransformer`] | `META-INF/LICENSE[.txt]` | suppress |
//! | [`ApacheNoticeResourceTransformer`] | `META-INF/NOTICE[.txt]` | merge |
//! | [`AppendingTransformer`] | one configured path | merge |
//! | [`ManifestResourceTransformer`] | `META-INF/MANIFEST.MF` | merge |
//! | [`DontIncludeResourceTransformer`] | configured globs | suppress |

mod apache_license;
mod apache_notice;
mod appending;
mod components_xml;
mod dont_include;
mod manifest;
mod services;

pub use apache_license::ApacheLicenseResourceTransformer;
pub use apache_notice::ApacheNoticeResourceTransformer;
pub use appending::AppendingTransformer;
pub use components_xml::ComponentsXmlResourceTransformer;
pub use dont_include::DontIncludeResourceTransformer;
pub use manifest::ManifestResourceTransformer;
pub use services::ServicesResourceTransformer;

use std::fmt;

use crate::relocation::Relocators;
use crate::write::OutputSink;
use crate::{ArchivePath, Result};

/// What happens to entries a transformer claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Claimed content is merged and written at flush time.
    Merge,
    /// Claimed content is dropped from the output.
    Suppress,
}

/// A stateful accumulator for one kind of resource.
///
/// The shader calls [`can_transform_resource`](Self::can_transform_resource)
/// on each resource entry, passes every claimed entry to
/// [`process_resource`](Self::process_resource) in input order and, after
/// the last archive, calls [`modify_output`](Self::modify_output) exactly once
/// if [`has_transformed_resource`](Self::has_transformed_resource) is true.
pub trait ResourceTransformer: fmt::Debug + Send {
    /// Identity used in logs and errors.
    fn name(&self) -> &str;

    /// Returns `true` if this transformer claims the entry at `path`.
    fn can_transform_resource(&self, path: &ArchivePath) -> bool;

    /// Accumulates one claimed entry.
    ///
    /// Called once per input archive containing a matching entry. The
    /// relocators are the run's relocators, for transformers that rewrite
    /// class names found in resources.
    fn process_resource(
        &mut self,
        path: &ArchivePath,
        data: &[u8],
        relocators: &Relocators,
    ) -> Result<()>;

    /// Returns `true` once any entry was processed.
    fn has_transformed_resource(&self) -> bool;

    /// Writes the merged result.
    fn modify_output(&mut self, sink: &mut dyn OutputSink) -> Result<()>;

    /// Returns what happens to claimed entries.
    fn disposition(&self) -> Disposition {
        Disposition::Merge
    }
}

/// Matches `path` against `names` ignoring ASCII case.
pub(crate) fn matches_any_ignore_case(path: &ArchivePath, names: &[&str]) -> bool {
    names.iter().any(|name| path.as_str().eq_ignore_ascii_case(name))
}

/// Decodes resource text, failing with a transformer error on invalid UTF-8.
///
/// A leading byte-order mark is dropped.
pub(crate) fn decode_text<'a>(transformer: &str, data: &'a [u8]) -> Result<&'a str> {
    let text = std::str::from_utf8(data)
        .map_err(|e| crate::Error::transformer(transformer, format!("invalid UTF-8: {}", e)))?;
    Ok(text.strip_prefix('\u{FEFF}').unwrap_or(text))
}
