//! Output formatting for CLI operations.

use jarshade::{ArchiveEntry, EntryKind, ShadeResult};
use serde_json::json;

/// Trait for output formatting
pub trait OutputFormatter {
    /// Formats a list of entries
    fn format_list(&self, entries: &[ArchiveEntry]) -> String;

    /// Formats the outcome of a shading run
    fn format_shade_result(&self, result: &ShadeResult) -> String;
}

/// Human-readable output formatter
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format_list(&self, entries: &[ArchiveEntry]) -> String {
        let mut output = String::new();

        output.push_str(&format!("{:>12} {:>9} {}\n", "Size", "Kind", "Name"));
        output.push_str(&"-".repeat(70));
        output.push('\n');

        let mut total_size: u64 = 0;
        let mut class_count = 0;
        let mut resource_count = 0;
        let mut dir_count = 0;

        for entry in entries {
            let size_str = match entry.kind() {
                EntryKind::Directory => {
                    dir_count += 1;
                    String::new()
                }
                EntryKind::Class => {
                    class_count += 1;
                    humanize_bytes(entry.size())
                }
                EntryKind::Resource => {
                    resource_count += 1;
                    humanize_bytes(entry.size())
                }
            };
            total_size += entry.size();

            let name = match entry.path().class_name() {
                Some(class) => format!("{} ({})", entry.path(), class),
                None => entry.path().to_string(),
            };
            output.push_str(&format!("{:>12} {:>9} {}\n", size_str, entry.kind(), name));
        }

        output.push_str(&"-".repeat(70));
        output.push('\n');
        output.push_str(&format!(
            "{} classes, {} resources, {} directories, {} total\n",
            class_count,
            resource_count,
            dir_count,
            humanize_bytes(total_size)
        ));

        output
    }

    fn format_shade_result(&self, result: &ShadeResult) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "Shaded {} archives: {} entries ({})\n",
            result.archives,
            result.entries_written,
            humanize_bytes(result.total_bytes)
        ));
        output.push_str(&format!(
            "  Classes:     {} relocated, {} copied\n",
            result.classes_relocated, result.classes_copied
        ));
        output.push_str(&format!(
            "  Resources:   {} copied, {} merged, {} suppressed\n",
            result.resources_copied, result.resources_transformed, result.resources_suppressed
        ));
        if !result.transformers_flushed.is_empty() {
            output.push_str(&format!(
                "  Merged by:   {}\n",
                result.transformers_flushed.join(", ")
            ));
        }
        for input in &result.excluded_inputs {
            output.push_str(&format!("  Excluded:    {}\n", input.display()));
        }

        if !result.duplicates.is_empty() {
            output.push_str(&format!("\nSkipped {} duplicates:\n", result.duplicates.len()));
            for duplicate in &result.duplicates {
                output.push_str(&format!(
                    "  {} from {} (kept {}{})\n",
                    duplicate.path,
                    duplicate.archive,
                    duplicate.first_archive,
                    if duplicate.identical { ", identical" } else { "" }
                ));
            }
        }

        output
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_list(&self, entries: &[ArchiveEntry]) -> String {
        let items: Vec<_> = entries
            .iter()
            .map(|e| {
                json!({
                    "path": e.path().as_str(),
                    "kind": e.kind().label(),
                    "size": e.size(),
                    "class_name": e.path().class_name(),
                })
            })
            .collect();

        serde_json::to_string_pretty(&items).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_shade_result(&self, result: &ShadeResult) -> String {
        let obj = json!({
            "archives": result.archives,
            "entries_written": result.entries_written,
            "total_bytes": result.total_bytes,
            "classes_relocated": result.classes_relocated,
            "classes_copied": result.classes_copied,
            "relocations": result.relocations,
            "resources_copied": result.resources_copied,
            "resources_transformed": result.resources_transformed,
            "resources_suppressed": result.resources_suppressed,
            "directories_skipped": result.directories_skipped,
            "transformers_flushed": result.transformers_flushed,
            "excluded_inputs": result.excluded_inputs.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
            "duplicates": result.duplicates.iter().map(|d| json!({
                "path": d.path,
                "first_archive": d.first_archive,
                "archive": d.archive,
                "identical": d.identical,
            })).collect::<Vec<_>>(),
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Creates the appropriate formatter based on output format
pub fn create_formatter(format: super::OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        super::OutputFormat::Human => Box::new(HumanFormatter),
        super::OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Converts bytes to a human-readable string
pub fn humanize_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
