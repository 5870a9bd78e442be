//! `META-INF/services` provider-configuration merging.

use std::collections::{HashMap, HashSet};

use super::{ResourceTransformer, decode_text};
use crate::relocation::Relocators;
use crate::write::OutputSink;
use crate::{ArchivePath, Result};

const SERVICES_DIR: &str = "META-INF/services";

#[derive(Debug, Default)]
struct ServiceFile {
    providers: Vec<String>,
    seen: HashSet<String>,
}

/// Merges `ServiceLoader` provider files from every input.
///
/// Each file under `META-INF/services/` becomes the ordered union of the
/// provider lines of all inputs: first occurrence order, duplicates
/// removed, comments and blank lines dropped.
///
/// Provider names are kept as written unless
/// [`relocate_entries`](Self::relocate_entries) is enabled, in which case
/// both the service file name and the provider class names go through the
/// run's relocators.
#[derive(Debug, Default)]
pub struct ServicesResourceTransformer {
    relocate_entries: bool,
    order: Vec<String>,
    files: HashMap<String, ServiceFile>,
}

impl ServicesResourceTransformer {
    /// Creates a transformer that keeps provider names as written.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether service names and provider classes are relocated.
    pub fn relocate_entries(mut self, enabled: bool) -> Self {
        self.relocate_entries = enabled;
        self
    }
}

impl ResourceTransformer for ServicesResourceTransformer {
    fn name(&self) -> &str {
        "services"
    }

    fn can_transform_resource(&self, path: &ArchivePath) -> bool {
        path.starts_with(SERVICES_DIR) && path.components().count() == 3
    }

    fn process_resource(
        &mut self,
        path: &ArchivePath,
        data: &[u8],
        relocators: &Relocators,
    ) -> Result<()> {
        let text = decode_text(self.name(), data)?;
        let relocate = |name: &str| {
            if self.relocate_entries {
                relocators
                    .relocate_class(name)
                    .unwrap_or_else(|| name.to_string())
            } else {
                name.to_string()
            }
        };

        let service = relocate(path.file_name());
        let providers: Vec<String> = text
            .lines()
            .map(|line| line.split('#').next().unwrap_or("").trim())
            .filter(|line| !line.is_empty())
            .map(relocate)
            .collect();

        if !self.files.contains_key(&service) {
            self.order.push(service.clone());
        }
        let file = self.files.entry(service).or_default();
        for provider in providers {
            if file.seen.insert(provider.clone()) {
                file.providers.push(provider);
            }
        }
        Ok(())
    }

    fn has_transformed_resource(&self) -> bool {
        !self.order.is_empty()
    }

    fn modify_output(&mut self, sink: &mut dyn OutputSink) -> Result<()> {
        for service in &self.order {
            let Some(file) = self.files.get(service) else {
                continue;
            };
            let path = ArchivePath::new(&format!("{}/{}", SERVICES_DIR, service))?;
            let mut content = String::new();
            for provider in &file.providers {
                content.push_str(provider);
                content.push('\n');
            }
            sink.put_entry(&path, content.as_bytes())?;
        }
        Ok(())
    }
}
