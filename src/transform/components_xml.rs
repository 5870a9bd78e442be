//! Plexus `components.xml` merging.

use std::collections::HashSet;

use xmltree::{Element, EmitterConfig, XMLNode};

use super::ResourceTransformer;
use crate::relocation::Relocators;
use crate::write::OutputSink;
use crate::{ArchivePath, Error, Result};

/// Path of the component registry inside a jar.
pub const COMPONENTS_XML_PATH: &str = "META-INF/plexus/components.xml";

const NAME: &str = "components-xml";

/// Merges Plexus component registries.
///
/// Every input's `<component>` registrations are collected into a single
/// `<component-set><components>` document. A component is identified by
/// its `role` and `role-hint`; the first registration of an identity wins
/// and later ones are logged and dropped. The `role` and `implementation`
/// class names, and the `role` of each requirement, go through the run's
/// relocators unless disabled with [`relocate_classes`](Self::relocate_classes).
#[derive(Debug)]
pub struct ComponentsXmlResourceTransformer {
    relocate_classes: bool,
    components: Vec<Element>,
    identities: HashSet<(String, String)>,
    processed: usize,
}

impl Default for ComponentsXmlResourceTransformer {
    fn default() -> Self {
        Self {
            relocate_classes: true,
            components: Vec::new(),
            identities: HashSet::new(),
            processed: 0,
        }
    }
}

impl ComponentsXmlResourceTransformer {
    /// Creates a transformer that relocates component class names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether `role` and `implementation` are relocated.
    pub fn relocate_classes(mut self, enabled: bool) -> Self {
        self.relocate_classes = enabled;
        self
    }

    /// Returns the number of distinct components collected so far.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }
}

fn child_text(element: &Element, name: &str) -> String {
    element
        .get_child(name)
        .and_then(|child| child.get_text())
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

fn relocate_child(element: &mut Element, name: &str, relocators: &Relocators) {
    let Some(child) = element.get_mut_child(name) else {
        return;
    };
    let Some(text) = child.get_text().map(|t| t.trim().to_string()) else {
        return;
    };
    if let Some(relocated) = relocators.relocate_class(&text) {
        child.children = vec![XMLNode::Text(relocated)];
    }
}

/// Relocates the `role` of every `<requirements><requirement>` entry.
fn relocate_requirements(component: &mut Element, relocators: &Relocators) {
    let Some(requirements) = component.get_mut_child("requirements") else {
        return;
    };
    for node in requirements.children.iter_mut() {
        if let XMLNode::Element(requirement) = node {
            if requirement.name == "requirement" {
                relocate_child(requirement, "role", relocators);
            }
        }
    }
}

impl ResourceTransformer for ComponentsXmlResourceTransformer {
    fn name(&self) -> &str {
        NAME
    }

    fn can_transform_resource(&self, path: &ArchivePath) -> bool {
        path.as_str() == COMPONENTS_XML_PATH
    }

    fn process_resource(
        &mut self,
        _path: &ArchivePath,
        data: &[u8],
        relocators: &Relocators,
    ) -> Result<()> {
        let root = Element::parse(data).map_err(|e| Error::transformer(NAME, e.to_string()))?;
        if root.name != "component-set" {
            return Err(Error::transformer(
                NAME,
                format!("expected <component-set> root, found <{}>", root.name),
            ));
        }

        let Some(components) = root.get_child("components") else {
            self.processed += 1;
            return Ok(());
        };

        for node in &components.children {
            let XMLNode::Element(component) = node else {
                continue;
            };
            if component.name != "component" {
                continue;
            }

            let mut component = component.clone();
            if self.relocate_classes {
                relocate_child(&mut component, "role", relocators);
                relocate_child(&mut component, "implementation", relocators);
                relocate_requirements(&mut component, relocators);
            }

            let identity = (
                child_text(&component, "role"),
                child_text(&component, "role-hint"),
            );
            if identity.0.is_empty() {
                return Err(Error::transformer(NAME, "component without a <role>"));
            }
            if self.identities.insert(identity.clone()) {
                self.components.push(component);
            } else {
                log::debug!(
                    "{}: keeping first registration of role '{}' hint '{}'",
                    NAME,
                    identity.0,
                    identity.1
                );
            }
        }
        self.processed += 1;
        Ok(())
    }

    fn has_transformed_resource(&self) -> bool {
        self.processed > 0
    }

    fn modify_output(&mut self, sink: &mut dyn OutputSink) -> Result<()> {
        let mut components = Element::new("components");
        components.children = self
            .components
            .iter()
            .cloned()
            .map(XMLNode::Element)
            .collect();
        let mut root = Element::new("component-set");
        root.children.push(XMLNode::Element(components));

        let mut out = Vec::new();
        let config = EmitterConfig::new()
            .perform_indent(true)
            .indent_string("  ");
        root.write_with_config(&mut out, config)
            .map_err(|e| Error::transformer(NAME, e.to_string()))?;
        out.push(b'\n');

        sink.put_entry(&ArchivePath::new(COMPONENTS_XML_PATH)?, &out)
    }
}
