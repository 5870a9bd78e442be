//! Declarative JSON worklists.
//!
//! A worklist names the inputs, the output, relocation rules and resource
//! transformers of one run. [`ShadeConfig::into_request`] validates every
//! pattern before any archive is opened.
//!
//! ```json
//! {
//!   "inputs": ["target/app.jar", "lib/commons-io.jar"],
//!   "output": "target/app-shaded.jar",
//!   "relocations": [
//!     { "pattern": "org.apache.commons", "shaded-pattern": "app.shaded.commons",
//!       "excludes": ["org.apache.commons.logging.*"] }
//!   ],
//!   "transformers": [
//!     { "type": "services" },
//!     { "type": "manifest", "main-class": "com.example.Main" },
//!     { "type": "dont-include", "patterns": ["META-INF/*.SF"] }
//!   ],
//!   "options": { "compression": "stored", "exclude-inputs": ["*-sources.jar"] }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::relocation::SimpleRelocator;
use crate::shade::{ShadeOptions, ShadeRequest};
use crate::transform::{
    ApacheLicenseResourceTransformer, ApacheNoticeResourceTransformer, AppendingTransformer,
    ComponentsXmlResourceTransformer, DontIncludeResourceTransformer, ManifestResourceTransformer,
    ResourceTransformer, ServicesResourceTransformer,
};
use crate::write::{Compression, WriteOptions};
use crate::{Error, Result};

/// A complete shading worklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ShadeConfig {
    /// Input archives in priority order.
    pub inputs: Vec<PathBuf>,
    /// Destination archive.
    pub output: PathBuf,
    /// Relocation rules in configured order.
    #[serde(default)]
    pub relocations: Vec<RelocationConfig>,
    /// Resource transformers in configured order.
    #[serde(default)]
    pub transformers: Vec<TransformerConfig>,
    /// Run options.
    #[serde(default)]
    pub options: OptionsConfig,
}

/// One relocation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct RelocationConfig {
    /// Dotted package prefix to relocate.
    pub pattern: String,
    /// Replacement prefix; defaults to `hidden.` + pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shaded_pattern: Option<String>,
    /// Class names or globs left in place.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<String>,
}

/// A transformer selection, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "kebab-case",
    deny_unknown_fields
)]
#[non_exhaustive]
pub enum TransformerConfig {
    /// `META-INF/services` merging.
    Services {
        /// Relocate service file names and provider entries.
        #[serde(default)]
        relocate_entries: bool,
    },
    /// Plexus `components.xml` merging.
    ComponentsXml {
        /// Relocate `role` and `implementation` class names.
        #[serde(default = "default_true")]
        relocate_classes: bool,
    },
    /// License file suppression.
    ApacheLicense,
    /// `NOTICE` merging.
    ApacheNotice {
        /// Text written before the merged notices.
        #[serde(default)]
        preamble: Option<String>,
    },
    /// Concatenation of one resource.
    Appending {
        /// The resource path.
        resource: String,
    },
    /// Manifest selection and amendment.
    Manifest {
        /// `Main-Class` override.
        #[serde(default)]
        main_class: Option<String>,
        /// Extra main-section attributes.
        #[serde(default)]
        attributes: BTreeMap<String, String>,
    },
    /// Glob-based resource suppression.
    DontInclude {
        /// Paths to drop.
        patterns: Vec<String>,
    },
}

fn default_true() -> bool {
    true
}

/// Output compression in a worklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompressionConfig {
    /// No compression.
    Stored,
    /// Deflate.
    Deflated,
}

/// Run options in a worklist; unset fields keep library defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct OptionsConfig {
    /// Output compression.
    #[serde(default)]
    pub compression: Option<CompressionConfig>,
    /// Compression level, 0-9.
    #[serde(default)]
    pub level: Option<u32>,
    /// Fixed entry timestamps.
    #[serde(default)]
    pub deterministic: Option<bool>,
    /// Rewrite string constants naming relocated classes.
    #[serde(default)]
    pub relocate_string_literals: Option<bool>,
    /// Relocate plain resource paths.
    #[serde(default)]
    pub relocate_resource_paths: Option<bool>,
    /// Input file-name globs to skip.
    #[serde(default)]
    pub exclude_inputs: Vec<String>,
}

impl ShadeConfig {
    /// Parses a worklist from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a worklist file.
    ///
    /// Relative input and output paths are resolved against the file's
    /// directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_json(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Serializes the worklist as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Joins relative paths onto `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for input in &mut self.inputs {
            if input.is_relative() {
                *input = base.join(&*input);
            }
        }
        if self.output.is_relative() {
            self.output = base.join(&self.output);
        }
    }

    /// Validates the worklist and builds the request and options of a run.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty input list, an invalid
    /// relocation or exclusion pattern, an invalid transformer setting or
    /// an out-of-range compression level.
    pub fn into_request(self) -> Result<(ShadeRequest, ShadeOptions)> {
        if self.inputs.is_empty() {
            return Err(Error::InvalidConfiguration("no input archives".into()));
        }

        let options = self.options.into_options()?;
        options.validate()?;

        let mut request = ShadeRequest::new(self.output).inputs(self.inputs);
        for relocation in self.relocations {
            request.relocators.push(Box::new(relocation.build()?));
        }
        for transformer in self.transformers {
            request.transformers.push(transformer.build()?);
        }
        Ok((request, options))
    }
}

impl RelocationConfig {
    /// Builds the relocator.
    pub fn build(&self) -> Result<SimpleRelocator> {
        let mut relocator = SimpleRelocator::new(&self.pattern)?;
        if let Some(shaded) = &self.shaded_pattern {
            relocator = relocator.shaded_pattern(shaded)?;
        }
        relocator.excludes(&self.excludes)
    }
}

impl TransformerConfig {
    /// Builds the transformer.
    pub fn build(&self) -> Result<Box<dyn ResourceTransformer>> {
        Ok(match self {
            TransformerConfig::Services { relocate_entries } => Box::new(
                ServicesResourceTransformer::new().relocate_entries(*relocate_entries),
            ),
            TransformerConfig::ComponentsXml { relocate_classes } => Box::new(
                ComponentsXmlResourceTransformer::new().relocate_classes(*relocate_classes),
            ),
            TransformerConfig::ApacheLicense => Box::new(ApacheLicenseResourceTransformer::new()),
            TransformerConfig::ApacheNotice { preamble } => {
                let mut t = ApacheNoticeResourceTransformer::new();
                if let Some(preamble) = preamble {
                    t = t.preamble(preamble.clone());
                }
                Box::new(t)
            }
            TransformerConfig::Appending { resource } => {
                Box::new(AppendingTransformer::new(resource).map_err(|e| {
                    Error::InvalidConfiguration(format!("appending transformer: {}", e))
                })?)
            }
            TransformerConfig::Manifest {
                main_class,
                attributes,
            } => {
                let mut t = ManifestResourceTransformer::new();
                if let Some(main_class) = main_class {
                    t = t.main_class(main_class.clone());
                }
                for (name, value) in attributes {
                    t = t.attribute(name.clone(), value.clone());
                }
                Box::new(t)
            }
            TransformerConfig::DontInclude { patterns } => {
                Box::new(DontIncludeResourceTransformer::new(patterns)?)
            }
        })
    }
}

impl OptionsConfig {
    fn into_options(self) -> Result<ShadeOptions> {
        let mut write = WriteOptions::new();
        match self.compression {
            Some(CompressionConfig::Stored) => write = write.compression(Compression::Stored),
            #[cfg(feature = "deflate")]
            Some(CompressionConfig::Deflated) => write = write.compression(Compression::Deflated),
            #[cfg(not(feature = "deflate"))]
            Some(CompressionConfig::Deflated) => {
                return Err(Error::InvalidConfiguration(
                    "deflate compression requires the `deflate` feature".into(),
                ));
            }
            None => {}
        }
        if let Some(level) = self.level {
            write = write.level(level)?;
        }
        if let Some(deterministic) = self.deterministic {
            write = write.deterministic(deterministic);
        }

        let mut options = ShadeOptions::new().write(write);
        if let Some(enabled) = self.relocate_string_literals {
            options = options.relocate_string_literals(enabled);
        }
        if let Some(enabled) = self.relocate_resource_paths {
            options = options.relocate_resource_paths(enabled);
        }
        options.exclude_inputs = self.exclude_inputs;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKLIST: &str = r#"{
        "inputs": ["a.jar", "/abs/b.jar"],
        "output": "out/shaded.jar",
        "relocations": [
            { "pattern": "com.foo", "shaded-pattern": "shaded.com.foo", "excludes": ["com.foo.Keep"] },
            { "pattern": "org.bar" }
        ],
        "transformers": [
            { "type": "services", "relocate-entries": true },
            { "type": "components-xml" },
            { "type": "apache-license" },
            { "type": "apache-notice", "preamble": "My App" },
            { "type": "appending", "resource": "META-INF/spring.handlers" },
            { "type": "manifest", "main-class": "com.foo.Main", "attributes": { "X-Built-By": "ci" } },
            { "type": "dont-include", "patterns": ["META-INF/*.SF"] }
        ],
        "options": { "compression": "stored", "level": 0, "exclude-inputs": ["*-sources.jar"] }
    }"#;

    #[test]
    fn test_parse_full_worklist() {
        let config = ShadeConfig::from_json(WORKLIST).unwrap();
        assert_eq!(config.inputs.len(), 2);
        assert_eq!(config.relocations[1].shaded_pattern, None);
        assert_eq!(
            config.transformers[1],
            TransformerConfig::ComponentsXml {
                relocate_classes: true
            }
        );
        assert_eq!(config.options.compression, Some(CompressionConfig::Stored));

        let (request, options) = config.into_request().unwrap();
        assert_eq!(request.relocators.len(), 2);
        assert_eq!(
            request.relocators.relocate_class("com.foo.Bar").as_deref(),
            Some("shaded.com.foo.Bar")
        );
        assert_eq!(request.relocators.relocate_class("com.foo.Keep"), None);
        assert_eq!(
            request.relocators.relocate_class("org.bar.X").as_deref(),
            Some("hidden.org.bar.X")
        );
        let names: Vec<_> = request.transformers.iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec![
                "services",
                "components-xml",
                "apache-license",
                "apache-notice",
                "appending",
                "manifest",
                "dont-include"
            ]
        );
        assert_eq!(options.write.compression, Compression::Stored);
        assert_eq!(options.exclude_inputs, vec!["*-sources.jar"]);
    }

    #[test]
    fn test_resolve_paths() {
        let mut config = ShadeConfig::from_json(WORKLIST).unwrap();
        config.resolve_paths(Path::new("/work"));
        assert_eq!(config.inputs[0], PathBuf::from("/work/a.jar"));
        assert_eq!(config.inputs[1], PathBuf::from("/abs/b.jar"));
        assert_eq!(config.output, PathBuf::from("/work/out/shaded.jar"));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = ShadeConfig::from_json(WORKLIST).unwrap();
        let again = ShadeConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(config, again);
    }

    #[test]
    fn test_rejects_unknown_fields_and_types() {
        let err = ShadeConfig::from_json(r#"{"inputs": [], "output": "o.jar", "extra": 1}"#)
            .unwrap_err();
        assert!(err.is_configuration_error());

        let err = ShadeConfig::from_json(
            r#"{"inputs": ["a.jar"], "output": "o.jar", "transformers": [{"type": "zip-bomb"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validation_fails_fast() {
        let empty = ShadeConfig::from_json(r#"{"inputs": [], "output": "o.jar"}"#).unwrap();
        assert!(empty.into_request().unwrap_err().is_configuration_error());

        let bad_level = ShadeConfig::from_json(
            r#"{"inputs": ["a.jar"], "output": "o.jar", "options": {"level": 12}}"#,
        )
        .unwrap();
        assert!(bad_level.into_request().unwrap_err().is_configuration_error());

        let bad_pattern = ShadeConfig::from_json(
            r#"{"inputs": ["a.jar"], "output": "o.jar", "transformers": [{"type": "dont-include", "patterns": ["[x"]}]}"#,
        )
        .unwrap();
        assert!(bad_pattern.into_request().unwrap_err().is_configuration_error());

        let bad_exclusion = ShadeConfig::from_json(
            r#"{"inputs": ["a.jar"], "output": "o.jar", "options": {"exclude-inputs": ["["]}}"#,
        )
        .unwrap();
        assert!(bad_exclusion.into_request().unwrap_err().is_configuration_error());
    }
}
