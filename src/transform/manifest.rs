//! `META-INF/MANIFEST.MF` handling.

use super::{ResourceTransformer, decode_text};
use crate::relocation::Relocators;
use crate::write::OutputSink;
use crate::{ArchivePath, Error, Result};

/// Path of the jar manifest.
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

const NAME: &str = "manifest";
const MAX_LINE_BYTES: usize = 72;
const MANIFEST_VERSION: &str = "Manifest-Version";
const MAIN_CLASS: &str = "Main-Class";

type Section = Vec<(String, String)>;

/// Keeps the first input manifest, optionally amending its main section.
///
/// Later manifests are ignored. `Main-Class` can be overridden and extra
/// main attributes set; an attribute that already exists is replaced in
/// place, matching names ignoring ASCII case. `Manifest-Version` is always
/// written first. Output lines end in CRLF and are wrapped at 72 bytes with
/// single-space continuation lines.
///
/// The manifest is written when transformers are flushed, so it is the last
/// entry of the output archive rather than the first. Central-directory
/// readers (`java.util.jar.JarFile`, class loaders) find it anywhere;
/// streaming readers such as `java.util.jar.JarInputStream` only recognise a
/// manifest among the leading entries and report none for such an archive.
#[derive(Debug, Default)]
pub struct ManifestResourceTransformer {
    main_class: Option<String>,
    extra: Section,
    main: Section,
    sections: Vec<Section>,
    manifests: usize,
}

impl ManifestResourceTransformer {
    /// Creates a transformer that keeps the first manifest as is.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `Main-Class` written to the output manifest.
    pub fn main_class(mut self, class_name: impl Into<String>) -> Self {
        self.main_class = Some(class_name.into());
        self
    }

    /// Sets a main-section attribute on the output manifest.
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((name.into(), value.into()));
        self
    }

    /// Returns how many manifests were offered, including ignored ones.
    pub fn manifests_seen(&self) -> usize {
        self.manifests
    }

    fn render(&self) -> String {
        let mut main = self.main.clone();
        for (name, value) in self
            .extra
            .iter()
            .cloned()
            .chain(self.main_class.clone().map(|c| (MAIN_CLASS.to_string(), c)))
        {
            set_attribute(&mut main, name, value);
        }

        let version = main
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(MANIFEST_VERSION))
            .map(|i| main.remove(i))
            .unwrap_or_else(|| (MANIFEST_VERSION.to_string(), "1.0".to_string()));

        let mut out = String::new();
        for (name, value) in std::iter::once(&version).chain(main.iter()) {
            write_attribute(&mut out, name, value);
        }
        out.push_str("\r\n");
        for section in &self.sections {
            for (name, value) in section {
                write_attribute(&mut out, name, value);
            }
            out.push_str("\r\n");
        }
        out
    }
}

fn set_attribute(section: &mut Section, name: String, value: String) {
    match section.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
        Some(existing) => existing.1 = value,
        None => section.push((name, value)),
    }
}

fn write_attribute(out: &mut String, name: &str, value: &str) {
    let line = format!("{}: {}", name, value);
    let mut rest = line.as_str();
    let mut limit = MAX_LINE_BYTES;
    while rest.len() > limit {
        let mut cut = limit;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        out.push_str(&rest[..cut]);
        out.push_str("\r\n ");
        rest = &rest[cut..];
        limit = MAX_LINE_BYTES - 1;
    }
    out.push_str(rest);
    out.push_str("\r\n");
}

/// Splits manifest text into its main section and per-entry sections.
fn parse_manifest(text: &str) -> Result<(Section, Vec<Section>)> {
    let mut sections: Vec<Section> = vec![Vec::new()];
    let mut in_section = true;

    for (number, line) in text.lines().enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            in_section = false;
            continue;
        }
        if let Some(more) = line.strip_prefix(' ') {
            let current = sections.last_mut().and_then(|s| s.last_mut());
            let Some(current) = current.filter(|_| in_section) else {
                return Err(Error::transformer(
                    NAME,
                    format!("line {}: continuation without an attribute", number + 1),
                ));
            };
            current.1.push_str(more);
            continue;
        }
        let Some((name, value)) = line.split_once(": ") else {
            return Err(Error::transformer(
                NAME,
                format!("line {}: expected 'Name: value'", number + 1),
            ));
        };
        if !in_section {
            sections.push(Vec::new());
            in_section = true;
        }
        if let Some(section) = sections.last_mut() {
            section.push((name.to_string(), value.to_string()));
        }
    }

    let main = sections.remove(0);
    Ok((main, sections))
}

impl ResourceTransformer for ManifestResourceTransformer {
    fn name(&self) -> &str {
        NAME
    }

    fn can_transform_resource(&self, path: &ArchivePath) -> bool {
        path.as_str().eq_ignore_ascii_case(MANIFEST_PATH)
    }

    fn process_resource(&mut self, path: &ArchivePath, data: &[u8], _: &Relocators) -> Result<()> {
        self.manifests += 1;
        if self.manifests > 1 {
            log::debug!("{}: ignoring {} (first manifest wins)", NAME, path);
            return Ok(());
        }
        let (main, sections) = parse_manifest(decode_text(NAME, data)?)?;
        self.main = main;
        self.sections = sections;
        Ok(())
    }

    fn has_transformed_resource(&self) -> bool {
        self.manifests > 0
    }

    fn modify_output(&mut self, sink: &mut dyn OutputSink) -> Result<()> {
        sink.put_entry(&ArchivePath::new(MANIFEST_PATH)?, self.render().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::write::MemorySink;

    fn output(t: &mut ManifestResourceTransformer) -> String {
        let mut sink = MemorySink::new();
        t.modify_output(&mut sink).unwrap();
        String::from_utf8(sink.get(MANIFEST_PATH).unwrap().to_vec()).unwrap()
    }

    fn process(t: &mut ManifestResourceTransformer, text: &str) {
        let path = ArchivePath::new(MANIFEST_PATH).unwrap();
        assert!(t.can_transform_resource(&path));
        t.process_resource(&path, text.as_bytes(), &Relocators::new())
            .unwrap();
    }

    #[test]
    fn test_first_manifest_wins() {
        let mut t = ManifestResourceTransformer::new();
        process(&mut t, "Created-By: a\nManifest-Version: 1.0\n\n");
        process(&mut t, "Manifest-Version: 1.0\nCreated-By: b\n");
        assert_eq!(t.manifests_seen(), 2);
        assert_eq!(
            output(&mut t),
            "Manifest-Version: 1.0\r\nCreated-By: a\r\n\r\n"
        );
    }

    #[test]
    fn test_main_class_and_attributes() {
        let mut t = ManifestResourceTransformer::new()
            .main_class("com.foo.Main")
            .attribute("created-by", "jarshade")
            .attribute("X-Extra", "1");
        process(&mut t, "Manifest-Version: 1.0\r\nCreated-By: maven\r\nMain-Class: old.Main\r\n");
        assert_eq!(
            output(&mut t),
            "Manifest-Version: 1.0\r\nCreated-By: jarshade\r\nMain-Class: com.foo.Main\r\nX-Extra: 1\r\n\r\n"
        );
    }

    #[test]
    fn test_entry_sections_and_continuations() {
        let mut t = ManifestResourceTransformer::new();
        process(
            &mut t,
            "Manifest-Version: 1.0\n\nName: com/foo/\nSealed: tr\n ue\n",
        );
        assert_eq!(
            output(&mut t),
            "Manifest-Version: 1.0\r\n\r\nName: com/foo/\r\nSealed: true\r\n\r\n"
        );
    }

    #[test]
    fn test_long_lines_wrap_at_72_bytes() {
        let value = "é".repeat(60);
        let mut t = ManifestResourceTransformer::new().attribute("Class-Path", value.clone());
        process(&mut t, "Manifest-Version: 1.0\n");
        let text = output(&mut t);

        for line in text.split("\r\n") {
            assert!(line.len() <= MAX_LINE_BYTES, "{line:?}");
        }
        let joined = text.replace("\r\n ", "");
        assert!(joined.contains(&format!("Class-Path: {}\r\n", value)));
    }

    #[test]
    fn test_default_version_added() {
        let mut t = ManifestResourceTransformer::new();
        process(&mut t, "Created-By: a\n");
        assert!(output(&mut t).starts_with("Manifest-Version: 1.0\r\n"));
    }

    #[test]
    fn test_malformed_manifest() {
        let mut t = ManifestResourceTransformer::new();
        let path = ArchivePath::new(MANIFEST_PATH).unwrap();
        let err = t
            .process_resource(&path, b" dangling\n", &Relocators::new())
            .unwrap_err();
        assert!(err.to_string().contains("continuation"));

        let mut t = ManifestResourceTransformer::new();
        let err = t
            .process_resource(&path, b"NoColon\n", &Relocators::new())
            .unwrap_err();
        assert!(err.to_string().contains("Name: value"));
    }
}
