//! Worklist-driven runs.
//!
//! A worklist is a JSON file naming inputs, output, rules and options;
//! relative paths resolve against the worklist's own directory.

#![cfg(feature = "config")]

use jarshade::{ShadeConfig, Shader};
use tempfile::TempDir;

mod common;

use common::{class_bytes, entry, read_jar, write_jar};

#[test]
fn test_worklist_run() {
    let temp = TempDir::new().unwrap();
    let lib = temp.path().join("lib");
    std::fs::create_dir(&lib).unwrap();

    let bar = class_bytes("com/foo/Bar", "java/lang/Object");
    write_jar(
        &lib,
        "app.jar",
        &[
            ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\r\n\r\n"),
            ("com/foo/Bar.class", &bar),
            ("META-INF/services/com.foo.Spi", b"com.foo.Bar\n"),
            ("META-INF/app.SF", b"sig"),
        ],
    );
    write_jar(&lib, "app-sources.jar", &[("com/foo/Bar.java", b"class Bar {}")]);

    let worklist = temp.path().join("shade.json");
    std::fs::write(
        &worklist,
        r#"{
            "inputs": ["lib/app.jar", "lib/app-sources.jar"],
            "output": "out.jar",
            "relocations": [{ "pattern": "com.foo", "shaded-pattern": "app.shaded.foo" }],
            "transformers": [
                { "type": "dont-include", "patterns": ["META-INF/*.SF"] },
                { "type": "services", "relocate-entries": true },
                { "type": "manifest", "main-class": "app.shaded.foo.Bar" }
            ],
            "options": { "compression": "stored", "exclude-inputs": ["*-sources.jar"] }
        }"#,
    )
    .unwrap();

    let (request, options) = ShadeConfig::from_path(&worklist)
        .unwrap()
        .into_request()
        .unwrap();
    assert_eq!(request.destination, temp.path().join("out.jar"));

    let result = Shader::new(options).shade(request).unwrap();
    assert_eq!(result.archives, 1);
    assert_eq!(result.excluded_inputs.len(), 1);

    let entries = read_jar(&temp.path().join("out.jar")).unwrap();
    let mut paths: Vec<&str> = entries.iter().map(|(p, _)| p.as_str()).collect();
    paths.sort_unstable();
    assert_eq!(
        paths,
        vec![
            "META-INF/MANIFEST.MF",
            "META-INF/services/app.shaded.foo.Spi",
            "app/shaded/foo/Bar.class",
        ]
    );
    assert_eq!(
        entry(&entries, "META-INF/services/app.shaded.foo.Spi").unwrap(),
        b"app.shaded.foo.Bar\n"
    );
    let manifest = std::str::from_utf8(entry(&entries, "META-INF/MANIFEST.MF").unwrap()).unwrap();
    assert!(manifest.contains("Main-Class: app.shaded.foo.Bar\r\n"));
}

#[test]
fn test_worklist_errors() {
    let temp = TempDir::new().unwrap();

    let missing = ShadeConfig::from_path(temp.path().join("nope.json")).unwrap_err();
    assert!(!missing.is_configuration_error());

    let bad = temp.path().join("bad.json");
    std::fs::write(&bad, r#"{ "inputs": ["a.jar"], "output": "o.jar", "transformers": [{ "type": "bogus" }] }"#)
        .unwrap();
    assert!(ShadeConfig::from_path(&bad).unwrap_err().is_configuration_error());

    let empty = temp.path().join("empty.json");
    std::fs::write(&empty, r#"{ "inputs": [], "output": "o.jar" }"#).unwrap();
    assert!(
        ShadeConfig::from_path(&empty)
            .unwrap()
            .into_request()
            .unwrap_err()
            .is_configuration_error()
    );
}
