//! Tests for malformed and hostile input archives.
//!
//! Every failure must surface as an error naming the archive (and entry,
//! where there is one) and must never panic.

mod common;

use std::io::Cursor;

use jarshade::{Error, JarReader, ShadeRequest, Shader, SimpleRelocator};
use tempfile::TempDir;

#[test]
fn test_garbage_is_unreadable() {
    let err = JarReader::open(Cursor::new(b"definitely not a jar".to_vec()), "junk.jar")
        .unwrap_err();
    assert!(matches!(err, Error::ArchiveUnreadable { .. }));
    assert_eq!(err.archive(), Some("junk.jar"));
}

#[test]
fn test_empty_file_is_unreadable() {
    let err = JarReader::open(Cursor::new(Vec::new()), "empty.jar").unwrap_err();
    assert!(matches!(err, Error::ArchiveUnreadable { .. }));
}

#[test]
fn test_truncated_jar() {
    let bytes = common::create_jar(&[("a.txt", b"some content"), ("b.txt", b"more")]);
    for cut in [bytes.len() / 2, bytes.len() - 10] {
        let result = JarReader::open(Cursor::new(bytes[..cut].to_vec()), "cut.jar")
            .and_then(|mut reader| reader.entries());
        assert!(result.is_err(), "cut at {} should fail", cut);
    }
}

#[test]
fn test_traversal_entry_name_rejected() {
    let bytes = common::create_jar(&[("../evil.txt", b"x")]);
    let err = JarReader::open(Cursor::new(bytes), "evil.jar")
        .unwrap()
        .entries()
        .unwrap_err();
    assert!(matches!(err, Error::Entry { .. }));
    assert_eq!(err.entry_name(), Some("../evil.txt"));
}

#[test]
fn test_malformed_class_names_archive_and_entry() {
    let temp = TempDir::new().unwrap();
    let input = common::write_jar(
        temp.path(),
        "broken.jar",
        &[("com/foo/Bar.class", b"\xCA\xFE\xBA\xBE\x00\x00\x00\x34\x00\x09")],
    );
    let out = temp.path().join("out.jar");

    let err = Shader::default()
        .shade(
            ShadeRequest::new(&out)
                .input(&input)
                .relocator(SimpleRelocator::new("com.foo").unwrap()),
        )
        .unwrap_err();

    assert!(err.is_corruption());
    assert!(err.archive().unwrap().ends_with("broken.jar"));
    assert_eq!(err.entry_name(), Some("com/foo/Bar.class"));
    assert!(!out.exists());
}

#[test]
fn test_classes_are_not_parsed_without_relocators() {
    let temp = TempDir::new().unwrap();
    let garbage = b"\xCA\xFE not really a class";
    let input = common::write_jar(temp.path(), "in.jar", &[("com/foo/Bar.class", garbage)]);
    let out = temp.path().join("out.jar");

    Shader::default()
        .shade(ShadeRequest::new(&out).input(&input))
        .unwrap();

    let entries = common::read_jar(&out).unwrap();
    assert_eq!(common::entry(&entries, "com/foo/Bar.class").unwrap(), garbage);
}

#[test]
fn test_bad_services_encoding_is_transformer_error() {
    let temp = TempDir::new().unwrap();
    let input = common::write_jar(
        temp.path(),
        "in.jar",
        &[("META-INF/services/com.foo.Spi", b"\xFF\xFE\x00bad")],
    );
    let out = temp.path().join("out.jar");

    let err = Shader::default()
        .shade(
            ShadeRequest::new(&out)
                .input(&input)
                .transformer(jarshade::transform::ServicesResourceTransformer::new()),
        )
        .unwrap_err();

    assert!(matches!(err, Error::Transformer { .. }));
    assert_eq!(err.entry_name(), Some("META-INF/services/com.foo.Spi"));
}
