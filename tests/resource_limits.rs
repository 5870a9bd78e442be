//! Tests for resource limit enforcement.
//!
//! Limits bound what one input archive may expand to, so that a hostile
//! jar cannot exhaust memory during a run.

mod common;

use std::io::Cursor;

use jarshade::{Error, JarReader, ReadLimits, ShadeOptions, ShadeRequest, Shader};
use tempfile::TempDir;

#[test]
fn test_default_limits_accept_normal_jar() {
    let bytes = common::create_jar(&[("a.txt", b"hello"), ("b.txt", b"world")]);
    let mut reader = JarReader::open(Cursor::new(bytes), "small.jar").unwrap();
    assert_eq!(reader.entries().unwrap().len(), 2);
}

#[test]
fn test_entry_count_limit() {
    let bytes = common::create_jar(&[("a", b"1"), ("b", b"2"), ("c", b"3")]);
    let err = JarReader::open(Cursor::new(bytes), "many.jar")
        .unwrap()
        .with_limits(ReadLimits::new().max_entries(2))
        .entries()
        .unwrap_err();
    assert!(matches!(err, Error::ResourceLimitExceeded(_)));
    assert!(err.to_string().contains("many.jar"));
}

#[test]
fn test_entry_size_limit() {
    let big = vec![b'x'; 4096];
    let bytes = common::create_jar(&[("big.bin", &big)]);
    let err = JarReader::open(Cursor::new(bytes), "big.jar")
        .unwrap()
        .with_limits(ReadLimits::new().max_entry_size(1024))
        .entries()
        .unwrap_err();
    assert!(matches!(err, Error::ResourceLimitExceeded(_)));
    assert!(err.to_string().contains("big.bin"));
}

#[test]
fn test_total_size_limit() {
    let chunk = vec![b'y'; 600];
    let bytes = common::create_jar(&[("one.bin", &chunk), ("two.bin", &chunk)]);
    let err = JarReader::open(Cursor::new(bytes), "wide.jar")
        .unwrap()
        .with_limits(ReadLimits::new().max_total_size(1000))
        .entries()
        .unwrap_err();
    assert!(matches!(err, Error::ResourceLimitExceeded(_)));
}

#[test]
fn test_unlimited_reads_everything() {
    let chunk = vec![0u8; 8192];
    let bytes = common::create_jar(&[("one.bin", &chunk), ("two.bin", &chunk)]);
    let mut reader = JarReader::open(Cursor::new(bytes), "wide.jar")
        .unwrap()
        .with_limits(ReadLimits::unlimited());
    assert_eq!(reader.entries().unwrap().len(), 2);
}

#[test]
fn test_shader_applies_limits() {
    let temp = TempDir::new().unwrap();
    let input = common::write_jar(temp.path(), "in.jar", &[("a", b"1"), ("b", b"2")]);
    let out = temp.path().join("out.jar");

    let err = Shader::new(ShadeOptions::new().limits(ReadLimits::new().max_entries(1)))
        .shade(ShadeRequest::new(&out).input(&input))
        .unwrap_err();

    assert!(matches!(err, Error::ResourceLimitExceeded(_)));
    assert!(!out.exists());
}
