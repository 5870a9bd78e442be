//! Shared test utilities for integration tests.
//!
//! Jar and class-file builders used across multiple test files.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use jarshade::classfile::{ClassFile, ConstantPool, MemberInfo};
use jarshade::{JarReader, Result};
use zip::write::SimpleFileOptions;

/// Creates an in-memory jar with the given entries.
///
/// Names ending in `/` become directory entries.
///
/// # Example
///
/// ```ignore
/// let bytes = create_jar(&[("META-INF/", b""), ("a.txt", b"content")]);
/// ```
pub fn create_jar(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, data) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(*name, options)
                .expect("Failed to add directory");
        } else {
            writer.start_file(*name, options).expect("Failed to start file");
            writer.write_all(data).expect("Failed to write entry");
        }
    }
    writer.finish().expect("Failed to finish jar").into_inner()
}

/// Writes a jar with the given entries into `dir` and returns its path.
pub fn write_jar(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, create_jar(entries)).expect("Failed to write jar");
    path
}

/// Reads every file entry of a jar on disk as `(path, data)` pairs.
pub fn read_jar(path: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    let mut reader = JarReader::open_path(path)?;
    Ok(reader
        .entries()?
        .into_iter()
        .filter(|e| e.kind() != jarshade::EntryKind::Directory)
        .map(|e| (e.path().to_string(), e.into_data()))
        .collect())
}

/// Returns the data of one entry of a jar listing.
pub fn entry<'a>(entries: &'a [(String, Vec<u8>)], path: &str) -> Option<&'a [u8]> {
    entries
        .iter()
        .find(|(p, _)| p == path)
        .map(|(_, d)| d.as_slice())
}

/// Builds a minimal class file with a name and super class.
pub fn class_bytes(name: &str, super_name: &str) -> Vec<u8> {
    ClassBuilder::new(name, super_name).build()
}

/// Incrementally builds class files that reference other classes.
pub struct ClassBuilder {
    class: ClassFile,
}

impl ClassBuilder {
    /// Starts a class with the given internal name and super class.
    pub fn new(name: &str, super_name: &str) -> Self {
        let mut pool = ConstantPool::new();
        let this_class = pool.push_class(name).expect("pool");
        let super_class = pool.push_class(super_name).expect("pool");
        Self {
            class: ClassFile::new(pool, this_class, super_class),
        }
    }

    /// Adds an implemented interface.
    pub fn interface(mut self, name: &str) -> Self {
        let index = self.class.constant_pool.push_class(name).expect("pool");
        self.class.interfaces.push(index);
        self
    }

    /// Adds a field with the given descriptor.
    pub fn field(mut self, name: &str, descriptor: &str) -> Self {
        let pool = &mut self.class.constant_pool;
        let name_index = pool.push_utf8(name).expect("pool");
        let descriptor_index = pool.push_utf8(descriptor).expect("pool");
        self.class.fields.push(MemberInfo {
            access_flags: 0x0002,
            name_index,
            descriptor_index,
            attributes: Vec::new(),
        });
        self
    }

    /// Adds a method with the given descriptor.
    pub fn method(mut self, name: &str, descriptor: &str) -> Self {
        let pool = &mut self.class.constant_pool;
        let name_index = pool.push_utf8(name).expect("pool");
        let descriptor_index = pool.push_utf8(descriptor).expect("pool");
        self.class.methods.push(MemberInfo {
            access_flags: 0x0001,
            name_index,
            descriptor_index,
            attributes: Vec::new(),
        });
        self
    }

    /// Adds a string constant.
    pub fn string(mut self, value: &str) -> Self {
        self.class.constant_pool.push_string(value).expect("pool");
        self
    }

    /// Serializes the class.
    pub fn build(self) -> Vec<u8> {
        self.class.to_bytes().expect("Failed to serialize class")
    }
}

/// Returns every decoded string constant of a class.
pub fn string_constants(bytes: &[u8]) -> Vec<String> {
    let class = ClassFile::parse(bytes).expect("Failed to parse class");
    let pool = &class.constant_pool;
    pool.iter()
        .filter_map(|(_, c)| match c {
            jarshade::classfile::Constant::String { string_index } => {
                pool.utf8(*string_index).ok().map(|s| s.into_owned())
            }
            _ => None,
        })
        .collect()
}

/// Returns every `Class` constant name of a class.
pub fn class_constants(bytes: &[u8]) -> Vec<String> {
    let class = ClassFile::parse(bytes).expect("Failed to parse class");
    let pool = &class.constant_pool;
    pool.iter()
        .filter_map(|(index, c)| match c {
            jarshade::classfile::Constant::Class { .. } => {
                pool.class_name(index).ok().map(|s| s.into_owned())
            }
            _ => None,
        })
        .collect()
}

/// Returns the descriptors of every field and method of a class.
pub fn member_descriptors(bytes: &[u8]) -> Vec<String> {
    let class = ClassFile::parse(bytes).expect("Failed to parse class");
    class
        .fields
        .iter()
        .chain(class.methods.iter())
        .map(|m| {
            class
                .constant_pool
                .utf8(m.descriptor_index)
                .expect("descriptor")
                .into_owned()
        })
        .collect()
}
