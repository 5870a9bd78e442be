//! Binary class-file codec.
//!
//! [`ClassFile::parse`] turns the bytes of a `.class` entry into a structured
//! representation and [`ClassFile::to_bytes`] writes it back. Attribute
//! bodies are kept as raw bytes; the [`remap`] module patches the few
//! attributes that carry type names in place.
//!
//! ```
//! use jarshade::classfile::{ClassFile, ConstantPool};
//!
//! let mut pool = ConstantPool::new();
//! let this_class = pool.push_class("com/foo/Bar")?;
//! let super_class = pool.push_class("java/lang/Object")?;
//! let class = ClassFile::new(pool, this_class, super_class);
//!
//! let bytes = class.to_bytes()?;
//! let parsed = ClassFile::parse(&bytes)?;
//! assert_eq!(parsed.class_name()?, "com/foo/Bar");
//! # Ok::<(), jarshade::Error>(())
//! ```

mod constant_pool;
pub(crate) mod descriptor;
pub mod mutf8;
mod reader;
pub mod remap;

pub use constant_pool::{Constant, ConstantPool, MAX_POOL_SLOTS, tag};
pub use remap::{ClassRemapper, RelocationResult, RemappedClass};

use std::borrow::Cow;

use crate::{Error, Result};
use reader::ByteReader;

/// The four bytes every class file starts with.
pub const MAGIC: u32 = 0xCAFE_BABE;

/// Major version written by [`ClassFile::new`] (Java 8).
const DEFAULT_MAJOR_VERSION: u16 = 52;

/// A raw attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    /// Index of the attribute name in the constant pool.
    pub name_index: u16,
    /// Attribute body, without the six-byte header.
    pub info: Vec<u8>,
    /// Offset of `info` in the parsed class file; 0 for constructed attributes.
    pub offset: u64,
}

impl AttributeInfo {
    /// Creates an attribute with no source offset.
    pub fn new(name_index: u16, info: Vec<u8>) -> Self {
        Self {
            name_index,
            info,
            offset: 0,
        }
    }

    fn parse(r: &mut ByteReader<'_>) -> Result<Self> {
        let name_index = r.u16()?;
        let len = r.u32()? as usize;
        let offset = r.offset();
        let info = r.bytes(len)?.to_vec();
        Ok(Self {
            name_index,
            info,
            offset,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        let len = u32::try_from(self.info.len())
            .map_err(|_| Error::malformed_class(self.offset, "attribute longer than 4 GiB"))?;
        out.extend_from_slice(&self.name_index.to_be_bytes());
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&self.info);
        Ok(())
    }
}

/// A field or method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    /// `ACC_*` flags.
    pub access_flags: u16,
    /// Utf8 holding the member name.
    pub name_index: u16,
    /// Utf8 holding the field or method descriptor.
    pub descriptor_index: u16,
    /// Member attributes (`Code`, `Signature`, annotations, ...).
    pub attributes: Vec<AttributeInfo>,
}

impl MemberInfo {
    fn parse(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            access_flags: r.u16()?,
            name_index: r.u16()?,
            descriptor_index: r.u16()?,
            attributes: parse_attributes(r)?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.access_flags.to_be_bytes());
        out.extend_from_slice(&self.name_index.to_be_bytes());
        out.extend_from_slice(&self.descriptor_index.to_be_bytes());
        write_attributes(&self.attributes, out)
    }
}

/// A parsed class file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    /// Minor class-file version.
    pub minor_version: u16,
    /// Major class-file version (52 is Java 8).
    pub major_version: u16,
    /// The constant pool.
    pub constant_pool: ConstantPool,
    /// `ACC_*` class flags.
    pub access_flags: u16,
    /// Class constant naming this class.
    pub this_class: u16,
    /// Class constant naming the super class.
    ///
    /// Zero for `java/lang/Object` and `module-info`.
    pub super_class: u16,
    /// Class constants of the implemented interfaces.
    pub interfaces: Vec<u16>,
    /// Declared fields.
    pub fields: Vec<MemberInfo>,
    /// Declared methods.
    pub methods: Vec<MemberInfo>,
    /// Class attributes.
    pub attributes: Vec<AttributeInfo>,
}

impl ClassFile {
    /// Creates an empty public class around an existing pool.
    pub fn new(constant_pool: ConstantPool, this_class: u16, super_class: u16) -> Self {
        Self {
            minor_version: 0,
            major_version: DEFAULT_MAJOR_VERSION,
            constant_pool,
            access_flags: 0x0021,
            this_class,
            super_class,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Parses class-file bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedClass`] with the offset of the first byte
    /// that could not be understood, including trailing garbage.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(data);

        let magic = r.u32()?;
        if magic != MAGIC {
            return Err(Error::malformed_class(
                0,
                format!("bad magic {:#010x}", magic),
            ));
        }

        let minor_version = r.u16()?;
        let major_version = r.u16()?;
        let constant_pool = ConstantPool::parse(&mut r)?;
        let access_flags = r.u16()?;
        let this_class = r.u16()?;
        let super_class = r.u16()?;

        let interface_count = r.u16()?;
        let interfaces = (0..interface_count)
            .map(|_| r.u16())
            .collect::<Result<Vec<_>>>()?;

        let fields = parse_members(&mut r)?;
        let methods = parse_members(&mut r)?;
        let attributes = parse_attributes(&mut r)?;

        if !r.is_empty() {
            return Err(r.error(format!("{} trailing bytes", r.remaining())));
        }

        Ok(Self {
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    /// Serializes the class file.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(1024);
        out.extend_from_slice(&MAGIC.to_be_bytes());
        out.extend_from_slice(&self.minor_version.to_be_bytes());
        out.extend_from_slice(&self.major_version.to_be_bytes());
        self.constant_pool.write(&mut out)?;
        out.extend_from_slice(&self.access_flags.to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());

        write_count(self.interfaces.len(), "interfaces", &mut out)?;
        for interface in &self.interfaces {
            out.extend_from_slice(&interface.to_be_bytes());
        }

        write_count(self.fields.len(), "fields", &mut out)?;
        for field in &self.fields {
            field.write(&mut out)?;
        }
        write_count(self.methods.len(), "methods", &mut out)?;
        for method in &self.methods {
            method.write(&mut out)?;
        }
        write_attributes(&self.attributes, &mut out)?;
        Ok(out)
    }

    /// Returns the internal (slashed) name of this class.
    pub fn class_name(&self) -> Result<Cow<'_, str>> {
        self.constant_pool.class_name(self.this_class)
    }

    /// Returns the internal name of the superclass, if any.
    pub fn super_class_name(&self) -> Result<Option<Cow<'_, str>>> {
        if self.super_class == 0 {
            return Ok(None);
        }
        self.constant_pool.class_name(self.super_class).map(Some)
    }

    /// Returns the name of an attribute.
    pub fn attribute_name(&self, attribute: &AttributeInfo) -> Result<Cow<'_, str>> {
        self.constant_pool.utf8(attribute.name_index)
    }
}

fn parse_members(r: &mut ByteReader<'_>) -> Result<Vec<MemberInfo>> {
    let count = r.u16()?;
    (0..count).map(|_| MemberInfo::parse(r)).collect()
}

fn parse_attributes(r: &mut ByteReader<'_>) -> Result<Vec<AttributeInfo>> {
    let count = r.u16()?;
    (0..count).map(|_| AttributeInfo::parse(r)).collect()
}

fn write_attributes(attributes: &[AttributeInfo], out: &mut Vec<u8>) -> Result<()> {
    write_count(attributes.len(), "attributes", out)?;
    for attribute in attributes {
        attribute.write(out)?;
    }
    Ok(())
}

fn write_count(count: usize, what: &str, out: &mut Vec<u8>) -> Result<()> {
    let count = u16::try_from(count)
        .map_err(|_| Error::malformed_class(0, format!("too many {}: {}", what, count)))?;
    out.extend_from_slice(&count.to_be_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClassFile {
        let mut pool = ConstantPool::new();
        let this_class = pool.push_class("com/foo/Bar").unwrap();
        let super_class = pool.push_class("java/lang/Object").unwrap();
        let iface = pool.push_class("java/lang/Runnable").unwrap();
        let field_name = pool.push_utf8("value").unwrap();
        let field_desc = pool.push_utf8("Lcom/foo/Baz;").unwrap();
        let signature = pool.push_utf8("Signature").unwrap();
        let sig_value = pool.push_utf8("Ljava/util/List<Lcom/foo/Baz;>;").unwrap();

        let mut class = ClassFile::new(pool, this_class, super_class);
        class.interfaces.push(iface);
        class.fields.push(MemberInfo {
            access_flags: 0x0002,
            name_index: field_name,
            descriptor_index: field_desc,
            attributes: vec![AttributeInfo::new(
                signature,
                sig_value.to_be_bytes().to_vec(),
            )],
        });
        class
    }

    #[test]
    fn test_to_bytes_then_parse() {
        let class = sample();
        let bytes = class.to_bytes().unwrap();
        assert_eq!(&bytes[..4], &[0xCA, 0xFE, 0xBA, 0xBE]);

        let parsed = ClassFile::parse(&bytes).unwrap();
        assert_eq!(parsed.class_name().unwrap(), "com/foo/Bar");
        assert_eq!(
            parsed.super_class_name().unwrap().as_deref(),
            Some("java/lang/Object")
        );
        assert_eq!(parsed.interfaces.len(), 1);
        assert_eq!(parsed.fields.len(), 1);
        let attr = &parsed.fields[0].attributes[0];
        assert_eq!(parsed.attribute_name(attr).unwrap(), "Signature");
        assert!(attr.offset > 0);

        // Re-serializing a parsed class is lossless.
        assert_eq!(parsed.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_bad_magic() {
        let err = ClassFile::parse(&[0xCA, 0xFE, 0xD0, 0x0D, 0, 0, 0, 52]).unwrap_err();
        assert!(err.to_string().contains("bad magic"));
    }

    #[test]
    fn test_truncated_class() {
        let bytes = sample().to_bytes().unwrap();
        for len in [3, 9, bytes.len() / 2, bytes.len() - 1] {
            let err = ClassFile::parse(&bytes[..len]).unwrap_err();
            assert!(matches!(err, Error::MalformedClass { .. }), "len {len}");
        }
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = sample().to_bytes().unwrap();
        let end = bytes.len() as u64;
        bytes.extend_from_slice(&[0, 0]);
        match ClassFile::parse(&bytes).unwrap_err() {
            Error::MalformedClass { offset, reason } => {
                assert_eq!(offset, end);
                assert!(reason.contains("trailing"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_super_class_zero() {
        let mut pool = ConstantPool::new();
        let this_class = pool.push_class("java/lang/Object").unwrap();
        let class = ClassFile::new(pool, this_class, 0);
        assert_eq!(class.super_class_name().unwrap(), None);
    }
}
