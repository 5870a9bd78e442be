//! The class-file constant pool.

use std::borrow::Cow;

use super::mutf8;
use super::reader::ByteReader;
use crate::{Error, Result};

/// Constant-pool tags from the JVM specification.
pub mod tag {
    /// `CONSTANT_Utf8`.
    pub const UTF8: u8 = 1;
    /// `CONSTANT_Integer`.
    pub const INTEGER: u8 = 3;
    /// `CONSTANT_Float`.
    pub const FLOAT: u8 = 4;
    /// `CONSTANT_Long`, occupying two slots.
    pub const LONG: u8 = 5;
    /// `CONSTANT_Double`, occupying two slots.
    pub const DOUBLE: u8 = 6;
    /// `CONSTANT_Class`.
    pub const CLASS: u8 = 7;
    /// `CONSTANT_String`.
    pub const STRING: u8 = 8;
    /// `CONSTANT_Fieldref`.
    pub const FIELDREF: u8 = 9;
    /// `CONSTANT_Methodref`.
    pub const METHODREF: u8 = 10;
    /// `CONSTANT_InterfaceMethodref`.
    pub const INTERFACE_METHODREF: u8 = 11;
    /// `CONSTANT_NameAndType`.
    pub const NAME_AND_TYPE: u8 = 12;
    /// `CONSTANT_MethodHandle`.
    pub const METHOD_HANDLE: u8 = 15;
    /// `CONSTANT_MethodType`.
    pub const METHOD_TYPE: u8 = 16;
    /// `CONSTANT_Dynamic`.
    pub const DYNAMIC: u8 = 17;
    /// `CONSTANT_InvokeDynamic`.
    pub const INVOKE_DYNAMIC: u8 = 18;
    /// `CONSTANT_Module`.
    pub const MODULE: u8 = 19;
    /// `CONSTANT_Package`.
    pub const PACKAGE: u8 = 20;
}

/// Largest number of slots a constant pool can describe (its count is a `u16`).
pub const MAX_POOL_SLOTS: usize = u16::MAX as usize;

/// One constant-pool entry.
///
/// `Utf8` keeps the raw modified-UTF-8 bytes so that parsing and writing
/// back an unchanged pool is lossless. Floats and doubles keep their bit
/// patterns for the same reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    /// Slot 0 and the second slot of a long or double.
    Unusable,
    /// Raw modified-UTF-8 text.
    Utf8(Vec<u8>),
    /// A 32-bit integer.
    Integer(u32),
    /// Bit pattern of a 32-bit float.
    Float(u32),
    /// A 64-bit integer.
    Long(u64),
    /// Bit pattern of a 64-bit double.
    Double(u64),
    /// A class or array type.
    Class {
        /// Utf8 holding the internal name or array descriptor.
        name_index: u16,
    },
    /// A string literal.
    String {
        /// Utf8 holding the literal.
        string_index: u16,
    },
    /// A field reference.
    Fieldref {
        /// Class declaring the field.
        class_index: u16,
        /// Field name and descriptor.
        name_and_type_index: u16,
    },
    /// A method reference.
    Methodref {
        /// Class declaring the method.
        class_index: u16,
        /// Method name and descriptor.
        name_and_type_index: u16,
    },
    /// An interface method reference.
    InterfaceMethodref {
        /// Interface declaring the method.
        class_index: u16,
        /// Method name and descriptor.
        name_and_type_index: u16,
    },
    /// A member name paired with its descriptor.
    NameAndType {
        /// Utf8 holding the member name.
        name_index: u16,
        /// Utf8 holding the field or method descriptor.
        descriptor_index: u16,
    },
    /// A method handle.
    MethodHandle {
        /// Handle kind, 1 to 9.
        reference_kind: u8,
        /// Field or method reference the handle points at.
        reference_index: u16,
    },
    /// A method type.
    MethodType {
        /// Utf8 holding the method descriptor.
        descriptor_index: u16,
    },
    /// A dynamically computed constant.
    Dynamic {
        /// Index into the `BootstrapMethods` attribute.
        bootstrap_method_attr_index: u16,
        /// Name and field descriptor of the constant.
        name_and_type_index: u16,
    },
    /// An `invokedynamic` call site.
    InvokeDynamic {
        /// Index into the `BootstrapMethods` attribute.
        bootstrap_method_attr_index: u16,
        /// Name and method descriptor of the call site.
        name_and_type_index: u16,
    },
    /// A module.
    Module {
        /// Utf8 holding the module name.
        name_index: u16,
    },
    /// A package exported or opened by a module.
    Package {
        /// Utf8 holding the internal package name.
        name_index: u16,
    },
}

impl Constant {
    /// Returns `true` for constants that occupy two slots.
    pub fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }

    fn tag(&self) -> Option<u8> {
        Some(match self {
            Constant::Unusable => return None,
            Constant::Utf8(_) => tag::UTF8,
            Constant::Integer(_) => tag::INTEGER,
            Constant::Float(_) => tag::FLOAT,
            Constant::Long(_) => tag::LONG,
            Constant::Double(_) => tag::DOUBLE,
            Constant::Class { .. } => tag::CLASS,
            Constant::String { .. } => tag::STRING,
            Constant::Fieldref { .. } => tag::FIELDREF,
            Constant::Methodref { .. } => tag::METHODREF,
            Constant::InterfaceMethodref { .. } => tag::INTERFACE_METHODREF,
            Constant::NameAndType { .. } => tag::NAME_AND_TYPE,
            Constant::MethodHandle { .. } => tag::METHOD_HANDLE,
            Constant::MethodType { .. } => tag::METHOD_TYPE,
            Constant::Dynamic { .. } => tag::DYNAMIC,
            Constant::InvokeDynamic { .. } => tag::INVOKE_DYNAMIC,
            Constant::Module { .. } => tag::MODULE,
            Constant::Package { .. } => tag::PACKAGE,
        })
    }
}

/// The constant pool of one class, indexed from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantPool {
    slots: Vec<Constant>,
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantPool {
    /// Creates an empty pool (only the unusable slot 0).
    pub fn new() -> Self {
        Self {
            slots: vec![Constant::Unusable],
        }
    }

    /// Number of slots including slot 0; this is the `constant_pool_count`.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns the constant at `index`.
    pub fn get(&self, index: u16) -> Result<&Constant> {
        match self.slots.get(index as usize) {
            Some(Constant::Unusable) | None => Err(Error::malformed_class(
                0,
                format!("invalid constant pool index {}", index),
            )),
            Some(c) => Ok(c),
        }
    }

    pub(crate) fn get_mut(&mut self, index: u16) -> Option<&mut Constant> {
        self.slots.get_mut(index as usize)
    }

    /// Iterates over `(index, constant)` pairs, skipping unusable slots.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, c)| !matches!(c, Constant::Unusable))
            .map(|(i, c)| (i as u16, c))
    }

    /// Returns the decoded text of the `Utf8` constant at `index`.
    pub fn utf8(&self, index: u16) -> Result<Cow<'_, str>> {
        match self.get(index)? {
            Constant::Utf8(bytes) => mutf8::decode(bytes).ok_or_else(|| {
                Error::malformed_class(0, format!("constant #{} is not valid modified UTF-8", index))
            }),
            other => Err(Error::malformed_class(
                0,
                format!("constant #{} is {:?}, expected Utf8", index, other),
            )),
        }
    }

    /// Returns the internal name referenced by the `Class` constant at `index`.
    pub fn class_name(&self, index: u16) -> Result<Cow<'_, str>> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            other => Err(Error::malformed_class(
                0,
                format!("constant #{} is {:?}, expected Class", index, other),
            )),
        }
    }

    /// Appends a constant and returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConstantPoolOverflow`] when the pool is full.
    pub fn push(&mut self, constant: Constant) -> Result<u16> {
        let index = self.slots.len();
        let needed = index + if constant.is_wide() { 2 } else { 1 };
        if needed > MAX_POOL_SLOTS {
            return Err(Error::ConstantPoolOverflow { count: needed });
        }
        let wide = constant.is_wide();
        self.slots.push(constant);
        if wide {
            self.slots.push(Constant::Unusable);
        }
        Ok(index as u16)
    }

    /// Appends a `Utf8` constant.
    pub fn push_utf8(&mut self, text: &str) -> Result<u16> {
        self.push(Constant::Utf8(mutf8::encode(text)))
    }

    /// Appends a `Class` constant (and its name).
    pub fn push_class(&mut self, internal_name: &str) -> Result<u16> {
        let name_index = self.push_utf8(internal_name)?;
        self.push(Constant::Class { name_index })
    }

    /// Appends a `String` constant (and its text).
    pub fn push_string(&mut self, value: &str) -> Result<u16> {
        let string_index = self.push_utf8(value)?;
        self.push(Constant::String { string_index })
    }

    /// Appends a `NameAndType` constant (and its two strings).
    pub fn push_name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16> {
        let name_index = self.push_utf8(name)?;
        let descriptor_index = self.push_utf8(descriptor)?;
        self.push(Constant::NameAndType {
            name_index,
            descriptor_index,
        })
    }

    /// Appends a `Methodref` constant with all the constants it needs.
    pub fn push_method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<u16> {
        let class_index = self.push_class(owner)?;
        let name_and_type_index = self.push_name_and_type(name, descriptor)?;
        self.push(Constant::Methodref {
            class_index,
            name_and_type_index,
        })
    }

    /// Appends a `Fieldref` constant with all the constants it needs.
    pub fn push_field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<u16> {
        let class_index = self.push_class(owner)?;
        let name_and_type_index = self.push_name_and_type(name, descriptor)?;
        self.push(Constant::Fieldref {
            class_index,
            name_and_type_index,
        })
    }

    pub(crate) fn parse(r: &mut ByteReader<'_>) -> Result<Self> {
        let count = r.u16()? as usize;
        if count == 0 {
            return Err(r.error("constant_pool_count must be at least 1"));
        }

        let mut slots = Vec::with_capacity(count);
        slots.push(Constant::Unusable);

        while slots.len() < count {
            let offset = r.offset();
            let constant = match r.u8()? {
                tag::UTF8 => {
                    let len = r.u16()? as usize;
                    Constant::Utf8(r.bytes(len)?.to_vec())
                }
                tag::INTEGER => Constant::Integer(r.u32()?),
                tag::FLOAT => Constant::Float(r.u32()?),
                tag::LONG => Constant::Long(r.u64()?),
                tag::DOUBLE => Constant::Double(r.u64()?),
                tag::CLASS => Constant::Class {
                    name_index: r.u16()?,
                },
                tag::STRING => Constant::String {
                    string_index: r.u16()?,
                },
                tag::FIELDREF => Constant::Fieldref {
                    class_index: r.u16()?,
                    name_and_type_index: r.u16()?,
                },
                tag::METHODREF => Constant::Methodref {
                    class_index: r.u16()?,
                    name_and_type_index: r.u16()?,
                },
                tag::INTERFACE_METHODREF => Constant::InterfaceMethodref {
                    class_index: r.u16()?,
                    name_and_type_index: r.u16()?,
                },
                tag::NAME_AND_TYPE => Constant::NameAndType {
                    name_index: r.u16()?,
                    descriptor_index: r.u16()?,
                },
                tag::METHOD_HANDLE => Constant::MethodHandle {
                    reference_kind: r.u8()?,
                    reference_index: r.u16()?,
                },
                tag::METHOD_TYPE => Constant::MethodType {
                    descriptor_index: r.u16()?,
                },
                tag::DYNAMIC => Constant::Dynamic {
                    bootstrap_method_attr_index: r.u16()?,
                    name_and_type_index: r.u16()?,
                },
                tag::INVOKE_DYNAMIC => Constant::InvokeDynamic {
                    bootstrap_method_attr_index: r.u16()?,
                    name_and_type_index: r.u16()?,
                },
                tag::MODULE => Constant::Module {
                    name_index: r.u16()?,
                },
                tag::PACKAGE => Constant::Package {
                    name_index: r.u16()?,
                },
                other => {
                    return Err(Error::malformed_class(
                        offset,
                        format!("unknown constant pool tag {}", other),
                    ));
                }
            };

            let wide = constant.is_wide();
            slots.push(constant);
            if wide {
                if slots.len() >= count {
                    return Err(Error::malformed_class(
                        offset,
                        "long/double constant in the last pool slot",
                    ));
                }
                slots.push(Constant::Unusable);
            }
        }

        Ok(Self { slots })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        let count = u16::try_from(self.slots.len()).map_err(|_| Error::ConstantPoolOverflow {
            count: self.slots.len(),
        })?;
        out.extend_from_slice(&count.to_be_bytes());

        for constant in &self.slots {
            let Some(tag) = constant.tag() else {
                continue;
            };
            out.push(tag);
            match constant {
                Constant::Unusable => {}
                Constant::Utf8(bytes) => {
                    let len = u16::try_from(bytes.len()).map_err(|_| {
                        Error::malformed_class(0, "Utf8 constant longer than 65535 bytes")
                    })?;
                    out.extend_from_slice(&len.to_be_bytes());
                    out.extend_from_slice(bytes);
                }
                Constant::Integer(v) | Constant::Float(v) => {
                    out.extend_from_slice(&v.to_be_bytes())
                }
                Constant::Long(v) | Constant::Double(v) => out.extend_from_slice(&v.to_be_bytes()),
                Constant::Class { name_index: a }
                | Constant::String { string_index: a }
                | Constant::MethodType {
                    descriptor_index: a,
                }
                | Constant::Module { name_index: a }
                | Constant::Package { name_index: a } => out.extend_from_slice(&a.to_be_bytes()),
                Constant::Fieldref {
                    class_index: a,
                    name_and_type_index: b,
                }
                | Constant::Methodref {
                    class_index: a,
                    name_and_type_index: b,
                }
                | Constant::InterfaceMethodref {
                    class_index: a,
                    name_and_type_index: b,
                }
                | Constant::NameAndType {
                    name_index: a,
                    descriptor_index: b,
                }
                | Constant::Dynamic {
                    bootstrap_method_attr_index: a,
                    name_and_type_index: b,
                }
                | Constant::InvokeDynamic {
                    bootstrap_method_attr_index: a,
                    name_and_type_index: b,
                } => {
                    out.extend_from_slice(&a.to_be_bytes());
                    out.extend_from_slice(&b.to_be_bytes());
                }
                Constant::MethodHandle {
                    reference_kind,
                    reference_index,
                } => {
                    out.push(*reference_kind);
                    out.extend_from_slice(&reference_index.to_be_bytes());
                }
            }
        }
        Ok(())
    }
}
