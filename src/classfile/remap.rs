//! Rewriting of class references against a relocator set.
//!
//! The remapper walks every place a class file can name another class:
//!
//! - `Class` constants (internal names and array descriptors)
//! - member, `NameAndType` and `MethodType` descriptors
//! - `Signature`, `LocalVariableTable` and `LocalVariableTypeTable` attributes
//! - annotations, parameter annotations, type annotations and annotation defaults
//! - record components and their attributes
//! - `Package` constants
//! - optionally, `String` constants spelling a relocatable name
//!
//! A `Utf8` constant can be shared by several reference sites of different
//! kinds (a string literal and a class name, say), so it is never edited in
//! place. Each changed site is repointed to an appended `Utf8` constant
//! instead, and existing indexes used by bytecode stay valid.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use super::constant_pool::{Constant, ConstantPool};
use super::reader::{ByteReader, patch_u16, read_u16_at};
use super::{AttributeInfo, ClassFile, descriptor, mutf8};
use crate::Result;
use crate::relocation::Relocators;

/// One name rewritten while remapping a class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelocationResult {
    /// The name before relocation (dotted for classes, as written otherwise).
    pub original_name: String,
    /// The name after relocation.
    pub new_name: String,
    /// `true` for class references, `false` for string literals and paths.
    pub is_class: bool,
}

/// The outcome of [`ClassRemapper::remap_bytes`].
#[derive(Debug)]
pub struct RemappedClass<'b> {
    /// The class bytes; borrowed from the input when nothing changed.
    pub bytes: Cow<'b, [u8]>,
    /// Every distinct rename that was applied, in discovery order.
    pub relocations: Vec<RelocationResult>,
}

impl RemappedClass<'_> {
    /// Returns `true` if any reference was rewritten.
    pub fn is_changed(&self) -> bool {
        matches!(self.bytes, Cow::Owned(_))
    }
}

/// Applies an ordered relocator set to class files.
///
/// ```
/// use jarshade::classfile::{ClassFile, ClassRemapper, ConstantPool};
/// use jarshade::relocation::{Relocators, SimpleRelocator};
///
/// let mut pool = ConstantPool::new();
/// let this_class = pool.push_class("com/foo/Bar")?;
/// let super_class = pool.push_class("com/foo/Base")?;
/// let bytes = ClassFile::new(pool, this_class, super_class).to_bytes()?;
///
/// let relocators = Relocators::new()
///     .with(SimpleRelocator::new("com.foo")?.shaded_pattern("shaded.com.foo")?);
/// let remapped = ClassRemapper::new(&relocators).remap_bytes(&bytes)?;
///
/// let class = ClassFile::parse(&remapped.bytes)?;
/// assert_eq!(class.class_name()?, "shaded/com/foo/Bar");
/// assert_eq!(class.super_class_name()?.as_deref(), Some("shaded/com/foo/Base"));
/// # Ok::<(), jarshade::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ClassRemapper<'r> {
    relocators: &'r Relocators,
    relocate_strings: bool,
}

impl<'r> ClassRemapper<'r> {
    /// Creates a remapper; string literals are relocated by default.
    pub fn new(relocators: &'r Relocators) -> Self {
        Self {
            relocators,
            relocate_strings: true,
        }
    }

    /// Sets whether `String` constants naming a relocated class or path are rewritten.
    pub fn relocate_string_literals(mut self, enabled: bool) -> Self {
        self.relocate_strings = enabled;
        self
    }

    /// Remaps class-file bytes.
    ///
    /// With no relocators configured the bytes are returned untouched
    /// without being parsed. Otherwise the class is parsed, rewritten, and
    /// serialized again only if something changed.
    pub fn remap_bytes<'b>(&self, bytes: &'b [u8]) -> Result<RemappedClass<'b>> {
        if self.relocators.is_empty() {
            return Ok(RemappedClass {
                bytes: Cow::Borrowed(bytes),
                relocations: Vec::new(),
            });
        }

        let mut class = ClassFile::parse(bytes)?;
        let relocations = self.remap(&mut class)?;
        let bytes = if relocations.is_empty() {
            Cow::Borrowed(bytes)
        } else {
            Cow::Owned(class.to_bytes()?)
        };
        Ok(RemappedClass { bytes, relocations })
    }

    /// Rewrites a parsed class in place and returns the renames applied.
    ///
    /// An empty result means the class was not modified.
    pub fn remap(&self, class: &mut ClassFile) -> Result<Vec<RelocationResult>> {
        let mut ctx = Context::new(self, &class.constant_pool);

        self.remap_constants(&mut ctx, &mut class.constant_pool)?;

        for member in class.fields.iter_mut().chain(class.methods.iter_mut()) {
            if let Some(index) =
                ctx.remap_utf8(&mut class.constant_pool, member.descriptor_index, Text::Descriptor)?
            {
                member.descriptor_index = index;
            }
            for attribute in &mut member.attributes {
                ctx.remap_attribute(&mut class.constant_pool, attribute)?;
            }
        }
        for attribute in &mut class.attributes {
            ctx.remap_attribute(&mut class.constant_pool, attribute)?;
        }

        Ok(ctx.results)
    }

    fn remap_constants(&self, ctx: &mut Context<'_, '_>, pool: &mut ConstantPool) -> Result<()> {
        // Constants appended while remapping are never revisited.
        let original_slots = pool.slot_count();
        for index in 1..original_slots {
            let index = index as u16;
            let constant = match pool.get(index) {
                Ok(Constant::Utf8(_)) | Err(_) => continue,
                Ok(constant) => constant.clone(),
            };
            let replacement = match constant {
                Constant::Class { name_index } => {
                    let kind = if pool.utf8(name_index)?.starts_with('[') {
                        Text::Descriptor
                    } else {
                        Text::InternalName
                    };
                    ctx.remap_utf8(pool, name_index, kind)?
                        .map(|name_index| Constant::Class { name_index })
                }
                Constant::NameAndType {
                    name_index,
                    descriptor_index,
                } => ctx
                    .remap_utf8(pool, descriptor_index, Text::Descriptor)?
                    .map(|descriptor_index| Constant::NameAndType {
                        name_index,
                        descriptor_index,
                    }),
                Constant::MethodType { descriptor_index } => ctx
                    .remap_utf8(pool, descriptor_index, Text::Descriptor)?
                    .map(|descriptor_index| Constant::MethodType { descriptor_index }),
                Constant::Package { name_index } => ctx
                    .remap_utf8(pool, name_index, Text::Package)?
                    .map(|name_index| Constant::Package { name_index }),
                Constant::String { string_index } if self.relocate_strings => ctx
                    .remap_utf8(pool, string_index, Text::Literal)?
                    .map(|string_index| Constant::String { string_index }),
                _ => None,
            };
            if let (Some(replacement), Some(slot)) = (replacement, pool.get_mut(index)) {
                *slot = replacement;
            }
        }
        Ok(())
    }
}

/// How the text of a `Utf8` constant is interpreted at one reference site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Text {
    InternalName,
    Descriptor,
    Signature,
    Package,
    Literal,
}

/// A `u16` inside an attribute body that points at a `Utf8` constant.
#[derive(Debug, Clone, Copy)]
struct Site {
    at: usize,
    kind: Text,
}

struct Context<'a, 'r> {
    remapper: &'a ClassRemapper<'r>,
    /// Existing and appended `Utf8` constants, by raw bytes.
    interned: HashMap<Vec<u8>, u16>,
    cache: HashMap<(u16, Text), Option<u16>>,
    seen: HashSet<RelocationResult>,
    results: Vec<RelocationResult>,
}

impl<'a, 'r> Context<'a, 'r> {
    fn new(remapper: &'a ClassRemapper<'r>, pool: &ConstantPool) -> Self {
        let mut interned = HashMap::new();
        for (index, constant) in pool.iter() {
            if let Constant::Utf8(bytes) = constant {
                interned.entry(bytes.clone()).or_insert(index);
            }
        }
        Self {
            remapper,
            interned,
            cache: HashMap::new(),
            seen: HashSet::new(),
            results: Vec::new(),
        }
    }

    fn record(&mut self, original_name: String, new_name: String, is_class: bool) {
        let result = RelocationResult {
            original_name,
            new_name,
            is_class,
        };
        if self.seen.insert(result.clone()) {
            self.results.push(result);
        }
    }

    /// Returns the index of a `Utf8` constant holding the remapped text,
    /// or `None` when the text is unchanged.
    fn remap_utf8(
        &mut self,
        pool: &mut ConstantPool,
        index: u16,
        kind: Text,
    ) -> Result<Option<u16>> {
        if let Some(cached) = self.cache.get(&(index, kind)) {
            return Ok(*cached);
        }

        let text = match pool.utf8(index) {
            Ok(text) => text.into_owned(),
            // Literals may hold lone surrogates; leave them alone.
            Err(_) if kind == Text::Literal => return Ok(None),
            Err(e) => return Err(e),
        };

        let new_text = match kind {
            Text::InternalName => self.relocate_internal(&text),
            Text::Descriptor | Text::Signature => {
                let mut renames = Vec::new();
                let relocators = self.remapper.relocators;
                let remapped = descriptor::remap(&text, &mut |name| {
                    let new_name = relocate_internal_name(relocators, name)?;
                    renames.push((name.replace('/', "."), new_name.replace('/', ".")));
                    Some(new_name)
                })?;
                for (from, to) in renames {
                    self.record(from, to, true);
                }
                remapped
            }
            Text::Package => {
                let new_name = self.remapper.relocators.relocate_path(&text);
                if let Some(new_name) = &new_name {
                    self.record(text.clone(), new_name.clone(), false);
                }
                new_name
            }
            Text::Literal => self.relocate_literal(&text),
        };

        let new_index = match new_text {
            Some(new_text) if new_text != text => Some(self.intern(pool, &new_text)?),
            _ => None,
        };
        self.cache.insert((index, kind), new_index);
        Ok(new_index)
    }

    fn relocate_internal(&mut self, name: &str) -> Option<String> {
        let new_name = relocate_internal_name(self.remapper.relocators, name)?;
        self.record(name.replace('/', "."), new_name.replace('/', "."), true);
        Some(new_name)
    }

    fn relocate_literal(&mut self, text: &str) -> Option<String> {
        if text.is_empty() || text.chars().any(char::is_whitespace) {
            return None;
        }
        let relocators = self.remapper.relocators;
        let new_text = if text.contains('/') {
            relocators.relocate_path(text)
        } else if text.contains('.') {
            relocators.relocate_class(text)
        } else {
            None
        }?;
        self.record(text.to_string(), new_text.clone(), false);
        Some(new_text)
    }

    fn intern(&mut self, pool: &mut ConstantPool, text: &str) -> Result<u16> {
        let bytes = mutf8::encode(text);
        if let Some(&index) = self.interned.get(&bytes) {
            return Ok(index);
        }
        let index = pool.push(Constant::Utf8(bytes.clone()))?;
        self.interned.insert(bytes, index);
        Ok(index)
    }

    fn remap_attribute(
        &mut self,
        pool: &mut ConstantPool,
        attribute: &mut AttributeInfo,
    ) -> Result<()> {
        let name = pool.utf8(attribute.name_index)?.into_owned();
        let mut sites = Vec::new();
        scan_attribute(
            pool,
            &name,
            &attribute.info,
            attribute.offset,
            0,
            &mut sites,
        )?;

        for site in sites {
            let Some(index) = read_u16_at(&attribute.info, site.at) else {
                continue;
            };
            if index == 0 {
                continue;
            }
            if let Some(new_index) = self.remap_utf8(pool, index, site.kind)? {
                patch_u16(&mut attribute.info, site.at, new_index);
            }
        }
        Ok(())
    }
}

fn relocate_internal_name(relocators: &Relocators, name: &str) -> Option<String> {
    relocators
        .relocate_class(&name.replace('/', "."))
        .map(|dotted| dotted.replace('.', "/"))
}

/// Records the `u16` at the reader position as a reference site.
fn site(r: &mut ByteReader<'_>, origin: usize, kind: Text, sites: &mut Vec<Site>) -> Result<()> {
    let at = origin + r.position();
    r.u16()?;
    sites.push(Site { at, kind });
    Ok(())
}

/// Collects the reference sites of one attribute body.
///
/// `base` is the absolute offset of `data` in the class file, used for
/// errors; `origin` is its position inside the outermost attribute body,
/// used for the recorded sites.
fn scan_attribute(
    pool: &ConstantPool,
    name: &str,
    data: &[u8],
    base: u64,
    origin: usize,
    sites: &mut Vec<Site>,
) -> Result<()> {
    let mut r = ByteReader::with_base(data, base);
    match name {
        "Signature" => site(&mut r, origin, Text::Signature, sites)?,
        "Code" => {
            r.skip(4)?; // max_stack, max_locals
            let code_length = r.u32()? as usize;
            r.skip(code_length)?;
            let exception_table_length = r.u16()? as usize;
            r.skip(exception_table_length * 8)?;
            scan_nested_attributes(pool, &mut r, base, origin, sites)?;
        }
        "LocalVariableTable" | "LocalVariableTypeTable" => {
            let kind = if name == "LocalVariableTable" {
                Text::Descriptor
            } else {
                Text::Signature
            };
            let count = r.u16()?;
            for _ in 0..count {
                r.skip(6)?; // start_pc, length, name_index
                site(&mut r, origin, kind, sites)?;
                r.skip(2)?; // index
            }
        }
        "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => {
            let count = r.u16()?;
            for _ in 0..count {
                scan_annotation(&mut r, origin, sites)?;
            }
        }
        "RuntimeVisibleParameterAnnotations" | "RuntimeInvisibleParameterAnnotations" => {
            let parameters = r.u8()?;
            for _ in 0..parameters {
                let count = r.u16()?;
                for _ in 0..count {
                    scan_annotation(&mut r, origin, sites)?;
                }
            }
        }
        "RuntimeVisibleTypeAnnotations" | "RuntimeInvisibleTypeAnnotations" => {
            let count = r.u16()?;
            for _ in 0..count {
                skip_type_annotation_target(&mut r)?;
                scan_annotation(&mut r, origin, sites)?;
            }
        }
        "AnnotationDefault" => scan_element_value(&mut r, origin, sites)?,
        "Record" => {
            let count = r.u16()?;
            for _ in 0..count {
                r.skip(2)?; // name_index
                site(&mut r, origin, Text::Descriptor, sites)?;
                scan_nested_attributes(pool, &mut r, base, origin, sites)?;
            }
        }
        _ => return Ok(()),
    }

    if !r.is_empty() {
        return Err(r.error(format!(
            "{} trailing bytes in {} attribute",
            r.remaining(),
            name
        )));
    }
    Ok(())
}

fn scan_nested_attributes(
    pool: &ConstantPool,
    r: &mut ByteReader<'_>,
    base: u64,
    origin: usize,
    sites: &mut Vec<Site>,
) -> Result<()> {
    let count = r.u16()?;
    for _ in 0..count {
        let name_index = r.u16()?;
        let len = r.u32()? as usize;
        let start = r.position();
        let info = r.bytes(len)?;
        let name = pool.utf8(name_index)?;
        scan_attribute(
            pool,
            &name,
            info,
            base + start as u64,
            origin + start,
            sites,
        )?;
    }
    Ok(())
}

fn scan_annotation(r: &mut ByteReader<'_>, origin: usize, sites: &mut Vec<Site>) -> Result<()> {
    site(r, origin, Text::Descriptor, sites)?; // type_index
    let pairs = r.u16()?;
    for _ in 0..pairs {
        r.skip(2)?; // element_name_index
        scan_element_value(r, origin, sites)?;
    }
    Ok(())
}

fn scan_element_value(r: &mut ByteReader<'_>, origin: usize, sites: &mut Vec<Site>) -> Result<()> {
    let offset = r.offset();
    match r.u8()? {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => r.skip(2)?,
        b'e' => {
            site(r, origin, Text::Descriptor, sites)?; // type_name_index
            r.skip(2)?; // const_name_index
        }
        b'c' => site(r, origin, Text::Descriptor, sites)?,
        b'@' => scan_annotation(r, origin, sites)?,
        b'[' => {
            let count = r.u16()?;
            for _ in 0..count {
                scan_element_value(r, origin, sites)?;
            }
        }
        other => {
            return Err(crate::Error::malformed_class(
                offset,
                format!("unknown element_value tag '{}'", other as char),
            ));
        }
    }
    Ok(())
}

fn skip_type_annotation_target(r: &mut ByteReader<'_>) -> Result<()> {
    let offset = r.offset();
    match r.u8()? {
        0x00 | 0x01 | 0x16 => r.skip(1)?,
        0x10..=0x12 | 0x17 | 0x42..=0x46 => r.skip(2)?,
        0x13..=0x15 => {}
        0x40 | 0x41 => {
            let table_length = r.u16()? as usize;
            r.skip(table_length * 6)?;
        }
        0x47..=0x4B => r.skip(3)?,
        other => {
            return Err(crate::Error::malformed_class(
                offset,
                format!("unknown type annotation target {:#04x}", other),
            ));
        }
    }
    let path_length = r.u8()? as usize;
    r.skip(path_length * 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::classfile::MemberInfo;
    use crate::relocation::SimpleRelocator;

    fn relocators() -> Relocators {
        Relocators::new().with(
            SimpleRelocator::new("com.foo")
                .unwrap()
                .shaded_pattern("shaded.com.foo")
                .unwrap()
                .exclude("com.foo.Keep")
                .unwrap(),
        )
    }

    fn attribute(pool: &mut ConstantPool, name: &str, info: Vec<u8>) -> AttributeInfo {
        AttributeInfo::new(pool.push_utf8(name).unwrap(), info)
    }

    fn utf8_at(pool: &ConstantPool, info: &[u8], at: usize) -> String {
        pool.utf8(read_u16_at(info, at).unwrap()).unwrap().into_owned()
    }

    #[test]
    fn test_shared_utf8_is_not_mutated() {
        let mut pool = ConstantPool::new();
        let name = pool.push_utf8("com/foo/Bar").unwrap();
        let class = pool.push(Constant::Class { name_index: name }).unwrap();
        // The same Utf8 backs a string literal.
        let literal = pool.push(Constant::String { string_index: name }).unwrap();
        let object = pool.push_class("java/lang/Object").unwrap();

        let mut class_file = ClassFile::new(pool, class, object);
        ClassRemapper::new(&relocators())
            .relocate_string_literals(false)
            .remap(&mut class_file)
            .unwrap();

        let pool = &class_file.constant_pool;
        assert_eq!(pool.class_name(class).unwrap(), "shaded/com/foo/Bar");
        assert_eq!(pool.utf8(name).unwrap(), "com/foo/Bar");
        match pool.get(literal).unwrap() {
            Constant::String { string_index } => assert_eq!(*string_index, name),
            other => panic!("unexpected constant {other:?}"),
        }
    }

    #[test]
    fn test_array_class_constant() {
        let mut pool = ConstantPool::new();
        let this_class = pool.push_class("app/Main").unwrap();
        let array = pool.push_class("[Lcom/foo/Bar;").unwrap();
        let object = pool.push_class("java/lang/Object").unwrap();
        let mut class = ClassFile::new(pool, this_class, object);

        let results = ClassRemapper::new(&relocators()).remap(&mut class).unwrap();
        assert_eq!(
            class.constant_pool.class_name(array).unwrap(),
            "[Lshaded/com/foo/Bar;"
        );
        assert_eq!(
            results,
            vec![RelocationResult {
                original_name: "com.foo.Bar".into(),
                new_name: "shaded.com.foo.Bar".into(),
                is_class: true,
            }]
        );
    }

    #[test]
    fn test_excluded_class_keeps_its_name() {
        let mut pool = ConstantPool::new();
        let this_class = pool.push_class("com/foo/Keep").unwrap();
        let object = pool.push_class("java/lang/Object").unwrap();
        let bytes = ClassFile::new(pool, this_class, object).to_bytes().unwrap();

        let remapped = ClassRemapper::new(&relocators()).remap_bytes(&bytes).unwrap();
        assert!(!remapped.is_changed());
        assert!(matches!(remapped.bytes, Cow::Borrowed(_)));
        assert!(remapped.relocations.is_empty());
    }

    #[test]
    fn test_no_relocators_skips_parsing() {
        let garbage = [1u8, 2, 3];
        let empty = Relocators::new();
        let remapped = ClassRemapper::new(&empty).remap_bytes(&garbage).unwrap();
        assert_eq!(&*remapped.bytes, &garbage);
    }

    #[test]
    fn test_member_descriptors_and_method_refs() {
        let mut pool = ConstantPool::new();
        let this_class = pool.push_class("app/Main").unwrap();
        let object = pool.push_class("java/lang/Object").unwrap();
        let method_ref = pool
            .push_method_ref("com/foo/Service", "create", "(Lcom/foo/Config;)Lcom/foo/Service;")
            .unwrap();
        let field_name = pool.push_utf8("service").unwrap();
        let field_desc = pool.push_utf8("Lcom/foo/Service;").unwrap();

        let mut class = ClassFile::new(pool, this_class, object);
        class.fields.push(MemberInfo {
            access_flags: 0,
            name_index: field_name,
            descriptor_index: field_desc,
            attributes: Vec::new(),
        });

        ClassRemapper::new(&relocators()).remap(&mut class).unwrap();
        let pool = &class.constant_pool;
        assert_eq!(
            pool.utf8(class.fields[0].descriptor_index).unwrap(),
            "Lshaded/com/foo/Service;"
        );
        let Constant::Methodref {
            class_index,
            name_and_type_index,
        } = *pool.get(method_ref).unwrap()
        else {
            panic!("expected Methodref");
        };
        assert_eq!(pool.class_name(class_index).unwrap(), "shaded/com/foo/Service");
        let Constant::NameAndType {
            descriptor_index, ..
        } = *pool.get(name_and_type_index).unwrap()
        else {
            panic!("expected NameAndType");
        };
        assert_eq!(
            pool.utf8(descriptor_index).unwrap(),
            "(Lshaded/com/foo/Config;)Lshaded/com/foo/Service;"
        );
    }

    #[test]
    fn test_string_literals() {
        let mut pool = ConstantPool::new();
        let this_class = pool.push_class("app/Main").unwrap();
        let object = pool.push_class("java/lang/Object").unwrap();
        let dotted = pool.push_string("com.foo.Impl").unwrap();
        let slashed = pool.push_string("com/foo/config.properties").unwrap();
        let sentence = pool.push_string("com.foo is missing").unwrap();
        let mut class = ClassFile::new(pool, this_class, object);

        let results = ClassRemapper::new(&relocators()).remap(&mut class).unwrap();
        let text = |index| match class.constant_pool.get(index).unwrap() {
            Constant::String { string_index } => {
                class.constant_pool.utf8(*string_index).unwrap().into_owned()
            }
            other => panic!("unexpected constant {other:?}"),
        };
        assert_eq!(text(dotted), "shaded.com.foo.Impl");
        assert_eq!(text(slashed), "shaded/com/foo/config.properties");
        assert_eq!(text(sentence), "com.foo is missing");
        assert!(results.iter().all(|r| !r.is_class));
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_code_local_variable_tables() {
        let mut pool = ConstantPool::new();
        let this_class = pool.push_class("app/Main").unwrap();
        let object = pool.push_class("java/lang/Object").unwrap();
        let var_name = pool.push_utf8("bar").unwrap();
        let var_desc = pool.push_utf8("Lcom/foo/Bar;").unwrap();
        let var_sig = pool.push_utf8("Ljava/util/List<Lcom/foo/Bar;>;").unwrap();
        let method_name = pool.push_utf8("run").unwrap();
        let method_desc = pool.push_utf8("()V").unwrap();
        let lvt_name = pool.push_utf8("LocalVariableTable").unwrap();
        let lvtt_name = pool.push_utf8("LocalVariableTypeTable").unwrap();
        let code_name = pool.push_utf8("Code").unwrap();

        let table = |desc: u16| {
            let mut t = vec![0, 1];
            t.extend_from_slice(&[0, 0, 0, 1]); // start_pc, length
            t.extend_from_slice(&var_name.to_be_bytes());
            t.extend_from_slice(&desc.to_be_bytes());
            t.extend_from_slice(&[0, 1]); // index
            t
        };
        let lvt = table(var_desc);
        let lvtt = table(var_sig);

        let mut code = Vec::new();
        code.extend_from_slice(&[0, 1, 0, 2]); // max_stack, max_locals
        code.extend_from_slice(&1u32.to_be_bytes());
        code.push(0xB1); // return
        code.extend_from_slice(&[0, 0]); // exception table
        code.extend_from_slice(&[0, 2]);
        for (name, body) in [(lvt_name, &lvt), (lvtt_name, &lvtt)] {
            code.extend_from_slice(&name.to_be_bytes());
            code.extend_from_slice(&(body.len() as u32).to_be_bytes());
            code.extend_from_slice(body);
        }

        let mut class = ClassFile::new(pool, this_class, object);
        class.methods.push(MemberInfo {
            access_flags: 0x0001,
            name_index: method_name,
            descriptor_index: method_desc,
            attributes: vec![AttributeInfo::new(code_name, code.clone())],
        });

        ClassRemapper::new(&relocators()).remap(&mut class).unwrap();
        let info = &class.methods[0].attributes[0].info;
        assert_eq!(info.len(), code.len());
        // Nested attributes start at 13; each has a 6-byte header and the
        // first entry's descriptor sits 8 bytes into the table.
        let lvt_desc_at = 13 + 6 + 8;
        let lvtt_desc_at = lvt_desc_at + 4 + 6 + 8;
        assert_eq!(
            utf8_at(&class.constant_pool, info, lvt_desc_at),
            "Lshaded/com/foo/Bar;"
        );
        assert_eq!(
            utf8_at(&class.constant_pool, info, lvtt_desc_at),
            "Ljava/util/List<Lshaded/com/foo/Bar;>;"
        );
    }

    #[test]
    fn test_annotations_and_defaults() {
        let mut pool = ConstantPool::new();
        let this_class = pool.push_class("app/Main").unwrap();
        let object = pool.push_class("java/lang/Object").unwrap();
        let ann_type = pool.push_utf8("Lcom/foo/Marker;").unwrap();
        let element = pool.push_utf8("value").unwrap();
        let enum_type = pool.push_utf8("Lcom/foo/Mode;").unwrap();
        let enum_const = pool.push_utf8("FAST").unwrap();
        let class_value = pool.push_utf8("Lcom/foo/Impl;").unwrap();

        // One annotation with an array of [enum, class] as its value.
        let mut annotations = vec![0, 1];
        annotations.extend_from_slice(&ann_type.to_be_bytes());
        annotations.extend_from_slice(&[0, 1]);
        annotations.extend_from_slice(&element.to_be_bytes());
        annotations.push(b'[');
        annotations.extend_from_slice(&[0, 2]);
        annotations.push(b'e');
        annotations.extend_from_slice(&enum_type.to_be_bytes());
        annotations.extend_from_slice(&enum_const.to_be_bytes());
        annotations.push(b'c');
        annotations.extend_from_slice(&class_value.to_be_bytes());

        let mut default = vec![b'c'];
        default.extend_from_slice(&class_value.to_be_bytes());

        let visible = attribute(&mut pool, "RuntimeVisibleAnnotations", annotations);
        let default = attribute(&mut pool, "AnnotationDefault", default);
        let mut class = ClassFile::new(pool, this_class, object);
        class.attributes = vec![visible, default];

        ClassRemapper::new(&relocators()).remap(&mut class).unwrap();
        let pool = &class.constant_pool;
        let info = &class.attributes[0].info;
        assert_eq!(utf8_at(pool, info, 2), "Lshaded/com/foo/Marker;");
        assert_eq!(utf8_at(pool, info, 12), "Lshaded/com/foo/Mode;");
        assert_eq!(utf8_at(pool, info, 14), "FAST");
        assert_eq!(utf8_at(pool, info, 17), "Lshaded/com/foo/Impl;");
        assert_eq!(
            utf8_at(pool, &class.attributes[1].info, 1),
            "Lshaded/com/foo/Impl;"
        );
    }

    #[test]
    fn test_type_annotation_with_localvar_target() {
        let mut pool = ConstantPool::new();
        let this_class = pool.push_class("app/Main").unwrap();
        let object = pool.push_class("java/lang/Object").unwrap();
        let ann_type = pool.push_utf8("Lcom/foo/NonNull;").unwrap();

        let mut info = vec![0, 1];
        info.push(0x40); // localvar target
        info.extend_from_slice(&[0, 1, 0, 0, 0, 4, 0, 1]);
        info.extend_from_slice(&[1, 3, 0]); // type_path of length 1
        info.extend_from_slice(&ann_type.to_be_bytes());
        info.extend_from_slice(&[0, 0]);

        let attr = attribute(&mut pool, "RuntimeInvisibleTypeAnnotations", info);
        let mut class = ClassFile::new(pool, this_class, object);
        class.attributes.push(attr);

        ClassRemapper::new(&relocators()).remap(&mut class).unwrap();
        assert_eq!(
            utf8_at(&class.constant_pool, &class.attributes[0].info, 14),
            "Lshaded/com/foo/NonNull;"
        );
    }

    #[test]
    fn test_record_components() {
        let mut pool = ConstantPool::new();
        let this_class = pool.push_class("app/Point").unwrap();
        let record = pool.push_class("java/lang/Record").unwrap();
        let comp_name = pool.push_utf8("origin").unwrap();
        let comp_desc = pool.push_utf8("Lcom/foo/Vec;").unwrap();
        let sig_name = pool.push_utf8("Signature").unwrap();
        let comp_sig = pool.push_utf8("Lcom/foo/Box<Lcom/foo/Vec;>;").unwrap();

        let mut info = vec![0, 1];
        info.extend_from_slice(&comp_name.to_be_bytes());
        info.extend_from_slice(&comp_desc.to_be_bytes());
        info.extend_from_slice(&[0, 1]);
        info.extend_from_slice(&sig_name.to_be_bytes());
        info.extend_from_slice(&2u32.to_be_bytes());
        info.extend_from_slice(&comp_sig.to_be_bytes());

        let attr = attribute(&mut pool, "Record", info);
        let mut class = ClassFile::new(pool, this_class, record);
        class.attributes.push(attr);

        ClassRemapper::new(&relocators()).remap(&mut class).unwrap();
        let pool = &class.constant_pool;
        let info = &class.attributes[0].info;
        assert_eq!(utf8_at(pool, info, 4), "Lshaded/com/foo/Vec;");
        assert_eq!(utf8_at(pool, info, 14), "Lshaded/com/foo/Box<Lshaded/com/foo/Vec;>;");
    }

    #[test]
    fn test_remapped_utf8_is_interned_once() {
        let mut pool = ConstantPool::new();
        let this_class = pool.push_class("app/Main").unwrap();
        let object = pool.push_class("java/lang/Object").unwrap();
        pool.push_field_ref("com/foo/A", "x", "Lcom/foo/Bar;").unwrap();
        pool.push_field_ref("com/foo/B", "y", "Lcom/foo/Bar;").unwrap();
        let mut class = ClassFile::new(pool, this_class, object);
        let before = class.constant_pool.slot_count();

        ClassRemapper::new(&relocators()).remap(&mut class).unwrap();
        let appended: Vec<_> = class
            .constant_pool
            .iter()
            .filter(|(i, _)| *i as usize >= before)
            .map(|(i, _)| class.constant_pool.utf8(i).unwrap().into_owned())
            .collect();
        assert_eq!(
            appended,
            vec!["shaded/com/foo/A", "Lshaded/com/foo/Bar;", "shaded/com/foo/B"]
        );
    }

    #[test]
    fn test_invalid_signature_is_fatal() {
        let mut pool = ConstantPool::new();
        let this_class = pool.push_class("app/Main").unwrap();
        let object = pool.push_class("java/lang/Object").unwrap();
        let bad = pool.push_utf8("Lcom/foo/Bar").unwrap();
        let mut sig = Vec::new();
        sig.extend_from_slice(&bad.to_be_bytes());
        let attr = attribute(&mut pool, "Signature", sig);
        let mut class = ClassFile::new(pool, this_class, object);
        class.attributes.push(attr);

        let err = ClassRemapper::new(&relocators()).remap(&mut class).unwrap_err();
        assert!(matches!(err, Error::InvalidDescriptor { .. }));
    }

    #[test]
    fn test_truncated_attribute_reports_absolute_offset() {
        let mut pool = ConstantPool::new();
        let this_class = pool.push_class("app/Main").unwrap();
        let object = pool.push_class("java/lang/Object").unwrap();
        let attr = attribute(&mut pool, "RuntimeVisibleAnnotations", vec![0, 1, 0]);
        let mut class = ClassFile::new(pool, this_class, object);
        class.attributes.push(attr);

        let bytes = class.to_bytes().unwrap();
        let err = ClassRemapper::new(&relocators()).remap_bytes(&bytes).unwrap_err();
        match err {
            Error::MalformedClass { offset, .. } => {
                // The annotation body starts three bytes before the end of the file.
                assert_eq!(offset, bytes.len() as u64 - 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
