//! Fuzz target for class-file parsing and relocation.
//!
//! Arbitrary bytes are parsed as a class file; anything that parses is
//! remapped with a fixed relocator and must serialize and parse again.
//!
//! Run with: cargo +nightly fuzz run class_file

#![no_main]

use jarshade::classfile::{ClassFile, ClassRemapper};
use jarshade::{Relocators, SimpleRelocator};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(class) = ClassFile::parse(data) else {
        return;
    };
    let _ = class.class_name();

    let Ok(relocator) = SimpleRelocator::new("com.foo") else {
        return;
    };
    let relocators = Relocators::new().with(relocator);
    let remapper = ClassRemapper::new(&relocators);

    // Malformed descriptors are reported as errors, never as panics.
    if let Ok(remapped) = remapper.remap_bytes(data) {
        let reparsed = ClassFile::parse(&remapped.bytes);
        assert!(reparsed.is_ok(), "remapped class does not parse: {:?}", reparsed.err());
    }
});
