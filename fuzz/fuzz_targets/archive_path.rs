//! Fuzz target for ArchivePath::new with arbitrary string input.
//!
//! Run with: cargo +nightly fuzz run archive_path
//!
//! Properties checked on every accepted path:
//! - no `.` or `..` segment
//! - not absolute, no empty segment
//! - no NUL byte
//! - the multi-release split reassembles the path

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(path_str) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(path) = jarshade::ArchivePath::new(path_str) else {
        return;
    };
    let normalized = path.as_str();

    assert!(
        normalized
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != ".."),
        "bad segment accepted: {:?}",
        normalized
    );
    assert!(!normalized.starts_with('/'), "absolute path accepted: {:?}", normalized);
    assert!(!normalized.contains('\0'), "NUL byte accepted: {:?}", normalized);

    let (release, rest) = path.split_release();
    assert_eq!(format!("{}{}", release, rest), normalized);

    let _ = path.kind();
    let _ = path.class_name();
});
