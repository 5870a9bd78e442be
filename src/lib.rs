//! # jarshade
//!
//! A pure-Rust library for shading Java archives: merging several JARs into
//! one while relocating packages and merging well-known resources.
//!
//! A shading run reads its inputs in order and sends every entry down one
//! path:
//!
//! - **classes** are renamed when a [`Relocator`](relocation::Relocator)
//!   matches them, and every reference to a relocated name inside any class
//!   (constant pool, descriptors, generic signatures, annotations, string
//!   literals) is rewritten by the [`classfile`] codec;
//! - **resources** claimed by a [`ResourceTransformer`](transform::ResourceTransformer)
//!   are accumulated across inputs and written once at the end, merged or
//!   suppressed;
//! - **everything else** is copied once, the first archive in input order
//!   winning.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jarshade::relocation::SimpleRelocator;
//! use jarshade::transform::{ManifestResourceTransformer, ServicesResourceTransformer};
//! use jarshade::{Result, ShadeRequest, Shader};
//!
//! fn main() -> Result<()> {
//!     let request = ShadeRequest::new("target/app-all.jar")
//!         .inputs(["target/app.jar", "lib/guava.jar"])
//!         .relocator(
//!             SimpleRelocator::new("com.google.common")?
//!                 .shaded_pattern("app.shaded.guava")?,
//!         )
//!         .transformer(ServicesResourceTransformer::new())
//!         .transformer(ManifestResourceTransformer::new().main_class("com.example.Main"));
//!
//!     let result = Shader::default().shade(request)?;
//!     println!(
//!         "{} entries written, {} classes relocated",
//!         result.entries_written, result.classes_relocated
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Worklists
//!
//! With the `config` feature a run can be described as JSON and loaded
//! with [`ShadeConfig`]:
//!
//! ```rust,no_run
//! # #[cfg(feature = "config")]
//! # fn main() -> jarshade::Result<()> {
//! use jarshade::{ShadeConfig, Shader};
//!
//! let (request, options) = ShadeConfig::from_path("shade.json")?.into_request()?;
//! Shader::new(options).shade(request)?;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "config"))]
//! # fn main() {}
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `deflate` | Yes | Deflate compression of output entries |
//! | `parallel` | Yes | Concurrent read-ahead of input archives with rayon |
//! | `config` | Yes | JSON worklists with serde |
//! | `cli` | No | The `jarshade` command-line tool |
//!
//! ## Determinism
//!
//! For identical inputs and configuration the output is byte-identical:
//! entries are written in input order followed by transformer output in
//! configured order, merged resources are rendered deterministically and
//! [`WriteOptions`] stamps entries with a fixed timestamp by default.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod archive_path;
pub mod classfile;
pub mod error;
pub mod read;
pub mod relocation;
pub mod shade;
pub mod transform;
pub mod write;

#[cfg(feature = "config")]
#[cfg_attr(docsrs, doc(cfg(feature = "config")))]
pub mod config;

pub use archive_path::{ArchivePath, EntryKind};
pub use error::{Error, Result};

// Re-export the shading API at crate root for convenience
pub use shade::{
    DuplicateEntry, EntryAction, NoListener, ShadeListener, ShadeOptions, ShadeRequest,
    ShadeResult, Shader,
};

pub use read::{ArchiveEntry, JarReader, ReadLimits, SourceArchive};
pub use relocation::{Relocator, Relocators, SimpleRelocator};
pub use write::{Compression, JarWriter, OutputSink, WriteOptions, WriteResult};

#[cfg(feature = "config")]
pub use config::ShadeConfig;
