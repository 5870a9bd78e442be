//! Package relocation rules.
//!
//! A [`Relocator`] decides whether a class name belongs to a package-rename
//! rule and computes its new name. Names come in two spellings:
//!
//! - dotted binary names (`com.foo.Bar`), used by [`Relocator::can_relocate_class`]
//! - slashed internal names and resource paths (`com/foo/Bar`), used by
//!   [`Relocator::can_relocate_path`]
//!
//! [`Relocators`] holds the configured rules in order. The first rule that
//! accepts a name wins and the order is never re-sorted.
//!
//! # Example
//!
//! ```
//! use jarshade::relocation::{Relocators, SimpleRelocator};
//!
//! let relocators = Relocators::new()
//!     .with(SimpleRelocator::new("com.foo")?.shaded_pattern("shaded.com.foo")?);
//!
//! assert_eq!(
//!     relocators.relocate_class("com.foo.Bar").as_deref(),
//!     Some("shaded.com.foo.Bar")
//! );
//! assert_eq!(relocators.relocate_class("org.other.Baz"), None);
//! # Ok::<(), jarshade::Error>(())
//! ```

mod simple;

pub use simple::SimpleRelocator;

use std::fmt;

/// A pure predicate + mapping pair for class names.
///
/// Implementations must be deterministic and free of side effects. The
/// shader only calls `relocate_*` after the matching `can_relocate_*`
/// returned `true`.
pub trait Relocator: fmt::Debug + Send + Sync {
    /// Returns `true` if the dotted class name falls under this rule.
    fn can_relocate_class(&self, class_name: &str) -> bool;

    /// Returns the relocated dotted class name.
    fn relocate_class(&self, class_name: &str) -> String;

    /// Returns `true` if the slashed name or resource path falls under this rule.
    fn can_relocate_path(&self, path: &str) -> bool;

    /// Returns the relocated slashed name or resource path.
    fn relocate_path(&self, path: &str) -> String;
}

/// An ordered list of relocators where the first match wins.
#[derive(Debug, Default)]
pub struct Relocators {
    rules: Vec<Box<dyn Relocator>>,
}

impl Relocators {
    /// Creates an empty set; nothing is relocated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule after the existing ones.
    pub fn with(mut self, relocator: impl Relocator + 'static) -> Self {
        self.push(Box::new(relocator));
        self
    }

    /// Appends a boxed rule after the existing ones.
    pub fn push(&mut self, relocator: Box<dyn Relocator>) {
        self.rules.push(relocator);
    }

    /// Returns the number of configured rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if no rule is configured.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates over the rules in configured order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Relocator> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Relocates a dotted class name with the first matching rule.
    ///
    /// Returns `None` when no rule accepts the name.
    pub fn relocate_class(&self, class_name: &str) -> Option<String> {
        self.rules
            .iter()
            .find(|r| r.can_relocate_class(class_name))
            .map(|r| r.relocate_class(class_name))
    }

    /// Relocates a slashed name or resource path with the first matching rule.
    pub fn relocate_path(&self, path: &str) -> Option<String> {
        self.rules
            .iter()
            .find(|r| r.can_relocate_path(path))
            .map(|r| r.relocate_path(path))
    }
}

impl From<Vec<Box<dyn Relocator>>> for Relocators {
    fn from(rules: Vec<Box<dyn Relocator>>) -> Self {
        Self { rules }
    }
}
