//! Severity and type registry.
//!
//! Diagnostic types are identified by a [`TypeKey`]. The registry maps each
//! key to an integer severity rank and a default [`Category`]. Severity
//! ordering is total (higher = more severe) and [`ERROR_THRESHOLD`] partitions
//! severities into "error-class" and "other", which is what the aggregator's
//! counts and the status summary are built on.
//!
//! Lookups fall back in two steps: a type registered without an explicit
//! severity inherits its category's default, and a type that was never
//! registered at all resolves through [`Category::Error`] — an unknown type is
//! deliberately treated as the most severe thing it could be rather than
//! silently dropped down the ranking.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Severity rank at and above which a diagnostic is error-class.
pub const ERROR_THRESHOLD: i32 = 100;

/// Default severity of [`Category::Error`].
pub const SEVERITY_ERROR: i32 = 100;

/// Default severity of [`Category::Warning`].
pub const SEVERITY_WARNING: i32 = 50;

/// Default severity of [`Category::Note`].
pub const SEVERITY_NOTE: i32 = 25;

/// Key identifying a diagnostic type (e.g. `"error"`, `"deprecation"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeKey(String);

impl TypeKey {
    /// Create a type key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The built-in error type.
    pub fn error() -> Self {
        Self::new("error")
    }

    /// The built-in warning type.
    pub fn warning() -> Self {
        Self::new("warning")
    }

    /// The built-in note type.
    pub fn note() -> Self {
        Self::new("note")
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Default category a diagnostic type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Definite problems.
    Error,
    /// Potential problems worth reviewing.
    Warning,
    /// Informational notes.
    Note,
}

impl Category {
    /// The severity a type of this category gets when none was registered.
    pub fn default_severity(self) -> i32 {
        match self {
            Category::Error => SEVERITY_ERROR,
            Category::Warning => SEVERITY_WARNING,
            Category::Note => SEVERITY_NOTE,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Error => f.write_str("error"),
            Category::Warning => f.write_str("warning"),
            Category::Note => f.write_str("note"),
        }
    }
}

#[derive(Debug, Clone)]
struct TypeEntry {
    severity: Option<i32>,
    category: Category,
}

/// Process-wide, read-only-after-configuration mapping from diagnostic type
/// to severity and category.
///
/// Sessions share one registry (typically behind an `Arc`); it has no
/// per-document lifecycle.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<TypeKey, TypeEntry>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in `error` / `warning` / `note` types.
    pub fn with_builtin_types() -> Self {
        let mut registry = Self::new();
        registry.register_type(TypeKey::error(), Some(SEVERITY_ERROR), Category::Error);
        registry.register_type(TypeKey::warning(), Some(SEVERITY_WARNING), Category::Warning);
        registry.register_type(TypeKey::note(), Some(SEVERITY_NOTE), Category::Note);
        registry
    }

    /// Register (or replace) a diagnostic type.
    ///
    /// Passing `None` for `severity` makes the type inherit its category's
    /// default severity.
    pub fn register_type(&mut self, key: TypeKey, severity: Option<i32>, category: Category) {
        self.types.insert(key, TypeEntry { severity, category });
    }

    /// Resolve the severity of a type.
    ///
    /// Falls back type → category default → [`Category::Error`] default for
    /// types that were never registered.
    pub fn severity(&self, key: &TypeKey) -> i32 {
        match self.types.get(key) {
            Some(entry) => entry
                .severity
                .unwrap_or_else(|| entry.category.default_severity()),
            None => Category::Error.default_severity(),
        }
    }

    /// Resolve the category of a type (unregistered types are error-class).
    pub fn category(&self, key: &TypeKey) -> Category {
        self.types
            .get(key)
            .map(|entry| entry.category)
            .unwrap_or(Category::Error)
    }

    /// Returns `true` if the type's severity is at or above [`ERROR_THRESHOLD`].
    pub fn is_error(&self, key: &TypeKey) -> bool {
        self.severity(key) >= ERROR_THRESHOLD
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
