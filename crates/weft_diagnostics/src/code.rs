//! Diagnostic codes.
//!
//! Codes `E300`--`E307` are the fatal compile errors, one per [`ErrorKind`]
//! variant. `W300`--`W301` are non-fatal findings of state synthesis and
//! lowering. `E100`--`E101` cover loading the input tree.
//!
//! [`ErrorKind`]: crate::ErrorKind

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Errors, prefixed with `E`.
    Error,
    /// Warnings, prefixed with `W`.
    Warning,
}

impl Category {
    /// Returns the prefix letter.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
        }
    }
}

/// A category prefix plus a three-digit number, e.g. `E302`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// Category of the diagnostic.
    pub category: Category,
    /// Number within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

/// The input tree could not be read or decoded.
pub const E100: DiagnosticCode = DiagnosticCode::new(Category::Error, 100);

/// The input tree references something that does not exist (unknown name,
/// unknown function, unknown context clock).
pub const E101: DiagnosticCode = DiagnosticCode::new(Category::Error, 101);

/// A name was bound twice in the same scope.
pub const E300: DiagnosticCode = DiagnosticCode::new(Category::Error, 300);

/// An assignment used a mode the target object does not allow.
pub const E301: DiagnosticCode = DiagnosticCode::new(Category::Error, 301);

/// An object is driven by more than one context.
pub const E302: DiagnosticCode = DiagnosticCode::new(Category::Error, 302);

/// A construct cannot be classified or is not allowed where it appears.
pub const E303: DiagnosticCode = DiagnosticCode::new(Category::Error, 303);

/// Inlining does not terminate.
pub const E304: DiagnosticCode = DiagnosticCode::new(Category::Error, 304);

/// A suspension point appears in a concurrent context.
pub const E305: DiagnosticCode = DiagnosticCode::new(Category::Error, 305);

/// Duplicating a `continue` target would never reach a state transition.
pub const E306: DiagnosticCode = DiagnosticCode::new(Category::Error, 306);

/// A compile-time assertion is false.
pub const E307: DiagnosticCode = DiagnosticCode::new(Category::Error, 307);

/// A temporary is referenced in a state other than the one that computed it.
pub const W300: DiagnosticCode = DiagnosticCode::new(Category::Warning, 300);

/// An await waits on a condition that is constant false.
pub const W301: DiagnosticCode = DiagnosticCode::new(Category::Warning, 301);
