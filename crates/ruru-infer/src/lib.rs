//! Bidirectional type checking for Ruru.
//!
//! This crate implements:
//! - Ordered typing contexts whose note order encodes dependency and scope
//! - Existential instantiation with sub-existential creation
//! - Subtyping for higher-rank polymorphism via scope markers
//! - Mutually recursive check / infer / infer-application judgments
//!
//! The algorithm follows Dunfield and Krishnaswami's "Complete and Easy
//! Bidirectional Typechecking for Higher-Rank Polymorphism": every judgment
//! takes an input context and returns an output context, and elaboration
//! rebuilds terms with their type slots filled from the final context.

pub mod context;
pub mod trace;
pub mod typeck;

use ruru_types::Name;

// Re-export for convenience.
pub use context::{Context, Note};
pub use ruru_diag::{Category, Diagnostic, DiagnosticError, Severity};
pub use typeck::{Checker, infer_expression};

// ---------------------------------------------------------------------------
// Fresh-name supply
// ---------------------------------------------------------------------------

/// Generates fresh, globally unique names for existential variables.
///
/// A single supply is owned by one [`Checker`] and threaded through every
/// judgment of one top-level invocation, so no two generated names ever
/// collide. The counter starts at 1; the first allocated name therefore
/// ends in `1`.
#[derive(Debug, Clone)]
pub struct NameSupply {
    next: u32,
}

impl NameSupply {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Create a supply with an explicit starting counter (for tests that
    /// need names disjoint from a previous supply's output).
    pub fn with_offset(next: u32) -> Self {
        Self { next }
    }

    /// Allocate the next name: `prefix` followed by the counter value.
    pub fn fresh(&mut self, prefix: &str) -> Name {
        let name = Name::new(format!("{prefix}{}", self.next));
        self.next += 1;
        name
    }
}

impl Default for NameSupply {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod typeck_tests;
