//! Error reporting and diagnostics for Ruru.
//!
//! This crate provides structured diagnostics for the checker. Every
//! failure in `ruru-infer` is expressed as a [`Diagnostic`] with a stable
//! category and code, wrapped in a [`DiagnosticError`] so judgments can
//! propagate it with `?`.
//!
//! Diagnostics carry no source locations: the checker consumes terms that
//! were built programmatically, so localization belongs to whichever front
//! end produced them.

use std::fmt;

// ---------------------------------------------------------------------------
// Diagnostic severity and categories
// ---------------------------------------------------------------------------

/// How severe a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

/// Broad category for diagnostics. Used for filtering and grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// A term variable has no assumption in the context.
    UnboundVariable,
    /// An existential variable has no note in the context.
    UnboundExistential,
    /// A type failed well-formedness during instantiation.
    IllFormedType,
    /// No instantiation rule applies (scope violation or structural
    /// mismatch).
    InstantiationFailure,
    /// No subtyping rule applies.
    SubtypeMismatch,
    /// Application of a type that is neither quantifier, existential, nor
    /// function.
    NotAFunction,
    /// The ordered-context structure was violated. Always a checker bug,
    /// never a fault of the input term.
    ContextInvariant,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::UnboundVariable,
        Category::UnboundExistential,
        Category::IllFormedType,
        Category::InstantiationFailure,
        Category::SubtypeMismatch,
        Category::NotAFunction,
        Category::ContextInvariant,
    ];

    pub fn all() -> &'static [Category] {
        &Self::ALL
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::UnboundVariable => "unbound_variable",
            Category::UnboundExistential => "unbound_existential",
            Category::IllFormedType => "ill_formed_type",
            Category::InstantiationFailure => "instantiation_failure",
            Category::SubtypeMismatch => "subtype_mismatch",
            Category::NotAFunction => "not_a_function",
            Category::ContextInvariant => "context_invariant",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Category::UnboundVariable => "E0001",
            Category::UnboundExistential => "E0002",
            Category::IllFormedType => "E0003",
            Category::InstantiationFailure => "E0004",
            Category::SubtypeMismatch => "E0005",
            Category::NotAFunction => "E0006",
            Category::ContextInvariant => "E0007",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Category::UnboundVariable => "A referenced term variable has no typing assumption.",
            Category::UnboundExistential => {
                "An existential variable is referenced outside its scope."
            }
            Category::IllFormedType => {
                "A type mentions variables that are not in scope at its use site."
            }
            Category::InstantiationFailure => {
                "An existential variable cannot be solved against the target type."
            }
            Category::SubtypeMismatch => "One type is not a subtype of another.",
            Category::NotAFunction => "A non-function value is applied to an argument.",
            Category::ContextInvariant => {
                "An internal ordered-context invariant was violated; this is a checker bug."
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

/// A structured diagnostic message.
///
/// The primary message states what went wrong; notes carry surrounding
/// detail such as the context a judgment was running under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Stable diagnostic code (e.g. E0005).
    pub code: String,
    pub severity: Severity,
    pub category: Category,
    /// Primary message: what went wrong.
    pub message: String,
    /// Additional detail lines.
    pub notes: Vec<String>,
    /// Suggested fix, if any.
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn error(category: Category, message: impl Into<String>) -> Self {
        Self {
            code: category.code().to_string(),
            severity: Severity::Error,
            category,
            message: message.into(),
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{prefix}[{}]: {}", self.code, self.message)?;
        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }
        if let Some(help) = &self.help {
            write!(f, "\n  help: {help}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Error type for crates that produce diagnostics
// ---------------------------------------------------------------------------

/// Error type wrapping one or more diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .0.first().map(|d| d.to_string()).unwrap_or_default())]
pub struct DiagnosticError(pub Vec<Diagnostic>);

impl DiagnosticError {
    pub fn single(diag: Diagnostic) -> Self {
        Self(vec![diag])
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.0
    }

    /// The category of the first diagnostic. Convenient for matching on
    /// the failure kind in callers and tests.
    pub fn category(&self) -> Option<Category> {
        self.0.first().map(|d| d.category)
    }
}

impl From<Diagnostic> for DiagnosticError {
    fn from(diag: Diagnostic) -> Self {
        Self::single(diag)
    }
}
