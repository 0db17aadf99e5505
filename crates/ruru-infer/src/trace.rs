//! Tracing types for checker observability.
//!
//! These types capture step-by-step traces of subtyping/instantiation and
//! of the bidirectional judgments, so external tools can expose the
//! checker's reasoning process. All tracing is opt-in via
//! [`crate::Checker::enable_tracing`] — zero overhead when disabled, and
//! traces are advisory: they never influence checking.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Subtyping and instantiation trace
// ---------------------------------------------------------------------------

/// A single step in a subtyping or instantiation derivation.
#[derive(Debug, Clone, Serialize)]
pub struct SubtypeStep {
    pub step: usize,
    pub action: SubtypeAction,
    pub left: String,
    pub right: String,
    pub detail: String,
}

/// What action a subtyping/instantiation step took.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtypeAction {
    /// Both sides are identical atoms — no-op.
    Refl,
    /// Function types decompose, contravariant domain first.
    Arrow,
    /// Left universal eliminated with a fresh existential behind a marker.
    ForallLeft,
    /// Right universal introduced as a rigid variable.
    ForallRight,
    /// An existential solved directly to a monotype.
    Solve,
    /// A later existential redirected to an earlier one.
    Reach,
    /// An existential split into a function of two fresh existentials.
    SplitArrow,
    /// A universal body entered during instantiation.
    InstForall,
    /// No rule applies — derivation failed.
    Error,
}

// ---------------------------------------------------------------------------
// Bidirectional judgment trace
// ---------------------------------------------------------------------------

/// A single step in a check / infer / infer-application derivation.
#[derive(Debug, Clone, Serialize)]
pub struct InferStep {
    pub expr: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub rule: InferRule,
    pub detail: String,
}

/// Which bidirectional rule fired.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InferRule {
    CheckUnit,
    CheckLambda,
    CheckForall,
    Subsume,
    InferUnit,
    InferVar,
    InferAnnot,
    InferLambda,
    InferApply,
    InferLet,
    ApplyForall,
    ApplyExist,
    ApplyArrow,
}
