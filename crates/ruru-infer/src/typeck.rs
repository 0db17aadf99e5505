//! Bidirectional checking, subtyping, and existential instantiation.
//!
//! The six judgments here — `check`, `infer`, `infer_app`,
//! `instantiate_left`, `instantiate_right`, `subtype` — form one strongly
//! connected component and live in this single module. Each takes an input
//! context and returns an output context; the only other state is the
//! fresh-name supply owned by the [`Checker`].
//!
//! Elaboration is non-destructive: `check` and `infer` return freshly
//! built terms with their type slots filled, so the returned term is
//! independent of the input.

use ruru_ast::Expr;
use ruru_diag::{Category, Diagnostic, DiagnosticError};
use ruru_types::{Name, Type, free_exist_vars};

use crate::NameSupply;
use crate::context::{Context, Note};
use crate::trace::{InferRule, InferStep, SubtypeAction, SubtypeStep};

/// Prefix for generated existential names. Surface identifiers cannot
/// contain Greek letters, so generated names never collide with
/// user-chosen universal names.
const EXIST_PREFIX: &str = "α";

/// Runs the bidirectional judgments.
///
/// Owns the fresh-name supply for one top-level invocation, plus the
/// opt-in trace buffers. All solver state lives in the contexts threaded
/// through the judgments.
#[derive(Debug, Clone)]
pub struct Checker {
    names: NameSupply,
    tracing: bool,
    subtype_trace: Vec<SubtypeStep>,
    infer_trace: Vec<InferStep>,
}

impl Checker {
    pub fn new() -> Self {
        Self {
            names: NameSupply::new(),
            tracing: false,
            subtype_trace: Vec::new(),
            infer_trace: Vec::new(),
        }
    }

    /// Create a checker whose name counter starts at the given offset.
    pub fn with_name_offset(offset: u32) -> Self {
        Self {
            names: NameSupply::with_offset(offset),
            ..Self::new()
        }
    }

    /// Enable step-by-step tracing for observability tools.
    pub fn enable_tracing(&mut self) {
        self.tracing = true;
    }

    /// Whether tracing is currently enabled.
    pub fn is_tracing(&self) -> bool {
        self.tracing
    }

    /// Collected subtyping/instantiation steps.
    pub fn subtype_trace(&self) -> &[SubtypeStep] {
        &self.subtype_trace
    }

    /// Collected bidirectional judgment steps.
    pub fn infer_trace(&self) -> &[InferStep] {
        &self.infer_trace
    }

    fn fresh_exist(&mut self) -> Name {
        self.names.fresh(EXIST_PREFIX)
    }

    fn push_subtype_step(
        &mut self,
        action: SubtypeAction,
        left: &Type,
        right: &Type,
        detail: String,
    ) {
        if !self.tracing {
            return;
        }
        self.subtype_trace.push(SubtypeStep {
            step: self.subtype_trace.len(),
            action,
            left: left.to_string(),
            right: right.to_string(),
            detail,
        });
    }

    fn push_infer_step(&mut self, rule: InferRule, expr: &Expr, ty: &Type, detail: String) {
        if !self.tracing {
            return;
        }
        self.infer_trace.push(InferStep {
            expr: expr.to_string(),
            ty: ty.to_string(),
            rule,
            detail,
        });
    }

    // -----------------------------------------------------------------------
    // Top-level entry
    // -----------------------------------------------------------------------

    /// Infer a type for `expr` under the empty context and return the term
    /// with every type slot filled from the final output context.
    pub fn infer_expression(&mut self, expr: &Expr) -> Result<Expr, DiagnosticError> {
        let (_, elaborated, ctx) = self.infer(&Context::new(), expr)?;
        Ok(ctx.apply_expr(&elaborated))
    }

    // -----------------------------------------------------------------------
    // Subtyping
    // -----------------------------------------------------------------------

    /// Derive `sub <: sup` under `ctx`, returning the output context.
    ///
    /// When both sides are quantified, the right universal is introduced
    /// before the left one is eliminated: ∀R is invertible, so applying it
    /// eagerly loses nothing, while the opposite order would instantiate
    /// the left existential against a variable that is not yet in scope.
    pub fn subtype(
        &mut self,
        ctx: &Context,
        sub: &Type,
        sup: &Type,
    ) -> Result<Context, DiagnosticError> {
        match (sub, sup) {
            (Type::Unit, Type::Unit) => {
                self.push_subtype_step(SubtypeAction::Refl, sub, sup, "both unit".into());
                Ok(ctx.clone())
            }
            (Type::Var(a), Type::Var(b)) if a == b => {
                if !ctx.has_var(a) {
                    return Err(Diagnostic::error(
                        Category::IllFormedType,
                        format!("universal variable `{a}` is not in scope"),
                    )
                    .with_note(format!("in context {ctx}"))
                    .into());
                }
                self.push_subtype_step(SubtypeAction::Refl, sub, sup, "same universal".into());
                Ok(ctx.clone())
            }
            (Type::Exist(a), Type::Exist(b)) if a == b => {
                if !ctx.has_exist(a) {
                    return Err(Diagnostic::error(
                        Category::UnboundExistential,
                        format!("existential `{a}` is not in scope"),
                    )
                    .with_note(format!("in context {ctx}"))
                    .into());
                }
                self.push_subtype_step(SubtypeAction::Refl, sub, sup, "same existential".into());
                Ok(ctx.clone())
            }
            (Type::Fun(sub_dom, sub_cod), Type::Fun(sup_dom, sup_cod)) => {
                self.push_subtype_step(
                    SubtypeAction::Arrow,
                    sub,
                    sup,
                    "decompose arrows, domain contravariant".into(),
                );
                let theta = self.subtype(ctx, sup_dom, sub_dom)?;
                self.subtype(&theta, &theta.apply(sub_cod), &theta.apply(sup_cod))
            }
            (_, Type::Forall(alpha, body)) => {
                self.push_subtype_step(
                    SubtypeAction::ForallRight,
                    sub,
                    sup,
                    format!("introduce rigid `{alpha}`"),
                );
                let note = Note::Var(alpha.clone());
                let out = self.subtype(&ctx.extend(note.clone()), sub, body)?;
                Ok(out.peel(&note))
            }
            (Type::Forall(alpha, body), _) => {
                let alpha_hat = self.fresh_exist();
                self.push_subtype_step(
                    SubtypeAction::ForallLeft,
                    sub,
                    sup,
                    format!("open `{alpha}` as `{alpha_hat}` behind a marker"),
                );
                let marker = Note::Marker(alpha_hat.clone());
                let marked = ctx
                    .extend(marker.clone())
                    .extend(Note::Exist(alpha_hat.clone()));
                let opened =
                    body.replace(&Type::Var(alpha.clone()), &Type::Exist(alpha_hat));
                let out = self.subtype(&marked, &opened, sup)?;
                Ok(out.peel(&marker))
            }
            (Type::Exist(alpha), _)
                if ctx.has_exist(alpha) && !free_exist_vars(sup).contains(alpha) =>
            {
                self.instantiate_left(ctx, alpha, sup)
            }
            (_, Type::Exist(alpha))
                if ctx.has_exist(alpha) && !free_exist_vars(sub).contains(alpha) =>
            {
                self.instantiate_right(ctx, sub, alpha)
            }
            _ => {
                self.push_subtype_step(SubtypeAction::Error, sub, sup, "no rule applies".into());
                Err(Diagnostic::error(
                    Category::SubtypeMismatch,
                    format!("`{sub}` is not a subtype of `{sup}`"),
                )
                .with_note(format!("in context {ctx}"))
                .into())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Instantiation
    // -----------------------------------------------------------------------

    /// Solve `alpha :≤ ty`: instantiate the existential to a subtype of
    /// `ty`.
    pub fn instantiate_left(
        &mut self,
        ctx: &Context,
        alpha: &Name,
        ty: &Type,
    ) -> Result<Context, DiagnosticError> {
        if !ctx.has_exist(alpha) {
            return Err(unbound_existential(alpha, ctx));
        }
        // An existing monotype solution short-circuits the structural
        // cases below.
        if ty.is_monotype() {
            let (older, newer) = ctx.split(&Note::Exist(alpha.clone()))?;
            if older.well_formed(ty) {
                self.push_subtype_step(
                    SubtypeAction::Solve,
                    &Type::Exist(alpha.clone()),
                    ty,
                    format!("{alpha} := {ty}"),
                );
                return Ok(older
                    .extend(Note::Solved(alpha.clone(), ty.clone()))
                    .extend_many(newer));
            }
        }
        match ty {
            Type::Exist(beta) => self.instantiate_reach(ctx, alpha, beta),
            Type::Fun(domain, codomain) => {
                let (ctx, dom_hat, cod_hat) = self.split_into_arrow(ctx, alpha)?;
                self.push_subtype_step(
                    SubtypeAction::SplitArrow,
                    &Type::Exist(alpha.clone()),
                    ty,
                    format!("{alpha} := {dom_hat} → {cod_hat}"),
                );
                let theta = self.instantiate_right(&ctx, domain, &dom_hat)?;
                let applied = theta.apply(codomain);
                self.instantiate_left(&theta, &cod_hat, &applied)
            }
            Type::Forall(beta, body) => {
                self.push_subtype_step(
                    SubtypeAction::InstForall,
                    &Type::Exist(alpha.clone()),
                    ty,
                    format!("descend under `∀{beta}`"),
                );
                let note = Note::Var(beta.clone());
                let out = self.instantiate_left(&ctx.extend(note.clone()), alpha, body)?;
                Ok(out.peel(&note))
            }
            // Unit or a universal that is not in scope before `alpha`.
            _ => Err(ill_formed_before(alpha, ty, ctx)),
        }
    }

    /// Solve `ty :≤ alpha`: instantiate the existential to a supertype of
    /// `ty`. Mirror image of [`Checker::instantiate_left`].
    pub fn instantiate_right(
        &mut self,
        ctx: &Context,
        ty: &Type,
        alpha: &Name,
    ) -> Result<Context, DiagnosticError> {
        if !ctx.has_exist(alpha) {
            return Err(unbound_existential(alpha, ctx));
        }
        if ty.is_monotype() {
            let (older, newer) = ctx.split(&Note::Exist(alpha.clone()))?;
            if older.well_formed(ty) {
                self.push_subtype_step(
                    SubtypeAction::Solve,
                    ty,
                    &Type::Exist(alpha.clone()),
                    format!("{alpha} := {ty}"),
                );
                return Ok(older
                    .extend(Note::Solved(alpha.clone(), ty.clone()))
                    .extend_many(newer));
            }
        }
        match ty {
            Type::Exist(beta) => self.instantiate_reach(ctx, alpha, beta),
            Type::Fun(domain, codomain) => {
                let (ctx, dom_hat, cod_hat) = self.split_into_arrow(ctx, alpha)?;
                self.push_subtype_step(
                    SubtypeAction::SplitArrow,
                    ty,
                    &Type::Exist(alpha.clone()),
                    format!("{alpha} := {dom_hat} → {cod_hat}"),
                );
                let theta = self.instantiate_left(&ctx, &dom_hat, domain)?;
                let applied = theta.apply(codomain);
                self.instantiate_right(&theta, &applied, &cod_hat)
            }
            Type::Forall(beta, body) => {
                // The supertype side of a quantifier is opened with a fresh
                // existential behind a marker, not a rigid variable.
                let beta_hat = self.fresh_exist();
                self.push_subtype_step(
                    SubtypeAction::InstForall,
                    ty,
                    &Type::Exist(alpha.clone()),
                    format!("open `{beta}` as `{beta_hat}` behind a marker"),
                );
                let marker = Note::Marker(beta_hat.clone());
                let marked = ctx
                    .extend(marker.clone())
                    .extend(Note::Exist(beta_hat.clone()));
                let opened =
                    body.replace(&Type::Var(beta.clone()), &Type::Exist(beta_hat));
                let out = self.instantiate_right(&marked, &opened, alpha)?;
                Ok(out.peel(&marker))
            }
            _ => Err(ill_formed_before(alpha, ty, ctx)),
        }
    }

    /// Solve the newer of two existentials to point at the older one.
    fn instantiate_reach(
        &mut self,
        ctx: &Context,
        alpha: &Name,
        beta: &Name,
    ) -> Result<Context, DiagnosticError> {
        if !ctx.has_exist(beta) {
            return Err(unbound_existential(beta, ctx));
        }
        let (older, newer) = ctx.split(&Note::Exist(beta.clone()))?;
        if !older.contains(&Note::Exist(alpha.clone())) {
            return Err(Diagnostic::error(
                Category::InstantiationFailure,
                format!("cannot reach `{alpha}` from `{beta}`: `{alpha}` is not declared earlier"),
            )
            .with_note(format!("in context {ctx}"))
            .into());
        }
        self.push_subtype_step(
            SubtypeAction::Reach,
            &Type::Exist(alpha.clone()),
            &Type::Exist(beta.clone()),
            format!("{beta} := {alpha}"),
        );
        Ok(older
            .extend(Note::Solved(beta.clone(), Type::Exist(alpha.clone())))
            .extend_many(newer))
    }

    /// Replace the unsolved `alpha` note with two fresh existentials and a
    /// solution `alpha := dom_hat → cod_hat`. The fresh notes sit where
    /// `alpha` sat, so the solution only mentions older notes.
    fn split_into_arrow(
        &mut self,
        ctx: &Context,
        alpha: &Name,
    ) -> Result<(Context, Name, Name), DiagnosticError> {
        let (older, newer) = ctx.split(&Note::Exist(alpha.clone()))?;
        let dom_hat = self.fresh_exist();
        let cod_hat = self.fresh_exist();
        let solution = Type::fun(
            Type::Exist(dom_hat.clone()),
            Type::Exist(cod_hat.clone()),
        );
        let rebuilt = older
            .extend(Note::Exist(cod_hat.clone()))
            .extend(Note::Exist(dom_hat.clone()))
            .extend(Note::Solved(alpha.clone(), solution))
            .extend_many(newer);
        Ok((rebuilt, dom_hat, cod_hat))
    }

    // -----------------------------------------------------------------------
    // Bidirectional judgments
    // -----------------------------------------------------------------------

    /// Check `expr` against the expected type, returning the elaborated
    /// term and the output context.
    pub fn check(
        &mut self,
        ctx: &Context,
        expr: &Expr,
        expected: &Type,
    ) -> Result<(Expr, Context), DiagnosticError> {
        match (expr, expected) {
            (Expr::Unit, Type::Unit) => {
                self.push_infer_step(InferRule::CheckUnit, expr, expected, String::new());
                Ok((Expr::Unit, ctx.clone()))
            }
            (Expr::Lambda(param, _, body), Type::Fun(domain, codomain)) => {
                self.push_infer_step(
                    InferRule::CheckLambda,
                    expr,
                    expected,
                    format!("assume {param} : {domain}"),
                );
                let assump = Note::Assump(param.clone(), (**domain).clone());
                let (body2, out) = self.check(&ctx.extend(assump.clone()), body, codomain)?;
                let delta = out.peel(&assump);
                Ok((
                    Expr::Lambda(
                        param.clone(),
                        Some((**domain).clone()),
                        Box::new(body2),
                    ),
                    delta,
                ))
            }
            (_, Type::Forall(alpha, body)) => {
                self.push_infer_step(
                    InferRule::CheckForall,
                    expr,
                    expected,
                    format!("introduce rigid `{alpha}`"),
                );
                let note = Note::Var(alpha.clone());
                let (expr2, out) = self.check(&ctx.extend(note.clone()), expr, body)?;
                Ok((expr2, out.peel(&note)))
            }
            _ => {
                self.push_infer_step(InferRule::Subsume, expr, expected, String::new());
                let (found, expr2, theta) = self.infer(ctx, expr)?;
                let delta =
                    self.subtype(&theta, &theta.apply(&found), &theta.apply(expected))?;
                Ok((delta.apply_expr(&expr2), delta))
            }
        }
    }

    /// Infer a type for `expr`, returning the type, the elaborated term,
    /// and the output context.
    pub fn infer(
        &mut self,
        ctx: &Context,
        expr: &Expr,
    ) -> Result<(Type, Expr, Context), DiagnosticError> {
        match expr {
            Expr::Unit => {
                self.push_infer_step(InferRule::InferUnit, expr, &Type::Unit, String::new());
                Ok((Type::Unit, Expr::Unit, ctx.clone()))
            }
            Expr::Var(name, _) => match ctx.assump(name)? {
                Some(ty) => {
                    let ty = ty.clone();
                    self.push_infer_step(InferRule::InferVar, expr, &ty, String::new());
                    Ok((ty.clone(), Expr::Var(name.clone(), Some(ty)), ctx.clone()))
                }
                None => Err(Diagnostic::error(
                    Category::UnboundVariable,
                    format!("unbound variable `{name}`"),
                )
                .with_note(format!("in context {ctx}"))
                .into()),
            },
            Expr::Annot(body, ty) => {
                self.push_infer_step(InferRule::InferAnnot, expr, ty, String::new());
                let (body2, delta) = self.check(ctx, body, ty)?;
                Ok((ty.clone(), Expr::Annot(Box::new(body2), ty.clone()), delta))
            }
            Expr::Lambda(param, _, body) => {
                let dom_hat = self.fresh_exist();
                let cod_hat = self.fresh_exist();
                let fun_ty = Type::fun(
                    Type::Exist(dom_hat.clone()),
                    Type::Exist(cod_hat.clone()),
                );
                self.push_infer_step(
                    InferRule::InferLambda,
                    expr,
                    &fun_ty,
                    format!("assume {param} : {dom_hat}"),
                );
                let assump = Note::Assump(param.clone(), Type::Exist(dom_hat.clone()));
                let extended = ctx
                    .extend(Note::Exist(dom_hat.clone()))
                    .extend(Note::Exist(cod_hat.clone()))
                    .extend(assump.clone());
                let (body2, out) =
                    self.check(&extended, body, &Type::Exist(cod_hat.clone()))?;
                let delta = out.peel(&assump);
                Ok((
                    fun_ty,
                    Expr::Lambda(
                        param.clone(),
                        Some(Type::Exist(dom_hat)),
                        Box::new(body2),
                    ),
                    delta,
                ))
            }
            Expr::Apply(func, arg, _) => {
                let (func_ty, func2, theta) = self.infer(ctx, func)?;
                let applied = theta.apply(&func_ty);
                self.push_infer_step(
                    InferRule::InferApply,
                    expr,
                    &applied,
                    "apply function type".into(),
                );
                let (result_ty, arg2, delta) = self.infer_app(&theta, &applied, arg)?;
                Ok((
                    result_ty.clone(),
                    Expr::Apply(Box::new(func2), Box::new(arg2), Some(result_ty)),
                    delta,
                ))
            }
            Expr::Let(name, value, body) => {
                let (value_ty, value2, theta) = self.infer(ctx, value)?;
                let body_hat = self.fresh_exist();
                self.push_infer_step(
                    InferRule::InferLet,
                    expr,
                    &value_ty,
                    format!("assume {name} : {value_ty}, body checks against {body_hat}"),
                );
                let assump = Note::Assump(name.clone(), value_ty);
                let extended = theta
                    .extend(Note::Exist(body_hat.clone()))
                    .extend(assump.clone());
                let (body2, out) =
                    self.check(&extended, body, &Type::Exist(body_hat.clone()))?;
                let delta = out.peel(&assump);
                Ok((
                    Type::Exist(body_hat),
                    Expr::Let(name.clone(), Box::new(value2), Box::new(body2)),
                    delta,
                ))
            }
        }
    }

    /// Given a function of type `func_ty` applied to `arg`, synthesize the
    /// result type and elaborate the argument.
    pub fn infer_app(
        &mut self,
        ctx: &Context,
        func_ty: &Type,
        arg: &Expr,
    ) -> Result<(Type, Expr, Context), DiagnosticError> {
        match func_ty {
            Type::Forall(alpha, body) => {
                let alpha_hat = self.fresh_exist();
                self.push_infer_step(
                    InferRule::ApplyForall,
                    arg,
                    func_ty,
                    format!("open `{alpha}` as `{alpha_hat}`"),
                );
                let extended = ctx.extend(Note::Exist(alpha_hat.clone()));
                let opened =
                    body.replace(&Type::Var(alpha.clone()), &Type::Exist(alpha_hat));
                self.infer_app(&extended, &opened, arg)
            }
            Type::Exist(alpha) => {
                if !ctx.has_exist(alpha) {
                    return Err(unbound_existential(alpha, ctx));
                }
                let (ctx, dom_hat, cod_hat) = self.split_into_arrow(ctx, alpha)?;
                self.push_infer_step(
                    InferRule::ApplyExist,
                    arg,
                    func_ty,
                    format!("{alpha} := {dom_hat} → {cod_hat}"),
                );
                let (arg2, delta) = self.check(&ctx, arg, &Type::Exist(dom_hat))?;
                Ok((Type::Exist(cod_hat), arg2, delta))
            }
            Type::Fun(domain, codomain) => {
                self.push_infer_step(
                    InferRule::ApplyArrow,
                    arg,
                    func_ty,
                    format!("argument checks against {domain}"),
                );
                let (arg2, delta) = self.check(ctx, arg, domain)?;
                Ok(((**codomain).clone(), arg2, delta))
            }
            _ => Err(Diagnostic::error(
                Category::NotAFunction,
                format!("cannot apply a value of type `{func_ty}`"),
            )
            .with_note(format!("in context {ctx}"))
            .into()),
        }
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

/// Infer a type for `expr` and return the fully annotated term.
///
/// One-shot convenience over [`Checker::infer_expression`]: creates a
/// fresh checker, so generated names restart from `α1`.
pub fn infer_expression(expr: &Expr) -> Result<Expr, DiagnosticError> {
    Checker::new().infer_expression(expr)
}

fn unbound_existential(alpha: &Name, ctx: &Context) -> DiagnosticError {
    Diagnostic::error(
        Category::UnboundExistential,
        format!("existential `{alpha}` has no note in the context"),
    )
    .with_note(format!("in context {ctx}"))
    .into()
}

fn ill_formed_before(alpha: &Name, ty: &Type, ctx: &Context) -> DiagnosticError {
    Diagnostic::error(
        Category::IllFormedType,
        format!("`{ty}` is not well-formed before `{alpha}` in the context"),
    )
    .with_note(format!("in context {ctx}"))
    .into()
}
