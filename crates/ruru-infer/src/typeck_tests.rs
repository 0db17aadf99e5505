//! Tests for bidirectional checking and inference.
//!
//! Each test constructs a term by hand and checks the elaborated result.
//! This is verbose but precise — we know exactly what we're testing.
//! Generated existential names are deterministic (`α1`, `α2`, ...) because
//! every `infer_expression` call owns a fresh supply.

use ruru_ast::Expr;
use ruru_types::{Name, Type};

use crate::context::{Context, Note};
use crate::typeck::{Checker, infer_expression};
use crate::{Category, DiagnosticError};

// ---------------------------------------------------------------------------
// Helpers for constructing terms and types
// ---------------------------------------------------------------------------

fn n(s: &str) -> Name {
    Name::new(s)
}

fn uvar(s: &str) -> Type {
    Type::var(s)
}

fn evar(s: &str) -> Type {
    Type::exist(s)
}

fn fun(domain: Type, codomain: Type) -> Type {
    Type::fun(domain, codomain)
}

fn forall(name: &str, body: Type) -> Type {
    Type::forall(name, body)
}

/// The polymorphic identity scheme `∀a. a → a`.
fn polyid() -> Type {
    forall("a", fun(uvar("a"), uvar("a")))
}

/// `(\x. x) : ∀a. a → a`.
fn annotated_id() -> Expr {
    Expr::annot(Expr::lambda("x", Expr::var("x")), polyid())
}

fn category(err: &DiagnosticError) -> Category {
    err.category().expect("error carries at least one diagnostic")
}

// ---------------------------------------------------------------------------
// Inference scenarios
// ---------------------------------------------------------------------------

#[test]
fn unit_infers_unit_under_empty_context() {
    let out = infer_expression(&Expr::Unit).unwrap();
    assert_eq!(out, Expr::Unit);
    assert_eq!(out.ty(), Some(Type::Unit));
}

#[test]
fn annotated_identity_elaborates_rigid_parameter() {
    let out = infer_expression(&annotated_id()).unwrap();

    assert_eq!(out.ty(), Some(polyid()));
    let Expr::Annot(body, declared) = out else {
        panic!("elaboration preserves the annotation node");
    };
    assert_eq!(declared, polyid());
    let Expr::Lambda(param, param_ty, body) = *body else {
        panic!("annotated body stays a lambda");
    };
    assert_eq!(param, n("x"));
    assert_eq!(param_ty, Some(uvar("a")));
    assert_eq!(*body, Expr::Var(n("x"), Some(uvar("a"))));
}

#[test]
fn bare_identity_infers_existential_arrow() {
    let out = infer_expression(&Expr::lambda("x", Expr::var("x"))).unwrap();

    // The codomain existential is solved to the domain one; the domain
    // stays free because nothing constrains it.
    assert_eq!(out.ty(), Some(fun(evar("α1"), evar("α1"))));
    let Expr::Lambda(_, param_ty, body) = out else {
        panic!("expected a lambda");
    };
    assert_eq!(param_ty, Some(evar("α1")));
    assert_eq!(*body, Expr::Var(n("x"), Some(evar("α1"))));
}

#[test]
fn identity_applied_to_unit_yields_unit() {
    let term = Expr::apply(annotated_id(), Expr::Unit);
    let out = infer_expression(&term).unwrap();

    assert_eq!(out.ty(), Some(Type::Unit));
    let Expr::Apply(_, _, slot) = &out else {
        panic!("expected an application");
    };
    assert_eq!(slot, &Some(Type::Unit));
}

#[test]
fn let_bound_identity_stays_polymorphic_in_the_body() {
    let term = Expr::let_in(
        "id",
        annotated_id(),
        Expr::apply(Expr::var("id"), Expr::Unit),
    );
    let out = infer_expression(&term).unwrap();

    assert_eq!(out.ty(), Some(Type::Unit));
    let Expr::Let(_, _, body) = &out else {
        panic!("expected a let-binding");
    };
    let Expr::Apply(func, _, slot) = body.as_ref() else {
        panic!("let body is an application");
    };
    assert_eq!(slot, &Some(Type::Unit));
    assert_eq!(func.as_ref(), &Expr::Var(n("id"), Some(polyid())));
}

#[test]
fn higher_rank_argument_is_accepted() {
    // (\f. f ()) : (∀a. a → a) → ()  applied to the annotated identity.
    let consumer = Expr::annot(
        Expr::lambda("f", Expr::apply(Expr::var("f"), Expr::Unit)),
        fun(polyid(), Type::Unit),
    );
    let term = Expr::apply(consumer, annotated_id());
    let out = infer_expression(&term).unwrap();
    assert_eq!(out.ty(), Some(Type::Unit));
}

#[test]
fn identity_annotated_unit_is_a_subtype_mismatch() {
    let term = Expr::annot(Expr::lambda("x", Expr::var("x")), Type::Unit);
    let err = infer_expression(&term).unwrap_err();
    assert_eq!(category(&err), Category::SubtypeMismatch);
}

#[test]
fn unbound_variable_is_reported() {
    let err = infer_expression(&Expr::var("ghost")).unwrap_err();
    assert_eq!(category(&err), Category::UnboundVariable);
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn applying_unit_is_not_a_function() {
    let term = Expr::apply(Expr::Unit, Expr::Unit);
    let err = infer_expression(&term).unwrap_err();
    assert_eq!(category(&err), Category::NotAFunction);
}

#[test]
fn lambda_body_sees_the_parameter() {
    // \x. let y = x in y  — the assumption flows through the let.
    let term = Expr::lambda("x", Expr::let_in("y", Expr::var("x"), Expr::var("y")));
    let out = infer_expression(&term).unwrap();
    assert_eq!(out.ty(), Some(fun(evar("α1"), evar("α1"))));
}

#[test]
fn same_name_rebinding_requires_alpha_renamed_input() {
    // \x. let x = () in x  — two live assumptions for the same name
    // violate the ordered-context discipline; input must be alpha-renamed.
    let term = Expr::lambda("x", Expr::let_in("x", Expr::Unit, Expr::var("x")));
    let err = infer_expression(&term).unwrap_err();
    assert_eq!(category(&err), Category::ContextInvariant);
}

#[test]
fn annotation_checks_the_body_against_the_declared_type() {
    // (\x. ()) : () → ()
    let term = Expr::annot(
        Expr::lambda("x", Expr::Unit),
        fun(Type::Unit, Type::Unit),
    );
    let out = infer_expression(&term).unwrap();
    assert_eq!(out.ty(), Some(fun(Type::Unit, Type::Unit)));
}

#[test]
fn nested_identity_applications_collapse_to_unit() {
    // id (id ())
    let term = Expr::apply(annotated_id(), Expr::apply(annotated_id(), Expr::Unit));
    let out = infer_expression(&term).unwrap();
    assert_eq!(out.ty(), Some(Type::Unit));
}

// ---------------------------------------------------------------------------
// Idempotence
// ---------------------------------------------------------------------------

#[test]
fn reinference_of_an_annotated_term_is_stable() {
    let terms = [
        Expr::Unit,
        annotated_id(),
        Expr::lambda("x", Expr::var("x")),
        Expr::apply(annotated_id(), Expr::Unit),
        Expr::let_in(
            "id",
            annotated_id(),
            Expr::apply(Expr::var("id"), Expr::Unit),
        ),
    ];
    for term in terms {
        let once = infer_expression(&term).unwrap();
        let twice = infer_expression(&once).unwrap();
        assert_eq!(once, twice, "re-inference changed {term}");
    }
}

// ---------------------------------------------------------------------------
// Judgment-level behavior
// ---------------------------------------------------------------------------

#[test]
fn check_fills_slots_consistently_with_the_expected_type() {
    let mut checker = Checker::new();
    let ctx = Context::new();
    let (elaborated, delta) = checker
        .check(&ctx, &Expr::lambda("x", Expr::var("x")), &polyid())
        .unwrap();
    assert_eq!(elaborated.ty(), Some(delta.apply(&fun(uvar("a"), uvar("a")))));
}

#[test]
fn subtype_rejects_out_of_scope_existential_even_with_equal_names() {
    let mut checker = Checker::new();
    let ctx = Context::new();
    let err = checker
        .subtype(&ctx, &evar("α9"), &evar("α9"))
        .unwrap_err();
    assert_eq!(category(&err), Category::UnboundExistential);
}

#[test]
fn subtype_polymorphic_identity_with_itself() {
    let mut checker = Checker::new();
    let out = checker
        .subtype(&Context::new(), &polyid(), &polyid())
        .unwrap();
    assert!(out.is_empty(), "markers and skolems are peeled: {out}");
}

#[test]
fn subtype_instantiates_left_existential_to_unit() {
    let mut checker = Checker::new();
    let ctx: Context = [Note::Exist(n("α1"))].into_iter().collect();
    let out = checker.subtype(&ctx, &evar("α1"), &Type::Unit).unwrap();
    assert_eq!(out.solution(&n("α1")).unwrap(), Some(&Type::Unit));
}

#[test]
fn subtype_polytype_is_not_a_subtype_of_its_instance_reversed() {
    // () → () <: ∀a. a → a must fail: the skolem escapes.
    let mut checker = Checker::new();
    let err = checker
        .subtype(&Context::new(), &fun(Type::Unit, Type::Unit), &polyid())
        .unwrap_err();
    assert_eq!(category(&err), Category::SubtypeMismatch);
}

#[test]
fn subtype_polytype_to_instance_succeeds() {
    // ∀a. a → a <: () → ()
    let mut checker = Checker::new();
    let out = checker
        .subtype(&Context::new(), &polyid(), &fun(Type::Unit, Type::Unit))
        .unwrap();
    assert!(out.is_empty());
}

#[test]
fn instantiation_reaches_the_older_existential() {
    let mut checker = Checker::new();
    let ctx: Context = [Note::Exist(n("α1")), Note::Exist(n("α2"))]
        .into_iter()
        .collect();
    let out = checker
        .instantiate_left(&ctx, &n("α1"), &evar("α2"))
        .unwrap();
    // α1 is older, so α2 is redirected to it, not the other way around.
    assert_eq!(out.solution(&n("α2")).unwrap(), Some(&evar("α1")));
    assert_eq!(out.solution(&n("α1")).unwrap(), None);
}

#[test]
fn instantiation_splits_an_existential_into_an_arrow() {
    let mut checker = Checker::new();
    let ctx: Context = [Note::Exist(n("α1"))].into_iter().collect();
    let out = checker
        .instantiate_left(&ctx, &n("α1"), &fun(Type::Unit, Type::Unit))
        .unwrap();
    assert_eq!(out.apply(&evar("α1")), fun(Type::Unit, Type::Unit));
}

#[test]
fn occurs_violation_is_a_subtype_mismatch() {
    // α1 <: α1 → () has no applicable rule: the occurs check blocks both
    // instantiation directions.
    let mut checker = Checker::new();
    let ctx: Context = [Note::Exist(n("α1"))].into_iter().collect();
    let err = checker
        .subtype(&ctx, &evar("α1"), &fun(evar("α1"), Type::Unit))
        .unwrap_err();
    assert_eq!(category(&err), Category::SubtypeMismatch);
}

#[test]
fn instantiation_against_missing_existential_fails() {
    let mut checker = Checker::new();
    let err = checker
        .instantiate_left(&Context::new(), &n("α1"), &Type::Unit)
        .unwrap_err();
    assert_eq!(category(&err), Category::UnboundExistential);
}

#[test]
fn instantiation_rejects_a_skolem_declared_after_the_existential() {
    let mut checker = Checker::new();
    let ctx: Context = [Note::Exist(n("α1")), Note::Var(n("b"))]
        .into_iter()
        .collect();
    let err = checker
        .instantiate_left(&ctx, &n("α1"), &uvar("b"))
        .unwrap_err();
    assert_eq!(category(&err), Category::IllFormedType);
}

#[test]
fn infer_app_solves_an_existential_function() {
    let mut checker = Checker::with_name_offset(10);
    let ctx: Context = [Note::Exist(n("α1"))].into_iter().collect();
    let (result_ty, _, delta) = checker
        .infer_app(&ctx, &evar("α1"), &Expr::Unit)
        .unwrap();
    // α1 was split into α10 → α11 and the argument solved the domain.
    assert_eq!(delta.apply(&evar("α1")), fun(Type::Unit, delta.apply(&result_ty)));
    assert_eq!(delta.apply(&result_ty), evar("α11"));
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

#[test]
fn tracing_is_off_by_default_and_advisory() {
    let term = Expr::apply(annotated_id(), Expr::Unit);

    let mut silent = Checker::new();
    let untraced = silent.infer_expression(&term).unwrap();
    assert!(silent.infer_trace().is_empty());
    assert!(silent.subtype_trace().is_empty());

    let mut traced = Checker::new();
    traced.enable_tracing();
    assert!(traced.is_tracing());
    let out = traced.infer_expression(&term).unwrap();
    assert_eq!(out, untraced, "tracing must not affect elaboration");
    assert!(!traced.infer_trace().is_empty());
    assert!(!traced.subtype_trace().is_empty());
}

#[test]
fn trace_steps_serialize_for_external_tools() {
    let mut checker = Checker::new();
    checker.enable_tracing();
    checker.infer_expression(&Expr::apply(annotated_id(), Expr::Unit)).unwrap();

    let json = serde_json::to_string(checker.subtype_trace());
    assert!(json.is_ok());
}
