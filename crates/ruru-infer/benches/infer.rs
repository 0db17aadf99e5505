use std::hint::black_box;

use divan::Bencher;
use ruru_ast::Expr;
use ruru_infer::infer_expression;
use ruru_types::Type;

fn main() {
    divan::main();
}

fn polyid() -> Type {
    Type::forall("a", Type::fun(Type::var("a"), Type::var("a")))
}

fn annotated_id() -> Expr {
    Expr::annot(Expr::lambda("x", Expr::var("x")), polyid())
}

/// `id (id (... (id ())))` nested to the given depth.
fn identity_chain(depth: usize) -> Expr {
    let mut term = Expr::Unit;
    for _ in 0..depth {
        term = Expr::apply(annotated_id(), term);
    }
    term
}

/// `let f1 = id in let f2 = id in ... fN ()` with distinct binder names.
fn let_chain(width: usize) -> Expr {
    let last = format!("f{width}");
    let mut term = Expr::apply(Expr::var(last), Expr::Unit);
    for index in (1..=width).rev() {
        term = Expr::let_in(format!("f{index}"), annotated_id(), term);
    }
    term
}

#[divan::bench(args = [8, 32, 128])]
fn deep_identity_chain(bencher: Bencher, depth: usize) {
    let term = identity_chain(depth);
    bencher.bench(|| {
        let out = infer_expression(black_box(&term)).expect("chain is well-typed");
        black_box(out)
    });
}

#[divan::bench(args = [8, 32, 128])]
fn wide_let_chain(bencher: Bencher, width: usize) {
    let term = let_chain(width);
    bencher.bench(|| {
        let out = infer_expression(black_box(&term)).expect("chain is well-typed");
        black_box(out)
    });
}
