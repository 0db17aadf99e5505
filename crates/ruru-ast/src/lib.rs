//! Term representation for Ruru.
//!
//! Terms are the input and output of the checker in `ruru-infer`. Every
//! node that can carry a type does so through an `Option<Type>` slot:
//! `None` on input, populated by elaboration on output. Elaboration never
//! mutates a term; it builds new nodes with filled slots.
//!
//! There is no parser here. Terms are constructed programmatically by
//! whatever front end feeds the checker.

use std::fmt;

use ruru_types::{Name, Type};

/// A term of the object language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// The unit value `()`.
    Unit,
    /// A variable occurrence. The slot holds the type of the binding site.
    Var(Name, Option<Type>),
    /// An abstraction `\x. body`. The slot holds the parameter type.
    Lambda(Name, Option<Type>, Box<Expr>),
    /// An application `func arg`. The slot holds the result type.
    Apply(Box<Expr>, Box<Expr>, Option<Type>),
    /// An explicit annotation `e : T`. The declared type is user-written,
    /// not a slot.
    Annot(Box<Expr>, Type),
    /// A let-binding `let x = value in body`.
    Let(Name, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(Name::new(name), None)
    }

    pub fn lambda(param: impl Into<String>, body: Expr) -> Self {
        Expr::Lambda(Name::new(param), None, Box::new(body))
    }

    pub fn apply(func: Expr, arg: Expr) -> Self {
        Expr::Apply(Box::new(func), Box::new(arg), None)
    }

    pub fn annot(body: Expr, ty: Type) -> Self {
        Expr::Annot(Box::new(body), ty)
    }

    pub fn let_in(name: impl Into<String>, value: Expr, body: Expr) -> Self {
        Expr::Let(Name::new(name), Box::new(value), Box::new(body))
    }

    /// The type carried by an elaborated term, if every slot on the spine
    /// has been filled.
    ///
    /// For `Lambda` the function type is assembled from the parameter slot
    /// and the body; for `Let` the binding is transparent and the body's
    /// type is the term's type.
    pub fn ty(&self) -> Option<Type> {
        match self {
            Expr::Unit => Some(Type::Unit),
            Expr::Var(_, slot) | Expr::Apply(_, _, slot) => slot.clone(),
            Expr::Lambda(_, slot, body) => {
                Some(Type::fun(slot.clone()?, body.ty()?))
            }
            Expr::Annot(_, ty) => Some(ty.clone()),
            Expr::Let(_, _, body) => body.ty(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Unit => write!(f, "()"),
            Expr::Var(name, _) => write!(f, "{name}"),
            Expr::Lambda(param, _, body) => write!(f, "\\{param}. {body}"),
            Expr::Apply(func, arg, _) => {
                match func.as_ref() {
                    Expr::Lambda(_, _, _) | Expr::Let(_, _, _) => write!(f, "({func})")?,
                    _ => write!(f, "{func}")?,
                }
                match arg.as_ref() {
                    Expr::Unit | Expr::Var(_, _) | Expr::Annot(_, _) => write!(f, " {arg}"),
                    _ => write!(f, " ({arg})"),
                }
            }
            Expr::Annot(body, ty) => write!(f, "({body} : {ty})"),
            Expr::Let(name, value, body) => {
                write!(f, "let {name} = {value} in {body}")
            }
        }
    }
}
