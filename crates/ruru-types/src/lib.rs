//! Type representations for Ruru.
//!
//! This crate defines the semantic types manipulated by the bidirectional
//! checker in `ruru-infer`. The grammar is deliberately small: unit,
//! rigid universal variables, existential (unification) variables,
//! universal quantification, and functions.
//!
//! Types are immutable value trees. The checker never mutates a type in
//! place; it builds new ones via [`Type::replace`] or by substituting
//! existential solutions out of a context.

use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

/// An opaque name for type variables and term variables.
///
/// Names are compared structurally. Generated existential names carry a
/// prefix outside the surface identifier grammar, so they can never collide
/// with user-chosen names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(String);

impl Name {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A semantic type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// The unit type.
    Unit,
    /// A rigid universal variable, bound by an enclosing `Forall` or by a
    /// context note.
    Var(Name),
    /// An existential variable introduced by the checker, eventually solved
    /// to a monotype or left free.
    Exist(Name),
    /// Universal quantification: `∀name. body`.
    Forall(Name, Box<Type>),
    /// Function type: `domain → codomain`.
    Fun(Box<Type>, Box<Type>),
}

impl Type {
    pub fn var(name: impl Into<String>) -> Self {
        Type::Var(Name::new(name))
    }

    pub fn exist(name: impl Into<String>) -> Self {
        Type::Exist(Name::new(name))
    }

    pub fn forall(name: impl Into<String>, body: Type) -> Self {
        Type::Forall(Name::new(name), Box::new(body))
    }

    pub fn fun(domain: Type, codomain: Type) -> Self {
        Type::Fun(Box::new(domain), Box::new(codomain))
    }

    /// A monotype contains no quantifiers. Only monotypes may be recorded
    /// as existential solutions.
    pub fn is_monotype(&self) -> bool {
        match self {
            Type::Unit | Type::Var(_) | Type::Exist(_) => true,
            Type::Forall(_, _) => false,
            Type::Fun(domain, codomain) => domain.is_monotype() && codomain.is_monotype(),
        }
    }

    /// Replace every occurrence of `from` (compared structurally) with `to`.
    ///
    /// Quantifier binders are not alpha-renamed: binders introduced by the
    /// checker are globally unique, so capture cannot occur there.
    pub fn replace(&self, from: &Type, to: &Type) -> Type {
        if self == from {
            return to.clone();
        }
        match self {
            Type::Unit | Type::Var(_) | Type::Exist(_) => self.clone(),
            Type::Forall(name, body) => {
                Type::Forall(name.clone(), Box::new(body.replace(from, to)))
            }
            Type::Fun(domain, codomain) => Type::Fun(
                Box::new(domain.replace(from, to)),
                Box::new(codomain.replace(from, to)),
            ),
        }
    }
}

/// Collect the free existential variables of a type.
///
/// Universal variables are rigid and never participate in instantiation, so
/// they are not collected. `Forall` does not bind existentials.
pub fn free_exist_vars(ty: &Type) -> BTreeSet<Name> {
    let mut vars = BTreeSet::new();
    collect_free_exist_vars(ty, &mut vars);
    vars
}

fn collect_free_exist_vars(ty: &Type, vars: &mut BTreeSet<Name>) {
    match ty {
        Type::Unit | Type::Var(_) => {}
        Type::Exist(name) => {
            vars.insert(name.clone());
        }
        Type::Forall(_, body) => collect_free_exist_vars(body, vars),
        Type::Fun(domain, codomain) => {
            collect_free_exist_vars(domain, vars);
            collect_free_exist_vars(codomain, vars);
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unit => write!(f, "()"),
            Type::Var(name) | Type::Exist(name) => write!(f, "{name}"),
            Type::Forall(name, body) => write!(f, "∀{name}. {body}"),
            Type::Fun(domain, codomain) => match domain.as_ref() {
                // Left-nested arrows and quantified domains need parens.
                Type::Fun(_, _) | Type::Forall(_, _) => write!(f, "({domain}) → {codomain}"),
                _ => write!(f, "{domain} → {codomain}"),
            },
        }
    }
}
