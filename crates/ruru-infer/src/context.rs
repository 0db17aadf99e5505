//! Ordered typing contexts.
//!
//! A context is an ordered sequence of notes; the order encodes scope and
//! dependency. The newest note sits at the *end* of the backing vector, so
//! "append" is a push and "the portion older than a note" is the prefix
//! before it. Solved existentials may only refer to notes strictly older
//! than themselves, which is what makes context application terminate.
//!
//! Contexts are functional: every operation returns a new context and
//! never mutates one already handed to a caller.

use std::fmt;

use ruru_ast::Expr;
use ruru_diag::{Category, Diagnostic, DiagnosticError};
use ruru_types::{Name, Type};

/// A single entry in a typing context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Note {
    /// A rigid universal type variable is in scope.
    Var(Name),
    /// An unsolved existential variable is in scope.
    Exist(Name),
    /// An existential solved to a monotype. Replaces the unsolved note in
    /// place; the solution may only mention strictly older notes.
    Solved(Name, Type),
    /// A scope marker (▶) delimiting a subderivation. Everything newer is
    /// discarded when the marker is peeled.
    Marker(Name),
    /// A term variable carries the given type.
    Assump(Name, Type),
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Note::Var(name) => write!(f, "{name}"),
            Note::Exist(name) => write!(f, "?{name}"),
            Note::Solved(name, ty) => write!(f, "?{name} = {ty}"),
            Note::Marker(name) => write!(f, "▶{name}"),
            Note::Assump(name, ty) => write!(f, "{name} : {ty}"),
        }
    }
}

/// An ordered sequence of notes, newest last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context(Vec<Note>);

impl Context {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn notes(&self) -> &[Note] {
        &self.0
    }

    /// Append a note, returning the extended context.
    pub fn extend(&self, note: Note) -> Self {
        let mut notes = self.0.clone();
        notes.push(note);
        Self(notes)
    }

    /// Append several notes, oldest first.
    pub fn extend_many(&self, new_notes: impl IntoIterator<Item = Note>) -> Self {
        let mut notes = self.0.clone();
        notes.extend(new_notes);
        Self(notes)
    }

    pub fn contains(&self, note: &Note) -> bool {
        self.0.contains(note)
    }

    /// Whether a rigid universal variable is in scope.
    pub fn has_var(&self, name: &Name) -> bool {
        self.0
            .iter()
            .any(|note| matches!(note, Note::Var(n) if n == name))
    }

    /// Whether an *unsolved* existential is in scope.
    pub fn has_exist(&self, name: &Name) -> bool {
        self.0
            .iter()
            .any(|note| matches!(note, Note::Exist(n) if n == name))
    }

    /// Index of the newest note equal to `note`.
    fn position(&self, note: &Note) -> Option<usize> {
        self.0.iter().rposition(|n| n == note)
    }

    /// The typing assumption for term variable `x`, if any.
    ///
    /// More than one assumption for the same name at once means a scope was
    /// not peeled; that is a checker bug and fails fast.
    pub fn assump(&self, x: &Name) -> Result<Option<&Type>, DiagnosticError> {
        let mut matches = self.0.iter().filter_map(|note| match note {
            Note::Assump(name, ty) if name == x => Some(ty),
            _ => None,
        });
        let first = matches.next();
        if first.is_some() && matches.next().is_some() {
            return Err(Diagnostic::error(
                Category::ContextInvariant,
                format!("multiple assumptions for `{x}` in context"),
            )
            .with_note(format!("in context {self}"))
            .into());
        }
        Ok(first)
    }

    /// The solution recorded for existential `alpha`, if any. Duplicate
    /// solutions fail fast.
    pub fn solution(&self, alpha: &Name) -> Result<Option<&Type>, DiagnosticError> {
        let mut matches = self.0.iter().filter_map(|note| match note {
            Note::Solved(name, ty) if name == alpha => Some(ty),
            _ => None,
        });
        let first = matches.next();
        if first.is_some() && matches.next().is_some() {
            return Err(Diagnostic::error(
                Category::ContextInvariant,
                format!("multiple solutions for existential `{alpha}` in context"),
            )
            .with_note(format!("in context {self}"))
            .into());
        }
        Ok(first)
    }

    /// First-match solution lookup used by [`Context::apply`], which must
    /// stay total. Duplicates are ruled out at solve sites, where every
    /// solved note is created through [`Context::split`].
    fn find_solution(&self, alpha: &Name) -> Option<&Type> {
        self.0.iter().find_map(|note| match note {
            Note::Solved(name, ty) if name == alpha => Some(ty),
            _ => None,
        })
    }

    /// The portion of the context strictly older than `note`, dropping
    /// `note` itself and everything newer. Empty if `note` is absent.
    pub fn peel(&self, note: &Note) -> Self {
        match self.position(note) {
            Some(idx) => Self(self.0[..idx].to_vec()),
            None => Self::new(),
        }
    }

    /// Split the context around `note` into the strictly older portion and
    /// the strictly newer notes (oldest first). `note` itself is excluded
    /// from both. Absence of `note` is a structural bug.
    pub fn split(&self, note: &Note) -> Result<(Self, Vec<Note>), DiagnosticError> {
        match self.position(note) {
            Some(idx) => Ok((
                Self(self.0[..idx].to_vec()),
                self.0[idx + 1..].to_vec(),
            )),
            None => Err(Diagnostic::error(
                Category::ContextInvariant,
                format!("cannot split on `{note}`: no such note"),
            )
            .with_note(format!("in context {self}"))
            .into()),
        }
    }

    /// Whether every variable of `ty` is accounted for: universals need a
    /// `Var` note, existentials an `Exist` or `Solved` note. Both sides of
    /// a function type are checked.
    pub fn well_formed(&self, ty: &Type) -> bool {
        match ty {
            Type::Unit => true,
            Type::Var(name) => self.has_var(name),
            Type::Exist(name) => self.has_exist(name) || self.find_solution(name).is_some(),
            Type::Forall(name, body) => {
                self.extend(Note::Var(name.clone())).well_formed(body)
            }
            Type::Fun(domain, codomain) => {
                self.well_formed(domain) && self.well_formed(codomain)
            }
        }
    }

    /// Substitute every solved existential in `ty` by its solution,
    /// transitively. Unsolved existentials and rigid variables are left
    /// alone.
    pub fn apply(&self, ty: &Type) -> Type {
        match ty {
            Type::Unit | Type::Var(_) => ty.clone(),
            Type::Exist(name) => match self.find_solution(name) {
                // Solutions only mention older notes, so this terminates.
                Some(solution) => self.apply(solution),
                None => ty.clone(),
            },
            Type::Forall(name, body) => {
                Type::Forall(name.clone(), Box::new(self.apply(body)))
            }
            Type::Fun(domain, codomain) => Type::Fun(
                Box::new(self.apply(domain)),
                Box::new(self.apply(codomain)),
            ),
        }
    }

    /// Apply the context to every type slot of a term, rebuilding the term.
    pub fn apply_expr(&self, expr: &Expr) -> Expr {
        let apply_slot = |slot: &Option<Type>| slot.as_ref().map(|ty| self.apply(ty));
        match expr {
            Expr::Unit => Expr::Unit,
            Expr::Var(name, slot) => Expr::Var(name.clone(), apply_slot(slot)),
            Expr::Lambda(param, slot, body) => Expr::Lambda(
                param.clone(),
                apply_slot(slot),
                Box::new(self.apply_expr(body)),
            ),
            Expr::Apply(func, arg, slot) => Expr::Apply(
                Box::new(self.apply_expr(func)),
                Box::new(self.apply_expr(arg)),
                apply_slot(slot),
            ),
            Expr::Annot(body, ty) => {
                Expr::Annot(Box::new(self.apply_expr(body)), self.apply(ty))
            }
            Expr::Let(name, value, body) => Expr::Let(
                name.clone(),
                Box::new(self.apply_expr(value)),
                Box::new(self.apply_expr(body)),
            ),
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, note) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{note}")?;
        }
        write!(f, "]")
    }
}

impl FromIterator<Note> for Context {
    fn from_iter<I: IntoIterator<Item = Note>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
