//! The top-level binding environment and its monoid structure.

use crate::ir::{Atom, Ty};
use crate::name::Name;
use indexmap::IndexMap;

/// A single top-level binding.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// A value binding: its type plus the atom it simplifies to.
    Value { ty: Ty, atom: Atom },
    /// A type alias.
    TyAlias(Ty),
}

impl Binding {
    pub fn ty(&self) -> &Ty {
        match self {
            Binding::Value { ty, .. } => ty,
            Binding::TyAlias(ty) => ty,
        }
    }
}

/// Environments a pass can contribute to.
///
/// `combine` must be associative with `empty` as identity. For maps the
/// combine is right-biased: on key collision the incoming binding wins,
/// without disturbing the colliding key's traversal position.
pub trait EnvMonoid: Clone {
    fn empty() -> Self;
    fn combine(&mut self, other: Self);
}

/// Read views of the session environment, and the inverse collapse of a
/// product delta back into a flat one. The staged pipeline runs over a
/// product of per-pass environments; the session holds the flat map.
pub trait EnvView: EnvMonoid {
    fn view(session: &TopEnv) -> Self;
    fn collapse(self, into: &mut TopEnv);
}

/// Insertion-ordered map from top-level names to typed bindings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TopEnv {
    bindings: IndexMap<Name, Binding>,
}

impl TopEnv {
    pub fn new() -> TopEnv {
        TopEnv::default()
    }

    pub fn insert(&mut self, name: Name, binding: Binding) {
        self.bindings.insert(name, binding);
    }

    pub fn lookup(&self, name: &Name) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Binding)> {
        self.bindings.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &Name> {
        self.bindings.keys()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl FromIterator<(Name, Binding)> for TopEnv {
    fn from_iter<I: IntoIterator<Item = (Name, Binding)>>(iter: I) -> TopEnv {
        TopEnv {
            bindings: iter.into_iter().collect(),
        }
    }
}

impl EnvMonoid for TopEnv {
    fn empty() -> TopEnv {
        TopEnv::new()
    }

    fn combine(&mut self, other: TopEnv) {
        for (name, binding) in other.bindings {
            self.bindings.insert(name, binding);
        }
    }
}

impl EnvView for TopEnv {
    fn view(session: &TopEnv) -> TopEnv {
        session.clone()
    }

    fn collapse(self, into: &mut TopEnv) {
        into.combine(self);
    }
}

impl EnvMonoid for () {
    fn empty() {}

    fn combine(&mut self, _other: ()) {}
}

impl EnvView for () {
    fn view(_session: &TopEnv) {}

    fn collapse(self, _into: &mut TopEnv) {}
}

impl<A: EnvMonoid, B: EnvMonoid> EnvMonoid for (A, B) {
    fn empty() -> (A, B) {
        (A::empty(), B::empty())
    }

    fn combine(&mut self, other: (A, B)) {
        self.0.combine(other.0);
        self.1.combine(other.1);
    }
}

impl<A: EnvView, B: EnvView> EnvView for (A, B) {
    fn view(session: &TopEnv) -> (A, B) {
        (A::view(session), B::view(session))
    }

    fn collapse(self, into: &mut TopEnv) {
        self.0.collapse(into);
        self.1.collapse(into);
    }
}
