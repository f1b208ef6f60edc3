//! Runtime values, realized when the driver needs to display a result.

use crate::env::{Binding, TopEnv};
use crate::error::{Error, Result};
use crate::ir::{Atom, Lit, Ty};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Unit,
}

impl Value {
    pub fn ty(&self) -> Ty {
        match self {
            Value::Int(_) => Ty::Int,
            Value::Float(_) => Ty::Float,
            Value::Bool(_) => Ty::Bool,
            Value::Unit => Ty::Unit,
        }
    }

    pub fn from_lit(lit: Lit) -> Value {
        match lit {
            Lit::Int(v) => Value::Int(v),
            Lit::Float(v) => Value::Float(v),
            Lit::Bool(v) => Value::Bool(v),
            Lit::Unit => Value::Unit,
        }
    }

    pub fn as_lit(&self) -> Lit {
        match self {
            Value::Int(v) => Lit::Int(*v),
            Value::Float(v) => Lit::Float(*v),
            Value::Bool(v) => Lit::Bool(*v),
            Value::Unit => Lit::Unit,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_lit())
    }
}

/// Realize the runtime value an atom denotes, chasing variable bindings
/// through the environment.
pub fn load_atom_val(env: &TopEnv, atom: &Atom) -> Result<Value> {
    match atom {
        Atom::Lit(lit) => Ok(Value::from_lit(*lit)),
        Atom::Var(name) => match env.lookup(name) {
            Some(Binding::Value { atom, .. }) => load_atom_val(env, atom),
            Some(Binding::TyAlias(_)) => Err(Error::ty(format!(
                "{name} names a type, not a value"
            ))),
            None => Err(Error::unbound(name)),
        },
        Atom::Lam { .. } => Err(Error::runtime("cannot print a function value")),
    }
}
