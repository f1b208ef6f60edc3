//! Typed core IR.
//!
//! Modules arrive here from type inference. `normalize` rewrites them into
//! administrative normal form (every operand of a compound expression is an
//! atom), and `simplify` additionally eliminates lambdas and applications.

use crate::name::Name;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    Int,
    Float,
    Bool,
    Unit,
    /// Reference to a named type alias; type inference resolves these away,
    /// so later stages never see one.
    Named(Name),
    Arrow(Box<Ty>, Box<Ty>),
}

impl Ty {
    pub fn is_arrow(&self) -> bool {
        matches!(self, Ty::Arrow(_, _))
    }

    /// Scalar types are the ones the imperative IR can store in a cell.
    pub fn is_scalar(&self) -> bool {
        !self.is_arrow()
    }
}

impl std::fmt::Display for Ty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ty::Int => write!(f, "Int"),
            Ty::Float => write!(f, "Float"),
            Ty::Bool => write!(f, "Bool"),
            Ty::Unit => write!(f, "Unit"),
            Ty::Named(name) => write!(f, "{name}"),
            Ty::Arrow(a, b) => match a.as_ref() {
                Ty::Arrow(_, _) => write!(f, "({a}) -> {b}"),
                _ => write!(f, "{a} -> {b}"),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lit {
    Int(i64),
    Float(f64),
    Bool(bool),
    Unit,
}

impl Lit {
    pub fn ty(&self) -> Ty {
        match self {
            Lit::Int(_) => Ty::Int,
            Lit::Float(_) => Ty::Float,
            Lit::Bool(_) => Ty::Bool,
            Lit::Unit => Ty::Unit,
        }
    }
}

impl std::fmt::Display for Lit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lit::Int(v) => write!(f, "{v}"),
            Lit::Float(v) => {
                if v.fract() == 0.0 && v.is_finite() {
                    write!(f, "{v:.1}")
                } else {
                    write!(f, "{v}")
                }
            }
            Lit::Bool(v) => write!(f, "{v}"),
            Lit::Unit => write!(f, "()"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Less,
    Greater,
    Equal,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Less => "<",
            BinOp::Greater => ">",
            BinOp::Equal => "==",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(self, BinOp::Less | BinOp::Greater | BinOp::Equal)
    }

    /// Result type for operands of type `operand`.
    pub fn result_ty(&self, operand: &Ty) -> Ty {
        if self.is_comparison() {
            Ty::Bool
        } else {
            operand.clone()
        }
    }
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Irreducible values: the operands of ANF expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Lit(Lit),
    Var(Name),
    Lam {
        param: Name,
        param_ty: Ty,
        body: Box<Expr>,
    },
}

impl Atom {
    pub fn as_lit(&self) -> Option<Lit> {
        match self {
            Atom::Lit(lit) => Some(*lit),
            _ => None,
        }
    }

    pub fn visit_names(&self, f: &mut impl FnMut(&Name)) {
        match self {
            Atom::Lit(_) => {}
            Atom::Var(name) => f(name),
            Atom::Lam { param, body, .. } => {
                f(param);
                body.visit_names(f);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Atom(Atom),
    BinOp(BinOp, Box<Expr>, Box<Expr>),
    App(Box<Expr>, Box<Expr>),
    If(Box<Expr>, Box<Expr>, Box<Expr>),
    Let {
        name: Name,
        ty: Ty,
        rhs: Box<Expr>,
        body: Box<Expr>,
    },
}

impl Expr {
    pub fn lit(lit: Lit) -> Expr {
        Expr::Atom(Atom::Lit(lit))
    }

    pub fn var(name: Name) -> Expr {
        Expr::Atom(Atom::Var(name))
    }

    pub fn is_atom(&self) -> bool {
        matches!(self, Expr::Atom(_))
    }

    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            Expr::Atom(atom) => Some(atom),
            _ => None,
        }
    }

    pub fn visit_names(&self, f: &mut impl FnMut(&Name)) {
        match self {
            Expr::Atom(atom) => atom.visit_names(f),
            Expr::BinOp(_, lhs, rhs) | Expr::App(lhs, rhs) => {
                lhs.visit_names(f);
                rhs.visit_names(f);
            }
            Expr::If(cond, then, els) => {
                cond.visit_names(f);
                then.visit_names(f);
                els.visit_names(f);
            }
            Expr::Let {
                name, rhs, body, ..
            } => {
                f(name);
                rhs.visit_names(f);
                body.visit_names(f);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub name: Name,
    pub ty: Ty,
    pub expr: Expr,
}

/// A typed module: self-contained up to `externs`, the session bindings it
/// references together with their types.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub externs: Vec<(Name, Ty)>,
    pub decls: Vec<Decl>,
}

impl Module {
    pub fn empty() -> Module {
        Module::default()
    }

    /// Every name occurring in the module: externs, declaration names,
    /// binders, and variable references.
    pub fn visit_names(&self, f: &mut impl FnMut(&Name)) {
        for (name, _) in &self.externs {
            f(name);
        }
        for decl in &self.decls {
            f(&decl.name);
            decl.expr.visit_names(f);
        }
    }
}
