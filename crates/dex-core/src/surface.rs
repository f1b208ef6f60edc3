//! Surface IR, as produced by the parser and consumed by `deshadow` and
//! type inference. Every node carries the span of the source text it was
//! parsed from, as absolute byte offsets into the enclosing file.

use crate::ir::{BinOp, Lit, Ty};
use crate::name::Name;
use crate::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct UExpr {
    pub kind: UExprKind,
    pub span: Span,
}

impl UExpr {
    pub fn new(kind: UExprKind, span: Span) -> UExpr {
        UExpr { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UExprKind {
    Lit(Lit),
    Var(Name),
    BinOp(BinOp, Box<UExpr>, Box<UExpr>),
    Lam {
        param: Name,
        body: Box<UExpr>,
    },
    App(Box<UExpr>, Box<UExpr>),
    If(Box<UExpr>, Box<UExpr>, Box<UExpr>),
    Let {
        name: Name,
        rhs: Box<UExpr>,
        body: Box<UExpr>,
    },
}

/// One top-level declaration, optionally type-annotated.
#[derive(Debug, Clone, PartialEq)]
pub struct UDecl {
    pub name: Name,
    pub ann: Option<Ty>,
    pub expr: UExpr,
    pub span: Span,
}

/// Front-end module: the unit the staged pipeline consumes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FModule {
    /// `type T = ty` declarations, in source order.
    pub ty_aliases: Vec<(Name, Ty, Span)>,
    pub decls: Vec<UDecl>,
}

impl FModule {
    pub fn empty() -> FModule {
        FModule::default()
    }

    pub fn single(decl: UDecl) -> FModule {
        FModule {
            ty_aliases: Vec::new(),
            decls: vec![decl],
        }
    }
}
