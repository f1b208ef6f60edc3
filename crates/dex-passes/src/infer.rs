//! Bidirectional type inference: surface modules in, typed core IR out.
//!
//! Inference is syntax-directed. Lambdas are checked against an expected
//! arrow type (from an annotation or an application) rather than inferred,
//! so there is no unification and no type variables.

use dex_core::env::{Binding, TopEnv};
use dex_core::error::{Error, Result};
use dex_core::ir::{Atom, Expr, Module, Decl, Ty};
use dex_core::name::Name;
use dex_core::span::Span;
use dex_core::surface::{FModule, UExpr, UExprKind};
use std::collections::HashMap;

type Scope = HashMap<Name, Ty>;

pub struct TypeInfer<'a> {
    env: &'a TopEnv,
    /// Module-local type aliases, already resolved.
    aliases: HashMap<Name, Ty>,
    /// Earlier declarations of the module under inference.
    top: Scope,
    /// Session bindings the module references, in first-use order.
    externs: Vec<(Name, Ty)>,
}

impl<'a> TypeInfer<'a> {
    pub fn new(env: &'a TopEnv) -> Self {
        TypeInfer {
            env,
            aliases: HashMap::new(),
            top: HashMap::new(),
            externs: Vec::new(),
        }
    }

    pub fn transform(&mut self, module: &FModule) -> Result<Module> {
        for (name, ty, span) in &module.ty_aliases {
            let resolved = self.resolve_ty(ty, *span)?;
            self.aliases.insert(name.clone(), resolved);
        }
        let mut decls = Vec::with_capacity(module.decls.len());
        for decl in &module.decls {
            let (expr, ty) = match &decl.ann {
                Some(ann) => {
                    let want = self.resolve_ty(ann, decl.span)?;
                    let expr = self.check(&decl.expr, &want, &Scope::new())?;
                    (expr, want)
                }
                None => self.infer(&decl.expr, &Scope::new())?,
            };
            self.top.insert(decl.name.clone(), ty.clone());
            decls.push(Decl {
                name: decl.name.clone(),
                ty,
                expr,
            });
        }
        tracing::debug!(
            decls = decls.len(),
            externs = self.externs.len(),
            "inferred module types"
        );
        Ok(Module {
            externs: self.externs.clone(),
            decls,
        })
    }

    /// Type-alias bindings this module contributes to the session.
    pub fn alias_delta(&self, module: &FModule) -> TopEnv {
        module
            .ty_aliases
            .iter()
            .filter_map(|(name, _, _)| {
                let resolved = self.aliases.get(name)?;
                Some((name.clone(), Binding::TyAlias(resolved.clone())))
            })
            .collect()
    }

    fn resolve_ty(&self, ty: &Ty, span: Span) -> Result<Ty> {
        match ty {
            Ty::Named(name) => {
                if let Some(resolved) = self.aliases.get(name) {
                    return Ok(resolved.clone());
                }
                match self.env.lookup(name) {
                    Some(Binding::TyAlias(resolved)) => Ok(resolved.clone()),
                    Some(Binding::Value { .. }) => {
                        Err(Error::ty(format!("{name} names a value, not a type"))
                            .with_span(span))
                    }
                    None => Err(Error::ty(format!("unknown type name {name}")).with_span(span)),
                }
            }
            Ty::Arrow(a, b) => Ok(Ty::Arrow(
                Box::new(self.resolve_ty(a, span)?),
                Box::new(self.resolve_ty(b, span)?),
            )),
            other => Ok(other.clone()),
        }
    }

    fn lookup_var(&mut self, name: &Name, scope: &Scope, span: Span) -> Result<Ty> {
        if let Some(ty) = scope.get(name) {
            return Ok(ty.clone());
        }
        if let Some(ty) = self.top.get(name) {
            return Ok(ty.clone());
        }
        match self.env.lookup(name) {
            Some(Binding::Value { ty, .. }) => {
                if !self.externs.iter().any(|(n, _)| n == name) {
                    self.externs.push((name.clone(), ty.clone()));
                }
                Ok(ty.clone())
            }
            Some(Binding::TyAlias(_)) => {
                Err(Error::ty(format!("{name} names a type, not a value")).with_span(span))
            }
            None => Err(Error::unbound(name).with_span(span)),
        }
    }

    fn infer(&mut self, expr: &UExpr, scope: &Scope) -> Result<(Expr, Ty)> {
        match &expr.kind {
            UExprKind::Lit(lit) => Ok((Expr::lit(*lit), lit.ty())),
            UExprKind::Var(name) => {
                let ty = self.lookup_var(name, scope, expr.span)?;
                Ok((Expr::var(name.clone()), ty))
            }
            UExprKind::BinOp(op, lhs, rhs) => {
                let (lhs_core, lhs_ty) = self.infer(lhs, scope)?;
                let numeric = matches!(lhs_ty, Ty::Int | Ty::Float);
                let ok = match op {
                    dex_core::ir::BinOp::Equal => numeric || lhs_ty == Ty::Bool,
                    _ => numeric,
                };
                if !ok {
                    return Err(
                        Error::ty(format!("{op} does not apply to {lhs_ty}")).with_span(expr.span)
                    );
                }
                let rhs_core = self.check(rhs, &lhs_ty, scope)?;
                let ty = op.result_ty(&lhs_ty);
                Ok((
                    Expr::BinOp(*op, Box::new(lhs_core), Box::new(rhs_core)),
                    ty,
                ))
            }
            UExprKind::Lam { .. } => Err(Error::ty(
                "cannot infer the type of a lambda here; add an annotation",
            )
            .with_span(expr.span)),
            UExprKind::App(func, arg) => {
                // A literal lambda in function position takes its parameter
                // type from the argument.
                if let UExprKind::Lam { param, body } = &func.kind {
                    let (arg_core, arg_ty) = self.infer(arg, scope)?;
                    let mut inner = scope.clone();
                    inner.insert(param.clone(), arg_ty.clone());
                    let (body_core, body_ty) = self.infer(body, &inner)?;
                    let lam = Atom::Lam {
                        param: param.clone(),
                        param_ty: arg_ty,
                        body: Box::new(body_core),
                    };
                    return Ok((
                        Expr::App(Box::new(Expr::Atom(lam)), Box::new(arg_core)),
                        body_ty,
                    ));
                }
                let (func_core, func_ty) = self.infer(func, scope)?;
                match func_ty {
                    Ty::Arrow(param_ty, result_ty) => {
                        let arg_core = self.check(arg, &param_ty, scope)?;
                        Ok((
                            Expr::App(Box::new(func_core), Box::new(arg_core)),
                            *result_ty,
                        ))
                    }
                    other => Err(Error::ty(format!("applied non-function of type {other}"))
                        .with_span(func.span)),
                }
            }
            UExprKind::If(cond, then, els) => {
                let cond_core = self.check(cond, &Ty::Bool, scope)?;
                let (then_core, then_ty) = self.infer(then, scope)?;
                let else_core = self.check(els, &then_ty, scope)?;
                Ok((
                    Expr::If(
                        Box::new(cond_core),
                        Box::new(then_core),
                        Box::new(else_core),
                    ),
                    then_ty,
                ))
            }
            UExprKind::Let { name, rhs, body } => {
                let (rhs_core, rhs_ty) = self.infer(rhs, scope)?;
                let mut inner = scope.clone();
                inner.insert(name.clone(), rhs_ty.clone());
                let (body_core, body_ty) = self.infer(body, &inner)?;
                Ok((
                    Expr::Let {
                        name: name.clone(),
                        ty: rhs_ty,
                        rhs: Box::new(rhs_core),
                        body: Box::new(body_core),
                    },
                    body_ty,
                ))
            }
        }
    }

    fn check(&mut self, expr: &UExpr, want: &Ty, scope: &Scope) -> Result<Expr> {
        match (&expr.kind, want) {
            (UExprKind::Lam { param, body }, Ty::Arrow(param_ty, result_ty)) => {
                let mut inner = scope.clone();
                inner.insert(param.clone(), (**param_ty).clone());
                let body_core = self.check(body, result_ty, &inner)?;
                Ok(Expr::Atom(Atom::Lam {
                    param: param.clone(),
                    param_ty: (**param_ty).clone(),
                    body: Box::new(body_core),
                }))
            }
            (UExprKind::Lam { .. }, other) => Err(Error::ty(format!(
                "lambda cannot have non-function type {other}"
            ))
            .with_span(expr.span)),
            (UExprKind::If(cond, then, els), _) => {
                let cond_core = self.check(cond, &Ty::Bool, scope)?;
                let then_core = self.check(then, want, scope)?;
                let else_core = self.check(els, want, scope)?;
                Ok(Expr::If(
                    Box::new(cond_core),
                    Box::new(then_core),
                    Box::new(else_core),
                ))
            }
            (UExprKind::Let { name, rhs, body }, _) => {
                let (rhs_core, rhs_ty) = self.infer(rhs, scope)?;
                let mut inner = scope.clone();
                inner.insert(name.clone(), rhs_ty.clone());
                let body_core = self.check(body, want, &inner)?;
                Ok(Expr::Let {
                    name: name.clone(),
                    ty: rhs_ty,
                    rhs: Box::new(rhs_core),
                    body: Box::new(body_core),
                })
            }
            _ => {
                let (core, got) = self.infer(expr, scope)?;
                if got != *want {
                    return Err(Error::ty(format!("expected {want}, found {got}"))
                        .with_span(expr.span));
                }
                Ok(core)
            }
        }
    }
}
