//! Normalization to administrative normal form: every operand of a
//! compound expression is let-bound to a name, left to right.

use crate::check::expr_ty;
use dex_core::error::Result;
use dex_core::ir::{Atom, Decl, Expr, Module, Ty};
use dex_core::name::{FreshScope, Name};
use std::collections::HashMap;

pub struct Normalize<'a> {
    scope: &'a mut FreshScope,
    /// Types of every binder in scope, for annotating introduced lets.
    tys: HashMap<Name, Ty>,
}

fn fold_lets(binds: Vec<(Name, Ty, Expr)>, body: Expr) -> Expr {
    binds.into_iter().rev().fold(body, |acc, (name, ty, rhs)| Expr::Let {
        name,
        ty,
        rhs: Box::new(rhs),
        body: Box::new(acc),
    })
}

impl<'a> Normalize<'a> {
    pub fn new(scope: &'a mut FreshScope) -> Self {
        Normalize {
            scope,
            tys: HashMap::new(),
        }
    }

    pub fn transform(&mut self, module: &Module) -> Result<Module> {
        self.tys = module.externs.iter().cloned().collect();
        // Seed the scope with everything already named, so introduced
        // temps cannot alias a binder renamed by an earlier pass.
        let scope = &mut *self.scope;
        module.visit_names(&mut |name| scope.reserve(name));
        let mut decls = Vec::with_capacity(module.decls.len());
        for decl in &module.decls {
            let expr = self.norm_nested(&decl.expr)?;
            self.tys.insert(decl.name.clone(), decl.ty.clone());
            decls.push(Decl {
                name: decl.name.clone(),
                ty: decl.ty.clone(),
                expr,
            });
        }
        Ok(Module {
            externs: module.externs.clone(),
            decls,
        })
    }

    /// Normalize a subtree into its own let-chain.
    fn norm_nested(&mut self, expr: &Expr) -> Result<Expr> {
        let mut binds = Vec::new();
        let body = self.norm(expr, &mut binds)?;
        Ok(fold_lets(binds, body))
    }

    /// Normalize, emitting introduced bindings into `binds`. The returned
    /// expression is an atom or a single compound over atoms.
    fn norm(&mut self, expr: &Expr, binds: &mut Vec<(Name, Ty, Expr)>) -> Result<Expr> {
        match expr {
            Expr::Atom(Atom::Lam {
                param,
                param_ty,
                body,
            }) => {
                self.tys.insert(param.clone(), param_ty.clone());
                let body = self.norm_nested(body)?;
                Ok(Expr::Atom(Atom::Lam {
                    param: param.clone(),
                    param_ty: param_ty.clone(),
                    body: Box::new(body),
                }))
            }
            Expr::Atom(atom) => Ok(Expr::Atom(atom.clone())),
            Expr::BinOp(op, lhs, rhs) => {
                let lhs = self.norm_atom(lhs, binds)?;
                let rhs = self.norm_atom(rhs, binds)?;
                Ok(Expr::BinOp(
                    *op,
                    Box::new(Expr::Atom(lhs)),
                    Box::new(Expr::Atom(rhs)),
                ))
            }
            Expr::App(func, arg) => {
                let func = self.norm_atom(func, binds)?;
                let arg = self.norm_atom(arg, binds)?;
                Ok(Expr::App(
                    Box::new(Expr::Atom(func)),
                    Box::new(Expr::Atom(arg)),
                ))
            }
            Expr::If(cond, then, els) => {
                let cond = self.norm_atom(cond, binds)?;
                // Branch-local lets stay inside their branch.
                let then = self.norm_nested(then)?;
                let els = self.norm_nested(els)?;
                Ok(Expr::If(
                    Box::new(Expr::Atom(cond)),
                    Box::new(then),
                    Box::new(els),
                ))
            }
            Expr::Let {
                name,
                ty,
                rhs,
                body,
            } => {
                let rhs = self.norm(rhs, binds)?;
                self.tys.insert(name.clone(), ty.clone());
                binds.push((name.clone(), ty.clone(), rhs));
                self.norm(body, binds)
            }
        }
    }

    fn norm_atom(&mut self, expr: &Expr, binds: &mut Vec<(Name, Ty, Expr)>) -> Result<Atom> {
        let normalized = self.norm(expr, binds)?;
        match normalized {
            Expr::Atom(atom) => Ok(atom),
            compound => {
                let ty = expr_ty(&self.tys, &compound)?;
                let tmp = self.scope.fresh("tmp");
                self.tys.insert(tmp.clone(), ty.clone());
                binds.push((tmp.clone(), ty, compound));
                Ok(Atom::Var(tmp))
            }
        }
    }
}
