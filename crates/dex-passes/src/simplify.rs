//! Simplification: inline session bindings, beta-reduce every application,
//! and fold constants. Output modules contain no lambdas, no applications,
//! and no extern references; function-typed declarations are split off as
//! environment bindings rather than lowered further.

use dex_core::env::{Binding, TopEnv};
use dex_core::error::{Error, Result};
use dex_core::ir::{Atom, BinOp, Decl, Expr, Lit, Module, Ty};
use dex_core::name::{FreshScope, Name};
use std::collections::HashMap;

pub struct Simplify<'a> {
    env: &'a TopEnv,
    scope: &'a mut FreshScope,
    subst: HashMap<Name, Atom>,
    fn_binds: Vec<(Name, Ty, Atom)>,
}

impl<'a> Simplify<'a> {
    pub fn new(env: &'a TopEnv, scope: &'a mut FreshScope) -> Self {
        Simplify {
            env,
            scope,
            subst: HashMap::new(),
            fn_binds: Vec::new(),
        }
    }

    pub fn transform(&mut self, module: &Module) -> Result<Module> {
        // Seed the scope with everything already named, so freshened
        // binders cannot alias a name that survives in the module.
        let scope = &mut *self.scope;
        module.visit_names(&mut |name| scope.reserve(name));
        for (name, _) in &module.externs {
            match self.env.lookup(name) {
                Some(Binding::Value { atom, .. }) => {
                    self.subst.insert(name.clone(), atom.clone());
                }
                Some(Binding::TyAlias(_)) => {
                    return Err(Error::compiler(format!(
                        "extern {name} resolves to a type alias"
                    )));
                }
                None => {
                    return Err(Error::compiler(format!(
                        "extern {name} missing from environment"
                    )));
                }
            }
        }
        let mut decls = Vec::new();
        for decl in &module.decls {
            let expr = self.simp(&decl.expr)?;
            if decl.ty.is_arrow() {
                let Expr::Atom(lam @ Atom::Lam { .. }) = expr else {
                    return Err(Error::compiler(format!(
                        "function declaration {} did not reduce to a lambda",
                        decl.name
                    )));
                };
                self.subst.insert(decl.name.clone(), lam.clone());
                self.fn_binds.push((decl.name.clone(), decl.ty.clone(), lam));
            } else {
                decls.push(Decl {
                    name: decl.name.clone(),
                    ty: decl.ty.clone(),
                    expr,
                });
            }
        }
        tracing::debug!(
            decls = decls.len(),
            functions = self.fn_binds.len(),
            "simplified module"
        );
        Ok(Module {
            externs: Vec::new(),
            decls,
        })
    }

    /// Function-typed bindings this module contributes to the session.
    pub fn fn_delta(&self) -> TopEnv {
        self.fn_binds
            .iter()
            .map(|(name, ty, atom)| {
                (
                    name.clone(),
                    Binding::Value {
                        ty: ty.clone(),
                        atom: atom.clone(),
                    },
                )
            })
            .collect()
    }

    fn simp(&mut self, expr: &Expr) -> Result<Expr> {
        match expr {
            Expr::Atom(atom) => Ok(Expr::Atom(self.simp_atom(atom)?)),
            Expr::BinOp(op, lhs, rhs) => {
                let lhs = self.simp(lhs)?;
                let rhs = self.simp(rhs)?;
                if let (Some(a), Some(b)) = (lit_of(&lhs), lit_of(&rhs)) {
                    if let Some(folded) = const_fold(*op, a, b) {
                        return Ok(Expr::lit(folded));
                    }
                }
                Ok(Expr::BinOp(*op, Box::new(lhs), Box::new(rhs)))
            }
            Expr::App(func, arg) => {
                let func = self.simp(func)?;
                let arg = self.simp(arg)?;
                let Expr::Atom(arg_atom) = arg else {
                    return Err(Error::compiler("application argument is not an atom"));
                };
                match func {
                    Expr::Atom(Atom::Lam { param, body, .. }) => {
                        self.subst.insert(param, arg_atom);
                        self.simp(&body)
                    }
                    other => Err(Error::compiler(format!(
                        "unreduced application of {}",
                        describe(&other)
                    ))),
                }
            }
            Expr::If(cond, then, els) => {
                let cond = self.simp(cond)?;
                match lit_of(&cond) {
                    Some(Lit::Bool(true)) => self.simp(then),
                    Some(Lit::Bool(false)) => self.simp(els),
                    _ => Ok(Expr::If(
                        Box::new(cond),
                        Box::new(self.simp(then)?),
                        Box::new(self.simp(els)?),
                    )),
                }
            }
            Expr::Let {
                name,
                ty,
                rhs,
                body,
            } => {
                let rhs = self.simp(rhs)?;
                if let Expr::Atom(atom) = rhs {
                    self.subst.insert(name.clone(), atom);
                    self.simp(body)
                } else {
                    Ok(Expr::Let {
                        name: name.clone(),
                        ty: ty.clone(),
                        rhs: Box::new(rhs),
                        body: Box::new(self.simp(body)?),
                    })
                }
            }
        }
    }

    fn simp_atom(&mut self, atom: &Atom) -> Result<Atom> {
        match atom {
            Atom::Lit(lit) => Ok(Atom::Lit(*lit)),
            Atom::Var(name) => match self.subst.get(name).cloned() {
                // Freshen on every use: inlined atoms may be duplicated,
                // and environment atoms carry binders from earlier blocks.
                Some(atom) => Ok(self.freshen(&atom, &mut HashMap::new())),
                None => Ok(Atom::Var(name.clone())),
            },
            Atom::Lam {
                param,
                param_ty,
                body,
            } => Ok(Atom::Lam {
                param: param.clone(),
                param_ty: param_ty.clone(),
                body: Box::new(self.simp(body)?),
            }),
        }
    }

    fn freshen(&mut self, atom: &Atom, renames: &mut HashMap<Name, Name>) -> Atom {
        match atom {
            Atom::Lit(lit) => Atom::Lit(*lit),
            Atom::Var(name) => Atom::Var(renames.get(name).cloned().unwrap_or_else(|| name.clone())),
            Atom::Lam {
                param,
                param_ty,
                body,
            } => {
                let fresh = self.scope.rename(param);
                renames.insert(param.clone(), fresh.clone());
                Atom::Lam {
                    param: fresh,
                    param_ty: param_ty.clone(),
                    body: Box::new(self.freshen_expr(body, renames)),
                }
            }
        }
    }

    fn freshen_expr(&mut self, expr: &Expr, renames: &mut HashMap<Name, Name>) -> Expr {
        match expr {
            Expr::Atom(atom) => Expr::Atom(self.freshen(atom, renames)),
            Expr::BinOp(op, lhs, rhs) => Expr::BinOp(
                *op,
                Box::new(self.freshen_expr(lhs, renames)),
                Box::new(self.freshen_expr(rhs, renames)),
            ),
            Expr::App(func, arg) => Expr::App(
                Box::new(self.freshen_expr(func, renames)),
                Box::new(self.freshen_expr(arg, renames)),
            ),
            Expr::If(cond, then, els) => Expr::If(
                Box::new(self.freshen_expr(cond, renames)),
                Box::new(self.freshen_expr(then, renames)),
                Box::new(self.freshen_expr(els, renames)),
            ),
            Expr::Let {
                name,
                ty,
                rhs,
                body,
            } => {
                let rhs = self.freshen_expr(rhs, renames);
                let fresh = self.scope.rename(name);
                renames.insert(name.clone(), fresh.clone());
                Expr::Let {
                    name: fresh,
                    ty: ty.clone(),
                    rhs: Box::new(rhs),
                    body: Box::new(self.freshen_expr(body, renames)),
                }
            }
        }
    }
}

fn lit_of(expr: &Expr) -> Option<Lit> {
    expr.as_atom().and_then(Atom::as_lit)
}

fn describe(expr: &Expr) -> String {
    match expr.as_atom() {
        Some(Atom::Var(name)) => name.to_string(),
        _ => "non-function expression".to_string(),
    }
}

/// Fold a binary operation over literal operands. Integer division by zero
/// is left unfolded so it surfaces as a runtime error.
pub fn const_fold(op: BinOp, lhs: Lit, rhs: Lit) -> Option<Lit> {
    match (lhs, rhs) {
        (Lit::Int(a), Lit::Int(b)) => Some(match op {
            BinOp::Add => Lit::Int(a.wrapping_add(b)),
            BinOp::Sub => Lit::Int(a.wrapping_sub(b)),
            BinOp::Mul => Lit::Int(a.wrapping_mul(b)),
            BinOp::Div => {
                if b == 0 {
                    return None;
                }
                Lit::Int(a.wrapping_div(b))
            }
            BinOp::Less => Lit::Bool(a < b),
            BinOp::Greater => Lit::Bool(a > b),
            BinOp::Equal => Lit::Bool(a == b),
        }),
        (Lit::Float(a), Lit::Float(b)) => Some(match op {
            BinOp::Add => Lit::Float(a + b),
            BinOp::Sub => Lit::Float(a - b),
            BinOp::Mul => Lit::Float(a * b),
            BinOp::Div => Lit::Float(a / b),
            BinOp::Less => Lit::Bool(a < b),
            BinOp::Greater => Lit::Bool(a > b),
            BinOp::Equal => Lit::Bool(a == b),
        }),
        (Lit::Bool(a), Lit::Bool(b)) if op == BinOp::Equal => Some(Lit::Bool(a == b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check;
    use crate::infer::TypeInfer;
    use crate::normalize::Normalize;
    use dex_core::block::BlockKind;
    use dex_core::frontend::parse_block;
    use dex_core::pretty::pretty_string;
    use pretty_assertions::assert_eq;

    fn anf_module(env: &TopEnv, src: &str) -> Module {
        let BlockKind::RunModule(module) = parse_block(src, 0) else {
            panic!("expected module");
        };
        let typed = TypeInfer::new(env).transform(&module).expect("types");
        let mut scope = FreshScope::new();
        Normalize::new(&mut scope).transform(&typed).expect("anf")
    }

    #[test]
    fn folds_arithmetic_to_a_literal() {
        let env = TopEnv::new();
        let module = anf_module(&env, "x = 1 + 2 * 3\n");
        let mut scope = FreshScope::new();
        let out = Simplify::new(&env, &mut scope)
            .transform(&module)
            .expect("simplify");
        assert_eq!(pretty_string(&out), "x : Int = 7\n");
    }

    #[test]
    fn beta_reduces_applications_away() {
        let env = TopEnv::new();
        let module = anf_module(&env, "x = (\\y. y + 1) 2\n");
        let mut scope = FreshScope::new();
        let out = Simplify::new(&env, &mut scope)
            .transform(&module)
            .expect("simplify");
        assert_eq!(pretty_string(&out), "x : Int = 3\n");
    }

    #[test]
    fn function_decls_move_to_the_environment() {
        let env = TopEnv::new();
        let module = anf_module(&env, "f : Int -> Int = \\y. y + 1\nz = f 4\n");
        let mut scope = FreshScope::new();
        let mut simplify = Simplify::new(&env, &mut scope);
        let out = simplify.transform(&module).expect("simplify");
        assert_eq!(pretty_string(&out), "z : Int = 5\n");
        let delta = simplify.fn_delta();
        assert!(delta.contains(&Name::source("f")));
    }

    #[test]
    fn inlines_session_bindings() {
        let env: TopEnv = [(
            Name::source("n"),
            Binding::Value {
                ty: Ty::Int,
                atom: Atom::Lit(Lit::Int(4)),
            },
        )]
        .into_iter()
        .collect();
        let module = anf_module(&env, "x = n + 1\n");
        let mut scope = FreshScope::new();
        let out = Simplify::new(&env, &mut scope)
            .transform(&module)
            .expect("simplify");
        assert_eq!(pretty_string(&out), "x : Int = 5\n");
        assert!(out.externs.is_empty());
    }

    #[test]
    fn division_by_zero_is_left_for_runtime() {
        let env = TopEnv::new();
        let module = anf_module(&env, "x = 1 / 0\n");
        let mut scope = FreshScope::new();
        let out = Simplify::new(&env, &mut scope)
            .transform(&module)
            .expect("simplify");
        assert_eq!(pretty_string(&out), "x : Int = 1 / 0\n");
    }

    #[test]
    fn folds_literal_conditionals() {
        let env = TopEnv::new();
        let module = anf_module(&env, "x = if 2 < 3 then 10 else 20\n");
        let mut scope = FreshScope::new();
        let out = Simplify::new(&env, &mut scope)
            .transform(&module)
            .expect("simplify");
        assert_eq!(pretty_string(&out), "x : Int = 10\n");
    }

    #[test]
    fn inlined_binders_avoid_surviving_module_names() {
        // The session lambda's parameter shares its name with a let that
        // survives simplification; freshening must step past it.
        let mut earlier = FreshScope::new();
        let taken = earlier.fresh("tmp");
        let env: TopEnv = [(
            Name::source("f"),
            Binding::Value {
                ty: Ty::Arrow(Box::new(Ty::Int), Box::new(Ty::Int)),
                atom: Atom::Lam {
                    param: taken.clone(),
                    param_ty: Ty::Int,
                    body: Box::new(Expr::BinOp(
                        BinOp::Add,
                        Box::new(Expr::var(taken.clone())),
                        Box::new(Expr::lit(Lit::Int(1))),
                    )),
                },
            },
        )]
        .into_iter()
        .collect();
        let module = Module {
            externs: vec![(
                Name::source("f"),
                Ty::Arrow(Box::new(Ty::Int), Box::new(Ty::Int)),
            )],
            decls: vec![Decl {
                name: Name::source("x"),
                ty: Ty::Int,
                expr: Expr::Let {
                    name: taken.clone(),
                    ty: Ty::Int,
                    rhs: Box::new(Expr::BinOp(
                        BinOp::Div,
                        Box::new(Expr::lit(Lit::Int(1))),
                        Box::new(Expr::lit(Lit::Int(0))),
                    )),
                    body: Box::new(Expr::App(
                        Box::new(Expr::var(Name::source("f"))),
                        Box::new(Expr::var(taken)),
                    )),
                },
            }],
        };
        let mut scope = FreshScope::new();
        let out = Simplify::new(&env, &mut scope)
            .transform(&module)
            .expect("simplify");
        assert_eq!(
            pretty_string(&out),
            "x : Int = let tmp.1:Int = (1 / 0) in tmp.1 + 1\n"
        );
        check::check_module(&out).expect("checker accepts simplified module");
    }

    #[test]
    fn output_still_typechecks() {
        let env = TopEnv::new();
        let module = anf_module(&env, "x = (\\y. y * y) 3\nz = x + 1\n");
        let mut scope = FreshScope::new();
        let out = Simplify::new(&env, &mut scope)
            .transform(&module)
            .expect("simplify");
        check::check_module(&out).expect("checker accepts simplified module");
    }
}

