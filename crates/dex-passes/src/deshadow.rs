//! Shadow elimination: alpha-rename local binders so that every name in a
//! module is bound at most once, and reject references to names bound
//! neither locally nor in the session environment.

use dex_core::env::TopEnv;
use dex_core::error::{Error, Result};
use dex_core::name::{FreshScope, Name};
use dex_core::surface::{FModule, UDecl, UExpr, UExprKind};
use std::collections::{HashMap, HashSet};

pub struct Deshadow<'a> {
    scope: &'a mut FreshScope,
    /// Top-level names visible so far: session bindings plus the module's
    /// earlier declarations.
    top: HashSet<Name>,
}

impl<'a> Deshadow<'a> {
    pub fn new(env: &'a TopEnv, scope: &'a mut FreshScope) -> Self {
        let top = env.names().cloned().collect();
        Deshadow { scope, top }
    }

    pub fn transform(&mut self, module: &FModule) -> Result<FModule> {
        let mut seen = HashSet::new();
        for (name, _, span) in &module.ty_aliases {
            if !seen.insert(name.clone()) {
                return Err(Error::ty(format!("repeated binding of {name}")).with_span(*span));
            }
        }
        let mut decls = Vec::with_capacity(module.decls.len());
        for decl in &module.decls {
            if !seen.insert(decl.name.clone()) {
                return Err(
                    Error::ty(format!("repeated binding of {}", decl.name)).with_span(decl.span)
                );
            }
            let expr = self.rename(&decl.expr, &HashMap::new())?;
            self.top.insert(decl.name.clone());
            decls.push(UDecl {
                name: decl.name.clone(),
                ann: decl.ann.clone(),
                expr,
                span: decl.span,
            });
        }
        tracing::debug!(decls = decls.len(), "deshadowed module");
        Ok(FModule {
            ty_aliases: module.ty_aliases.clone(),
            decls,
        })
    }

    fn rename(&mut self, expr: &UExpr, subst: &HashMap<Name, Name>) -> Result<UExpr> {
        let kind = match &expr.kind {
            UExprKind::Lit(lit) => UExprKind::Lit(*lit),
            UExprKind::Var(name) => match subst.get(name) {
                Some(renamed) => UExprKind::Var(renamed.clone()),
                None if self.top.contains(name) => UExprKind::Var(name.clone()),
                None => return Err(Error::unbound(name).with_span(expr.span)),
            },
            UExprKind::BinOp(op, lhs, rhs) => UExprKind::BinOp(
                *op,
                Box::new(self.rename(lhs, subst)?),
                Box::new(self.rename(rhs, subst)?),
            ),
            UExprKind::Lam { param, body } => {
                let fresh = self.scope.rename(param);
                let mut inner = subst.clone();
                inner.insert(param.clone(), fresh.clone());
                UExprKind::Lam {
                    param: fresh,
                    body: Box::new(self.rename(body, &inner)?),
                }
            }
            UExprKind::App(func, arg) => UExprKind::App(
                Box::new(self.rename(func, subst)?),
                Box::new(self.rename(arg, subst)?),
            ),
            UExprKind::If(cond, then, els) => UExprKind::If(
                Box::new(self.rename(cond, subst)?),
                Box::new(self.rename(then, subst)?),
                Box::new(self.rename(els, subst)?),
            ),
            UExprKind::Let { name, rhs, body } => {
                let rhs = self.rename(rhs, subst)?;
                let fresh = self.scope.rename(name);
                let mut inner = subst.clone();
                inner.insert(name.clone(), fresh.clone());
                UExprKind::Let {
                    name: fresh,
                    rhs: Box::new(rhs),
                    body: Box::new(self.rename(body, &inner)?),
                }
            }
        };
        Ok(UExpr::new(kind, expr.span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dex_core::frontend::parse_block;
    use dex_core::block::BlockKind;
    use pretty_assertions::assert_eq;

    fn module_of(src: &str) -> FModule {
        match parse_block(src, 0) {
            BlockKind::RunModule(module) => module,
            other => panic!("expected module, got {other:?}"),
        }
    }

    #[test]
    fn renames_shadowing_binders() {
        let module = module_of("x = let y = 1 in let y = 2 in y\n");
        let mut scope = FreshScope::new();
        let out = Deshadow::new(&TopEnv::new(), &mut scope)
            .transform(&module)
            .expect("deshadow");
        let printed = dex_core::pretty::pretty_string(&out);
        assert_eq!(printed, "x = let y.1 = 1 in let y.2 = 2 in y.2\n");
    }

    #[test]
    fn rejects_unbound_variables_with_span() {
        let module = module_of("x = y + 1\n");
        let mut scope = FreshScope::new();
        let err = Deshadow::new(&TopEnv::new(), &mut scope)
            .transform(&module)
            .expect_err("y is unbound");
        assert_eq!(err.kind, dex_core::ErrorKind::UnboundVar);
        assert_eq!(err.span, Some(dex_core::Span::new(4, 5)));
    }

    #[test]
    fn rejects_repeated_top_level_names() {
        let module = module_of("x = 1\nx = 2\n");
        let mut scope = FreshScope::new();
        let err = Deshadow::new(&TopEnv::new(), &mut scope)
            .transform(&module)
            .expect_err("repeated binding");
        assert_eq!(err.kind, dex_core::ErrorKind::Type);
    }

    #[test]
    fn later_decls_see_earlier_ones() {
        let module = module_of("x = 1\ny = x + 1\n");
        let mut scope = FreshScope::new();
        Deshadow::new(&TopEnv::new(), &mut scope)
            .transform(&module)
            .expect("deshadow");
    }
}
