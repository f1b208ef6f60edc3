//! IR checkers, run as pass post-conditions.
//!
//! Checkers report `Compiler` errors: by the time an IR reaches a checker
//! it has already been accepted by type inference, so any violation is an
//! internal invariant failure, not a user mistake.

use dex_core::error::{Error, Result};
use dex_core::imp::{ImpModule, ImpOperand, ImpStmt};
use dex_core::ir::{Atom, Expr, Module, Ty};
use dex_core::name::Name;
use std::collections::{HashMap, HashSet};

/// Reconstruct and verify the type of an atom under `scope`.
pub fn atom_ty(scope: &HashMap<Name, Ty>, atom: &Atom) -> Result<Ty> {
    match atom {
        Atom::Lit(lit) => Ok(lit.ty()),
        Atom::Var(name) => scope
            .get(name)
            .cloned()
            .ok_or_else(|| Error::unbound(name)),
        Atom::Lam {
            param,
            param_ty,
            body,
        } => {
            let mut inner = scope.clone();
            inner.insert(param.clone(), param_ty.clone());
            let body_ty = expr_ty(&inner, body)?;
            Ok(Ty::Arrow(Box::new(param_ty.clone()), Box::new(body_ty)))
        }
    }
}

/// Reconstruct and verify the type of an expression under `scope`.
pub fn expr_ty(scope: &HashMap<Name, Ty>, expr: &Expr) -> Result<Ty> {
    match expr {
        Expr::Atom(atom) => atom_ty(scope, atom),
        Expr::BinOp(op, lhs, rhs) => {
            let lhs_ty = expr_ty(scope, lhs)?;
            let rhs_ty = expr_ty(scope, rhs)?;
            if lhs_ty != rhs_ty {
                return Err(Error::ty(format!(
                    "operands of {op} disagree: {lhs_ty} vs {rhs_ty}"
                )));
            }
            let numeric = matches!(lhs_ty, Ty::Int | Ty::Float);
            let ok = match op {
                dex_core::ir::BinOp::Equal => numeric || lhs_ty == Ty::Bool,
                _ => numeric,
            };
            if !ok {
                return Err(Error::ty(format!("{op} does not apply to {lhs_ty}")));
            }
            Ok(op.result_ty(&lhs_ty))
        }
        Expr::App(func, arg) => {
            let func_ty = expr_ty(scope, func)?;
            let arg_ty = expr_ty(scope, arg)?;
            match func_ty {
                Ty::Arrow(param, result) => {
                    if *param != arg_ty {
                        Err(Error::ty(format!(
                            "argument type {arg_ty} does not match parameter type {param}"
                        )))
                    } else {
                        Ok(*result)
                    }
                }
                other => Err(Error::ty(format!("applied non-function of type {other}"))),
            }
        }
        Expr::If(cond, then, els) => {
            let cond_ty = expr_ty(scope, cond)?;
            if cond_ty != Ty::Bool {
                return Err(Error::ty(format!("if condition has type {cond_ty}")));
            }
            let then_ty = expr_ty(scope, then)?;
            let else_ty = expr_ty(scope, els)?;
            if then_ty != else_ty {
                return Err(Error::ty(format!(
                    "if branches disagree: {then_ty} vs {else_ty}"
                )));
            }
            Ok(then_ty)
        }
        Expr::Let {
            name,
            ty,
            rhs,
            body,
        } => {
            let rhs_ty = expr_ty(scope, rhs)?;
            if rhs_ty != *ty {
                return Err(Error::ty(format!(
                    "binding {name} annotated {ty} but bound to {rhs_ty}"
                )));
            }
            let mut inner = scope.clone();
            inner.insert(name.clone(), ty.clone());
            expr_ty(&inner, body)
        }
    }
}

fn invariant(err: Error) -> Error {
    Error::compiler(err.to_string())
}

/// Post-condition for typed modules: every declaration's body has the type
/// the declaration claims, under the module's externs, and every local
/// binder is bound exactly once module-wide (deshadowing and freshening
/// guarantee this; a collision means a pass reissued a live name).
pub fn check_module(module: &Module) -> Result<()> {
    check_unique_binders(module)?;
    let mut scope: HashMap<Name, Ty> = module.externs.iter().cloned().collect();
    for decl in &module.decls {
        let ty = expr_ty(&scope, &decl.expr).map_err(invariant)?;
        if ty != decl.ty {
            return Err(Error::compiler(format!(
                "declaration {} claims type {} but body has type {ty}",
                decl.name, decl.ty
            )));
        }
        scope.insert(decl.name.clone(), decl.ty.clone());
    }
    Ok(())
}

fn check_unique_binders(module: &Module) -> Result<()> {
    // A declaration may shadow an extern of the same name, but not a
    // sibling declaration or any local binder.
    let mut top: HashSet<Name> = module.externs.iter().map(|(name, _)| name.clone()).collect();
    let mut binders = HashSet::new();
    let mut decl_names = HashSet::new();
    for decl in &module.decls {
        if !decl_names.insert(decl.name.clone()) {
            return Err(Error::compiler(format!(
                "declaration {} bound twice",
                decl.name
            )));
        }
        collect_binders(&decl.expr, &top, &mut binders)?;
        top.insert(decl.name.clone());
    }
    Ok(())
}

fn collect_binders(
    expr: &Expr,
    top: &HashSet<Name>,
    binders: &mut HashSet<Name>,
) -> Result<()> {
    let mut bind = |name: &Name, binders: &mut HashSet<Name>| -> Result<()> {
        if top.contains(name) {
            return Err(Error::compiler(format!(
                "binder {name} collides with a top-level name"
            )));
        }
        if !binders.insert(name.clone()) {
            return Err(Error::compiler(format!("binder {name} bound twice")));
        }
        Ok(())
    };
    match expr {
        Expr::Atom(Atom::Lam { param, body, .. }) => {
            bind(param, binders)?;
            collect_binders(body, top, binders)
        }
        Expr::Atom(_) => Ok(()),
        Expr::BinOp(_, lhs, rhs) | Expr::App(lhs, rhs) => {
            collect_binders(lhs, top, binders)?;
            collect_binders(rhs, top, binders)
        }
        Expr::If(cond, then, els) => {
            collect_binders(cond, top, binders)?;
            collect_binders(then, top, binders)?;
            collect_binders(els, top, binders)
        }
        Expr::Let {
            name, rhs, body, ..
        } => {
            bind(name, binders)?;
            collect_binders(rhs, top, binders)?;
            collect_binders(body, top, binders)
        }
    }
}

/// Post-condition for imperative modules: cells are allocated before they
/// are written, written before they are read, and statement types agree
/// with their allocation.
pub fn check_imp_module(module: &ImpModule) -> Result<()> {
    let mut allocated: HashMap<u32, Ty> = HashMap::new();
    let mut written: HashMap<u32, Ty> = HashMap::new();

    let operand_ty = |written: &HashMap<u32, Ty>, operand: &ImpOperand| -> Result<Ty> {
        match operand {
            ImpOperand::Imm(lit) => Ok(lit.ty()),
            ImpOperand::Cell(id) => written
                .get(id)
                .cloned()
                .ok_or_else(|| Error::compiler(format!("cell %{id} read before write"))),
        }
    };

    for stmt in &module.stmts {
        match stmt {
            ImpStmt::Alloc { dest, ty } => {
                if !ty.is_scalar() {
                    return Err(Error::compiler(format!(
                        "cell %{dest} allocated at non-scalar type {ty}"
                    )));
                }
                if allocated.insert(*dest, ty.clone()).is_some() {
                    return Err(Error::compiler(format!("cell %{dest} allocated twice")));
                }
            }
            ImpStmt::Store { dest, src } => {
                let src_ty = operand_ty(&written, src)?;
                record_write(&allocated, &mut written, *dest, src_ty)?;
            }
            ImpStmt::BinOp { dest, op, lhs, rhs } => {
                let lhs_ty = operand_ty(&written, lhs)?;
                let rhs_ty = operand_ty(&written, rhs)?;
                if lhs_ty != rhs_ty {
                    return Err(Error::compiler(format!(
                        "operands of {op} at %{dest} disagree: {lhs_ty} vs {rhs_ty}"
                    )));
                }
                record_write(&allocated, &mut written, *dest, op.result_ty(&lhs_ty))?;
            }
            ImpStmt::Select {
                dest,
                cond,
                then_src,
                else_src,
            } => {
                if operand_ty(&written, cond)? != Ty::Bool {
                    return Err(Error::compiler(format!(
                        "select at %{dest} has non-Bool condition"
                    )));
                }
                let then_ty = operand_ty(&written, then_src)?;
                let else_ty = operand_ty(&written, else_src)?;
                if then_ty != else_ty {
                    return Err(Error::compiler(format!(
                        "select arms at %{dest} disagree: {then_ty} vs {else_ty}"
                    )));
                }
                record_write(&allocated, &mut written, *dest, then_ty)?;
            }
        }
    }
    for (name, ty, cell) in &module.exports {
        match written.get(cell) {
            None => {
                return Err(Error::compiler(format!(
                    "export {name} reads unwritten cell %{cell}"
                )));
            }
            Some(written_ty) if written_ty != ty => {
                return Err(Error::compiler(format!(
                    "export {name} claims {ty} but cell %{cell} holds {written_ty}"
                )));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn record_write(
    allocated: &HashMap<u32, Ty>,
    written: &mut HashMap<u32, Ty>,
    dest: u32,
    ty: Ty,
) -> Result<()> {
    match allocated.get(&dest) {
        None => Err(Error::compiler(format!("cell %{dest} written before alloc"))),
        Some(alloc_ty) if *alloc_ty != ty => Err(Error::compiler(format!(
            "cell %{dest} allocated at {alloc_ty} but written at {ty}"
        ))),
        Some(_) => {
            written.insert(dest, ty);
            Ok(())
        }
    }
}
