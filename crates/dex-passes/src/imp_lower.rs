//! Destination-passing lowering of simplified ANF modules to the
//! imperative IR. Both arms of a conditional are materialized and selected
//! between; by this stage arms are scalar computations with no effects.

use dex_core::error::{Error, Result};
use dex_core::imp::{CellId, ImpModule, ImpOperand, ImpStmt};
use dex_core::ir::{Atom, Expr, Module, Ty};
use dex_core::name::Name;
use std::collections::HashMap;

#[derive(Default)]
pub struct ImpLower {
    stmts: Vec<ImpStmt>,
    next_cell: CellId,
    cells: HashMap<Name, ImpOperand>,
    cell_tys: HashMap<CellId, Ty>,
}

impl ImpLower {
    pub fn new() -> Self {
        ImpLower::default()
    }

    pub fn transform(&mut self, module: &Module) -> Result<ImpModule> {
        if !module.externs.is_empty() {
            return Err(Error::compiler(
                "externs survived simplification in imperative lowering",
            ));
        }
        let mut exports = Vec::with_capacity(module.decls.len());
        for decl in &module.decls {
            if !decl.ty.is_scalar() {
                return Err(Error::compiler(format!(
                    "declaration {} has non-scalar type {} in imperative lowering",
                    decl.name, decl.ty
                )));
            }
            let operand = self.lower(&decl.expr)?;
            let cell = self.materialize(operand, &decl.ty);
            self.cells.insert(decl.name.clone(), ImpOperand::Cell(cell));
            exports.push((decl.name.clone(), decl.ty.clone(), cell));
        }
        Ok(ImpModule {
            stmts: std::mem::take(&mut self.stmts),
            exports,
        })
    }

    fn alloc(&mut self, ty: Ty) -> CellId {
        let dest = self.next_cell;
        self.next_cell += 1;
        self.cell_tys.insert(dest, ty.clone());
        self.stmts.push(ImpStmt::Alloc { dest, ty });
        dest
    }

    /// Ensure an operand lives in a cell, so it can be exported.
    fn materialize(&mut self, operand: ImpOperand, ty: &Ty) -> CellId {
        match operand {
            ImpOperand::Cell(cell) => cell,
            imm @ ImpOperand::Imm(_) => {
                let dest = self.alloc(ty.clone());
                self.stmts.push(ImpStmt::Store { dest, src: imm });
                dest
            }
        }
    }

    fn operand_ty(&self, operand: &ImpOperand) -> Result<Ty> {
        match operand {
            ImpOperand::Imm(lit) => Ok(lit.ty()),
            ImpOperand::Cell(cell) => self
                .cell_tys
                .get(cell)
                .cloned()
                .ok_or_else(|| Error::compiler(format!("cell %{cell} has no recorded type"))),
        }
    }

    fn lower(&mut self, expr: &Expr) -> Result<ImpOperand> {
        match expr {
            Expr::Atom(Atom::Lit(lit)) => Ok(ImpOperand::Imm(*lit)),
            Expr::Atom(Atom::Var(name)) => self
                .cells
                .get(name)
                .copied()
                .ok_or_else(|| Error::compiler(format!("{name} has no cell"))),
            Expr::Atom(Atom::Lam { .. }) => {
                Err(Error::compiler("lambda survived simplification"))
            }
            Expr::App(_, _) => Err(Error::compiler("application survived simplification")),
            Expr::BinOp(op, lhs, rhs) => {
                let lhs = self.lower(lhs)?;
                let rhs = self.lower(rhs)?;
                let operand_ty = self.operand_ty(&lhs)?;
                let dest = self.alloc(op.result_ty(&operand_ty));
                self.stmts.push(ImpStmt::BinOp {
                    dest,
                    op: *op,
                    lhs,
                    rhs,
                });
                Ok(ImpOperand::Cell(dest))
            }
            Expr::If(cond, then, els) => {
                let cond = self.lower(cond)?;
                let then_src = self.lower(then)?;
                let else_src = self.lower(els)?;
                let dest = self.alloc(self.operand_ty(&then_src)?);
                self.stmts.push(ImpStmt::Select {
                    dest,
                    cond,
                    then_src,
                    else_src,
                });
                Ok(ImpOperand::Cell(dest))
            }
            Expr::Let {
                name, rhs, body, ..
            } => {
                let rhs = self.lower(rhs)?;
                self.cells.insert(name.clone(), rhs);
                self.lower(body)
            }
        }
    }
}
