//! Imperative IR: the input to the JIT backend.
//!
//! A program is a linear sequence of statements over scalar cells. Cells
//! are allocated up front, written exactly once, and read after their
//! defining statement. Exported cells carry the top-level names whose
//! values the backend reads back after execution.

use crate::ir::{BinOp, Lit, Ty};
use crate::name::Name;

pub type CellId = u32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImpOperand {
    Cell(CellId),
    Imm(Lit),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImpStmt {
    /// Reserve a cell for a value of scalar type `ty`.
    Alloc { dest: CellId, ty: Ty },
    Store { dest: CellId, src: ImpOperand },
    BinOp {
        dest: CellId,
        op: BinOp,
        lhs: ImpOperand,
        rhs: ImpOperand,
    },
    /// `dest := if cond then then_src else else_src`.
    Select {
        dest: CellId,
        cond: ImpOperand,
        then_src: ImpOperand,
        else_src: ImpOperand,
    },
}

impl ImpStmt {
    pub fn dest(&self) -> CellId {
        match self {
            ImpStmt::Alloc { dest, .. }
            | ImpStmt::Store { dest, .. }
            | ImpStmt::BinOp { dest, .. }
            | ImpStmt::Select { dest, .. } => *dest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImpModule {
    pub stmts: Vec<ImpStmt>,
    /// Top-level names to read back after execution, with their types.
    pub exports: Vec<(Name, Ty, CellId)>,
}

impl ImpModule {
    pub fn empty() -> ImpModule {
        ImpModule::default()
    }

    pub fn cell_count(&self) -> usize {
        self.stmts
            .iter()
            .map(|s| s.dest() as usize + 1)
            .max()
            .unwrap_or(0)
    }
}
