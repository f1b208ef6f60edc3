//! Compile-and-run execution of imperative modules.
//!
//! The compile step resolves every statement into a flat instruction
//! buffer over a cell store; execution then runs the buffer straight
//! through. Exported cells are read back as literal bindings for the
//! session environment.

use dex_core::env::{Binding, TopEnv};
use dex_core::error::{Error, Result};
use dex_core::imp::{CellId, ImpModule, ImpOperand, ImpStmt};
use dex_core::ir::{Atom, BinOp, Lit, Ty};
use dex_core::name::Name;
use tracing::debug_span;

#[derive(Debug, Default)]
pub struct JitBackend;

/// A compiled program: instructions plus the exports to read back.
struct Program {
    cell_count: usize,
    instrs: Vec<ImpStmt>,
    exports: Vec<(Name, Ty, CellId)>,
}

impl JitBackend {
    pub fn new() -> Self {
        JitBackend
    }

    /// Execute `module` and return the environment delta it produces.
    pub fn eval(&self, module: &ImpModule) -> Result<TopEnv> {
        let program = self.compile(module)?;
        let _span = debug_span!("jit", cells = program.cell_count).entered();
        let cells = run(&program)?;
        let mut delta = TopEnv::new();
        for (name, ty, cell) in &program.exports {
            let lit = read_cell(&cells, *cell)?;
            if lit.ty() != *ty {
                return Err(Error::compiler(format!(
                    "export {name} expected {ty} but computed {}",
                    lit.ty()
                )));
            }
            delta.insert(
                name.clone(),
                Binding::Value {
                    ty: ty.clone(),
                    atom: Atom::Lit(lit),
                },
            );
        }
        tracing::debug!(exports = delta.len(), "jit run complete");
        Ok(delta)
    }

    fn compile(&self, module: &ImpModule) -> Result<Program> {
        let cell_count = module.cell_count();
        for stmt in &module.stmts {
            if stmt.dest() as usize >= cell_count {
                return Err(Error::compiler("statement writes out-of-range cell"));
            }
        }
        Ok(Program {
            cell_count,
            instrs: module.stmts.clone(),
            exports: module.exports.clone(),
        })
    }
}

fn run(program: &Program) -> Result<Vec<Option<Lit>>> {
    let mut cells: Vec<Option<Lit>> = vec![None; program.cell_count];
    for instr in &program.instrs {
        match instr {
            ImpStmt::Alloc { .. } => {}
            ImpStmt::Store { dest, src } => {
                cells[*dest as usize] = Some(read_operand(&cells, src)?);
            }
            ImpStmt::BinOp { dest, op, lhs, rhs } => {
                let lhs = read_operand(&cells, lhs)?;
                let rhs = read_operand(&cells, rhs)?;
                cells[*dest as usize] = Some(apply(*op, lhs, rhs)?);
            }
            ImpStmt::Select {
                dest,
                cond,
                then_src,
                else_src,
            } => {
                let taken = match read_operand(&cells, cond)? {
                    Lit::Bool(true) => then_src,
                    Lit::Bool(false) => else_src,
                    other => {
                        return Err(Error::compiler(format!(
                            "select condition evaluated to {other}"
                        )));
                    }
                };
                cells[*dest as usize] = Some(read_operand(&cells, taken)?);
            }
        }
    }
    Ok(cells)
}

fn read_operand(cells: &[Option<Lit>], operand: &ImpOperand) -> Result<Lit> {
    match operand {
        ImpOperand::Imm(lit) => Ok(*lit),
        ImpOperand::Cell(cell) => read_cell(cells, *cell),
    }
}

fn read_cell(cells: &[Option<Lit>], cell: CellId) -> Result<Lit> {
    cells
        .get(cell as usize)
        .copied()
        .flatten()
        .ok_or_else(|| Error::compiler(format!("read of unwritten cell %{cell}")))
}

fn apply(op: BinOp, lhs: Lit, rhs: Lit) -> Result<Lit> {
    match (lhs, rhs) {
        (Lit::Int(a), Lit::Int(b)) => Ok(match op {
            BinOp::Add => Lit::Int(a.wrapping_add(b)),
            BinOp::Sub => Lit::Int(a.wrapping_sub(b)),
            BinOp::Mul => Lit::Int(a.wrapping_mul(b)),
            BinOp::Div => {
                if b == 0 {
                    return Err(Error::runtime("integer division by zero"));
                }
                Lit::Int(a.wrapping_div(b))
            }
            BinOp::Less => Lit::Bool(a < b),
            BinOp::Greater => Lit::Bool(a > b),
            BinOp::Equal => Lit::Bool(a == b),
        }),
        (Lit::Float(a), Lit::Float(b)) => Ok(match op {
            BinOp::Add => Lit::Float(a + b),
            BinOp::Sub => Lit::Float(a - b),
            BinOp::Mul => Lit::Float(a * b),
            BinOp::Div => Lit::Float(a / b),
            BinOp::Less => Lit::Bool(a < b),
            BinOp::Greater => Lit::Bool(a > b),
            BinOp::Equal => Lit::Bool(a == b),
        }),
        (Lit::Bool(a), Lit::Bool(b)) if op == BinOp::Equal => Ok(Lit::Bool(a == b)),
        (lhs, rhs) => Err(Error::compiler(format!(
            "{op} applied to {lhs} and {rhs}"
        ))),
    }
}
