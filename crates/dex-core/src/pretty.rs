//! Pretty-printing for intermediate representations.
//!
//! Every IR admits a total pretty-print; the pipeline renders each pass
//! result eagerly, so a printer that visits every node doubles as a cheap
//! structural sanity walk.

use crate::env::{Binding, TopEnv};
use crate::imp::{ImpModule, ImpOperand, ImpStmt};
use crate::ir::{Atom, BinOp, Expr, Module};
use crate::surface::{FModule, UExpr, UExprKind};
use itertools::Itertools;
use std::fmt::{self, Formatter, Write as _};

#[derive(Debug, Clone)]
pub struct PrettyOptions {
    /// Number of spaces to indent per nesting level.
    pub indent_size: usize,
    /// Include type annotations where the IR carries them.
    pub show_types: bool,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        Self {
            indent_size: 2,
            show_types: true,
        }
    }
}

/// Formatting context shared across pretty printers.
pub struct PrettyCtx<'a> {
    pub options: &'a PrettyOptions,
    indent: usize,
}

impl<'a> PrettyCtx<'a> {
    pub fn new(options: &'a PrettyOptions) -> Self {
        Self { options, indent: 0 }
    }

    pub fn writeln(&self, f: &mut Formatter<'_>, line: impl AsRef<str>) -> fmt::Result {
        for _ in 0..self.indent {
            write!(f, " ")?;
        }
        writeln!(f, "{}", line.as_ref())
    }

    pub fn with_indent<F>(&mut self, mut body: F) -> fmt::Result
    where
        F: FnMut(&mut Self) -> fmt::Result,
    {
        self.indent += self.options.indent_size;
        let result = body(self);
        self.indent -= self.options.indent_size;
        result
    }
}

/// Trait implemented by IR nodes that support pretty-printing.
pub trait PrettyPrintable {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result;
}

/// Helper wrapper implementing `Display` by delegating to `PrettyPrintable`.
pub struct PrettyDisplay<'a, T> {
    value: &'a T,
    options: PrettyOptions,
}

impl<'a, T> fmt::Display for PrettyDisplay<'a, T>
where
    T: PrettyPrintable,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut ctx = PrettyCtx::new(&self.options);
        self.value.fmt_pretty(f, &mut ctx)
    }
}

pub fn pretty<T: PrettyPrintable>(value: &T) -> PrettyDisplay<'_, T> {
    PrettyDisplay {
        value,
        options: PrettyOptions::default(),
    }
}

pub fn pretty_with<T: PrettyPrintable>(value: &T, options: PrettyOptions) -> PrettyDisplay<'_, T> {
    PrettyDisplay { value, options }
}

/// Render to an owned string, forcing a full traversal of the value.
pub fn pretty_string<T: PrettyPrintable>(value: &T) -> String {
    pretty(value).to_string()
}

// ---------------------------------------------------------------------------
// Surface IR

fn write_uexpr(buf: &mut String, expr: &UExpr, nested: bool) {
    match &expr.kind {
        UExprKind::Lit(lit) => {
            let _ = write!(buf, "{lit}");
        }
        UExprKind::Var(name) => {
            let _ = write!(buf, "{name}");
        }
        UExprKind::BinOp(op, lhs, rhs) => {
            if nested {
                buf.push('(');
            }
            write_uexpr(buf, lhs, true);
            let _ = write!(buf, " {op} ");
            write_uexpr(buf, rhs, true);
            if nested {
                buf.push(')');
            }
        }
        UExprKind::Lam { param, body } => {
            if nested {
                buf.push('(');
            }
            let _ = write!(buf, "\\{param}. ");
            write_uexpr(buf, body, false);
            if nested {
                buf.push(')');
            }
        }
        UExprKind::App(func, arg) => {
            if nested {
                buf.push('(');
            }
            write_uexpr(buf, func, true);
            buf.push(' ');
            write_uexpr(buf, arg, true);
            if nested {
                buf.push(')');
            }
        }
        UExprKind::If(cond, then, els) => {
            if nested {
                buf.push('(');
            }
            buf.push_str("if ");
            write_uexpr(buf, cond, true);
            buf.push_str(" then ");
            write_uexpr(buf, then, true);
            buf.push_str(" else ");
            write_uexpr(buf, els, true);
            if nested {
                buf.push(')');
            }
        }
        UExprKind::Let { name, rhs, body } => {
            if nested {
                buf.push('(');
            }
            let _ = write!(buf, "let {name} = ");
            write_uexpr(buf, rhs, true);
            buf.push_str(" in ");
            write_uexpr(buf, body, false);
            if nested {
                buf.push(')');
            }
        }
    }
}

impl PrettyPrintable for FModule {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
        for (name, ty, _) in &self.ty_aliases {
            ctx.writeln(f, format!("type {name} = {ty}"))?;
        }
        for decl in &self.decls {
            let mut line = String::new();
            match (&decl.ann, ctx.options.show_types) {
                (Some(ty), true) => {
                    let _ = write!(line, "{} : {} = ", decl.name, ty);
                }
                _ => {
                    let _ = write!(line, "{} = ", decl.name);
                }
            }
            write_uexpr(&mut line, &decl.expr, false);
            ctx.writeln(f, line)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Typed core IR

fn write_atom(buf: &mut String, atom: &Atom, nested: bool) {
    match atom {
        Atom::Lit(lit) => {
            let _ = write!(buf, "{lit}");
        }
        Atom::Var(name) => {
            let _ = write!(buf, "{name}");
        }
        Atom::Lam {
            param,
            param_ty,
            body,
        } => {
            if nested {
                buf.push('(');
            }
            let _ = write!(buf, "\\{param}:{param_ty}. ");
            write_expr(buf, body, false);
            if nested {
                buf.push(')');
            }
        }
    }
}

fn write_expr(buf: &mut String, expr: &Expr, nested: bool) {
    match expr {
        Expr::Atom(atom) => write_atom(buf, atom, nested),
        Expr::BinOp(op, lhs, rhs) => {
            if nested {
                buf.push('(');
            }
            write_expr(buf, lhs, true);
            let _ = write!(buf, " {op} ");
            write_expr(buf, rhs, true);
            if nested {
                buf.push(')');
            }
        }
        Expr::App(func, arg) => {
            if nested {
                buf.push('(');
            }
            write_expr(buf, func, true);
            buf.push(' ');
            write_expr(buf, arg, true);
            if nested {
                buf.push(')');
            }
        }
        Expr::If(cond, then, els) => {
            if nested {
                buf.push('(');
            }
            buf.push_str("if ");
            write_expr(buf, cond, true);
            buf.push_str(" then ");
            write_expr(buf, then, true);
            buf.push_str(" else ");
            write_expr(buf, els, true);
            if nested {
                buf.push(')');
            }
        }
        Expr::Let {
            name,
            ty,
            rhs,
            body,
        } => {
            if nested {
                buf.push('(');
            }
            let _ = write!(buf, "let {name}:{ty} = ");
            write_expr(buf, rhs, true);
            buf.push_str(" in ");
            write_expr(buf, body, false);
            if nested {
                buf.push(')');
            }
        }
    }
}

impl PrettyPrintable for Module {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
        if ctx.options.show_types && !self.externs.is_empty() {
            let externs = self
                .externs
                .iter()
                .map(|(name, ty)| format!("{name} : {ty}"))
                .join(", ");
            ctx.writeln(f, format!("extern {externs}"))?;
        }
        for decl in &self.decls {
            let mut line = String::new();
            if ctx.options.show_types {
                let _ = write!(line, "{} : {} = ", decl.name, decl.ty);
            } else {
                let _ = write!(line, "{} = ", decl.name);
            }
            write_expr(&mut line, &decl.expr, false);
            ctx.writeln(f, line)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Environments

impl PrettyPrintable for TopEnv {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
        for (name, binding) in self.iter() {
            match binding {
                Binding::Value { ty, atom } => {
                    let mut line = String::new();
                    if ctx.options.show_types {
                        let _ = write!(line, "{name} : {ty} = ");
                    } else {
                        let _ = write!(line, "{name} = ");
                    }
                    write_atom(&mut line, atom, false);
                    ctx.writeln(f, line)?;
                }
                Binding::TyAlias(ty) => {
                    ctx.writeln(f, format!("type {name} = {ty}"))?;
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Imperative IR

fn mnemonic(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "add",
        BinOp::Sub => "sub",
        BinOp::Mul => "mul",
        BinOp::Div => "div",
        BinOp::Less => "lt",
        BinOp::Greater => "gt",
        BinOp::Equal => "eq",
    }
}

fn write_operand(buf: &mut String, operand: &ImpOperand) {
    match operand {
        ImpOperand::Cell(id) => {
            let _ = write!(buf, "%{id}");
        }
        ImpOperand::Imm(lit) => {
            let _ = write!(buf, "{lit}");
        }
    }
}

impl PrettyPrintable for ImpModule {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
        for stmt in &self.stmts {
            let mut line = String::new();
            match stmt {
                ImpStmt::Alloc { dest, ty } => {
                    let _ = write!(line, "%{dest} = alloc {ty}");
                }
                ImpStmt::Store { dest, src } => {
                    let _ = write!(line, "%{dest} = store ");
                    write_operand(&mut line, src);
                }
                ImpStmt::BinOp { dest, op, lhs, rhs } => {
                    let _ = write!(line, "%{dest} = {} ", mnemonic(*op));
                    write_operand(&mut line, lhs);
                    line.push_str(", ");
                    write_operand(&mut line, rhs);
                }
                ImpStmt::Select {
                    dest,
                    cond,
                    then_src,
                    else_src,
                } => {
                    let _ = write!(line, "%{dest} = select ");
                    write_operand(&mut line, cond);
                    line.push_str(", ");
                    write_operand(&mut line, then_src);
                    line.push_str(", ");
                    write_operand(&mut line, else_src);
                }
            }
            ctx.writeln(f, line)?;
        }
        for (name, ty, cell) in &self.exports {
            if ctx.options.show_types {
                ctx.writeln(f, format!("out {name} : {ty} <- %{cell}"))?;
            } else {
                ctx.writeln(f, format!("out {name} <- %{cell}"))?;
            }
        }
        Ok(())
    }
}
