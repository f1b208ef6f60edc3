//! Dex command-line driver: evaluates a script block by block, or runs a
//! line-oriented REPL against an accumulating session environment.

use clap::Parser;
use dex_core::block::BlockResult;
use dex_core::env::TopEnv;
use dex_pipeline::{eval_source, Backend};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "dex", version, about = "Compiler and interactive evaluator for Dex")]
struct Cli {
    /// Script to evaluate; starts a REPL when omitted.
    script: Option<PathBuf>,

    /// Use the reserved interpreter backend instead of the JIT.
    #[arg(long)]
    interp: bool,

    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let backend = if cli.interp {
        Backend::Interp
    } else {
        Backend::Jit
    };
    let outcome = match &cli.script {
        Some(path) => run_script(backend, path),
        None => run_repl(backend),
    };
    match outcome {
        Ok(clean) if clean => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("dex: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Print a block's outputs and error, returning whether it succeeded.
fn report(result: &BlockResult) -> bool {
    for output in &result.outputs {
        println!("{output}");
    }
    match &result.err {
        Some(err) => {
            eprintln!("{err}");
            false
        }
        None => true,
    }
}

fn run_script(backend: Backend, path: &PathBuf) -> io::Result<bool> {
    let source = std::fs::read_to_string(path)?;
    let mut env = TopEnv::new();
    let mut clean = true;
    for (_block, result) in eval_source(backend, &mut env, &source) {
        clean &= report(&result);
    }
    Ok(clean)
}

fn run_repl(backend: Backend) -> io::Result<bool> {
    let stdin = io::stdin();
    let mut env = TopEnv::new();
    print_prompt()?;
    for line in stdin.lock().lines() {
        let line = line?;
        if !line.trim().is_empty() {
            for (_block, result) in eval_source(backend, &mut env, &line) {
                report(&result);
            }
        }
        print_prompt()?;
    }
    println!();
    Ok(true)
}

fn print_prompt() -> io::Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, ">=> ")?;
    stdout.flush()
}
