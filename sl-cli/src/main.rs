use anyhow::Context;
use clap::Parser;
use sl_compiler::{compile_to_llvm, compile_to_tcode, CompileError};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "slc")]
#[command(about = "Compiler for the SL language, targeting LLVM IR")]
struct Args {
    /// Path to the source file to compile
    file: PathBuf,

    /// Emit three-address code instead of LLVM IR
    #[arg(long)]
    tcode: bool,

    /// Emit LLVM IR (the default)
    #[arg(long)]
    llvm: bool,

    /// Write the output to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Semantic diagnostics print one per line; everything else
            // as a single message.
            match err.downcast_ref::<CompileError>() {
                Some(CompileError::Semantic { errors }) => {
                    for diagnostic in errors {
                        eprintln!("{}", diagnostic);
                    }
                }
                _ => eprintln!("Error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let source = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read '{}'", args.file.display()))?;

    let want_tcode = args.tcode && !args.llvm;

    let output = if want_tcode {
        let (_, code) = compile_to_tcode(&source)?;
        code.to_string()
    } else {
        compile_to_llvm(&source)?
    };

    match &args.output {
        Some(path) => fs::write(path, output)
            .with_context(|| format!("failed to write '{}'", path.display()))?,
        None => print!("{}", output),
    }
    Ok(())
}
