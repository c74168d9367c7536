use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use shelf_index::run_file;

/// Batch driver for the shelf index: executes a command script and
/// writes the transcript next to it as `<stem>_output_file.txt`.
#[derive(Parser)]
#[command(name = "shelf-index", version, about)]
struct Args {
    /// Command script, one `Operation(arg1, arg2, ...)` per line.
    input: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run_file(&args.input) {
        Ok(path) => {
            println!("transcript written to {}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}: {}", args.input.display(), err);
            ExitCode::FAILURE
        }
    }
}
