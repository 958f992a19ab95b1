use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Rewrites the mutable header/file fields of a target archive from a
/// structurally identical reference archive.
#[derive(Parser)]
#[command(name = "cab-clone", version, about)]
struct Args {
    /// Reference archive; fields are copied from here.
    reference: PathBuf,
    /// Target archive; patched in place.
    target: PathBuf,
}

fn main() -> ExitCode {
    cabkit::init_logging();
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(1);
        }
    };

    match cabkit::ops::clone(&args.reference, &args.target) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("cab-clone: {err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
