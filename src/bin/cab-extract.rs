use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Extracts every file in a cabinet archive into a destination directory.
#[derive(Parser)]
#[command(name = "cab-extract", version, about)]
struct Args {
    /// Path to the cabinet archive.
    archive: PathBuf,
    /// Directory to extract into; created (mode 0755) if it does not exist.
    dest_dir: PathBuf,
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

    match cabkit::ops::extract(&args.archive, &args.dest_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("cab-extract: {err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
