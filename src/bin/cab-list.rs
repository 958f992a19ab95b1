use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Lists the folders and files in a cabinet archive.
#[derive(Parser)]
#[command(name = "cab-list", version, about)]
struct Args {
    /// Path to the cabinet archive.
    archive: PathBuf,
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

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    match cabkit::ops::list(&args.archive, &mut handle) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("cab-list: {err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
