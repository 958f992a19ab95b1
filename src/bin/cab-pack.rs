use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Packs files listed in a manifest into a new cabinet archive.
#[derive(Parser)]
#[command(name = "cab-pack", version, about)]
struct Args {
    /// Path to the manifest file (`<folder_index>,<source_path>` per line).
    manifest: PathBuf,
    /// Deflate compression level, 0 (stored-ish, fastest) through 9 (smallest).
    #[arg(value_parser = clap::value_parser!(u32).range(0..=9))]
    level: u32,
    /// Path the new archive is written to.
    output: PathBuf,
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

    match cabkit::ops::pack(&args.manifest, args.level, &args.output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("cab-pack: {err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
