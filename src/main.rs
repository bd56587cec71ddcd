use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;
use whiten::{DEFAULT_COLOR, DEFAULT_SUFFIX, Options, WhitenError, discover, run};

#[derive(Parser)]
#[command(name = "whiten")]
#[command(about = "Set fill=\"#ffffff\" on all SVG shapes", long_about = None)]
struct Cli {
    /// SVG file or directory of SVG files
    input: PathBuf,

    /// Overwrite files in place (default: write *_white.svg copies)
    #[arg(long)]
    inplace: bool,

    /// Descend into subdirectories (for a directory input)
    #[arg(short, long)]
    recursive: bool,

    /// Fill value to write
    #[arg(long, default_value = DEFAULT_COLOR)]
    color: String,

    /// Suffix for recolored copies
    #[arg(long, default_value = DEFAULT_SUFFIX)]
    suffix: String,

    /// Log more (repeat for debug output)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run_cli(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: &Cli) -> Result<(), WhitenError> {
    let files = discover(&cli.input, cli.recursive)?;
    if files.is_empty() {
        println!("No SVG files found");
        return Ok(());
    }

    let options = Options {
        overwrite: cli.inplace,
        color: cli.color.clone(),
        suffix: cli.suffix.clone(),
    };

    let summary = run(&files, &options)?;
    println!(
        "Done: changed {} of {} files.",
        summary.changed, summary.total
    );

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}
