//! CLI tool to run a line pipeline against a file or stdin.
//!
//! Usage:
//!   unix-stream 'grep a | sort | uniq | nl' -i input.txt
//!   unix-stream 'grep a | sort | uniq | nl' -i input.txt -o output.txt
//!
//! If no input file is given, reads stdin. If no output file is given,
//! writes to stdout.

use clap::Parser;
use log::{LevelFilter, debug};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use unix_stream::{Pipeline, PipelineError, WriterSink, build_pipeline, file};

/// Run a Unix-style line pipeline.
#[derive(Parser)]
#[command(name = "unix-stream")]
struct Cli {
    /// Pipeline text, e.g. "grep a | sort | uniq | nl"
    pipeline: String,

    /// Read lines from this file instead of stdin
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log progress on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(cli: &Cli) -> Result<usize, PipelineError> {
    let stdin = io::stdin();
    let source = match &cli.input {
        Some(path) => Pipeline::from_file(path)?,
        None => Pipeline::from_reader(stdin.lock(), "stdin"),
    };

    let pipeline = build_pipeline(source, &cli.pipeline)?;
    debug!("stages: {:?}", pipeline.stage_names());

    match &cli.output {
        Some(out_path) => {
            if let Some(parent) = Path::new(out_path).parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)
                    .map_err(|e| PipelineError::io(parent.display().to_string(), e))?;
            }
            pipeline.to(file(out_path))
        }
        None => pipeline.to(WriterSink::new(io::stdout().lock(), "stdout")),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(count) => {
            if let Some(out_path) = &cli.output {
                eprintln!("Processed {count} lines, output: {}", out_path.display());
            } else {
                eprintln!("Processed {count} lines");
            }
        }
        Err(e) => {
            eprintln!("Pipeline error: {e}");
            process::exit(1);
        }
    }
}
