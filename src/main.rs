use std::{collections::HashMap, fs, path::PathBuf, process::ExitCode};

use clap::Parser;
use tokline::{interpreter::evaluator::core::Config, run_with};
use tracing_subscriber::{EnvFilter, fmt};

/// tokline runs scripts written in a small, statically typed imperative
/// language by reducing each statement's tokens in priority order.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Read the script from this file instead of the command line.
    #[arg(short, long, conflicts_with = "contents")]
    file: Option<PathBuf>,

    /// Define a property readable with `system property "key"`.
    #[arg(short = 'D', value_name = "KEY=VALUE", value_parser = parse_property)]
    define: Vec<(String, String)>,

    /// The script source.
    #[arg(required_unless_present = "file")]
    contents: Option<String>,
}

fn parse_property(arg: &str) -> Result<(String, String), String> {
    arg.split_once('=')
       .map(|(key, value)| (key.trim().to_string(), value.to_string()))
       .ok_or_else(|| format!("expected KEY=VALUE but found '{arg}'"))
}

fn main() -> ExitCode {
    let args = Args::parse();

    // RUST_LOG controls the level; default to warnings only.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter)
         .with_writer(std::io::stderr)
         .with_target(false)
         .init();

    let script = match (&args.file, args.contents) {
        (Some(path), _) => match fs::read_to_string(path) {
            Ok(script) => script,
            Err(e) => {
                eprintln!("Failed to read the input file '{}': {e}", path.display());
                return ExitCode::FAILURE;
            },
        },
        (None, Some(contents)) => contents,
        (None, None) => return ExitCode::FAILURE,
    };

    let config = Config { properties: args.define.into_iter().collect::<HashMap<_, _>>() };
    match run_with(&script, config, Box::new(std::io::stdout())) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        },
    }
}
