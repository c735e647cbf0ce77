use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser};
use poptimizer::{Charset, Config, Report, run_with_config, select_stages};
use tracing::{Level, info, warn};

/// poptimizer - shrink PHP sources.
///
/// Copies a file or folder to an output folder. PHP files are optimized on the
/// way (comments and useless whitespace removed), every other file is copied.
#[derive(Parser, Debug)]
#[command(
    name = "poptimizer",
    author,
    version,
    about = "Strip comments and useless whitespace from PHP files",
    long_about = r#"Copies a file or folder to an output folder. PHP files are optimized
on the way, every other file is copied as is.

Modules:
  comments   removes all comments, keeping line numbers
  spaces     removes indentation and spaces around operators
  all        every module (default)

Typical usage:
  poptimizer -i www -o build
  poptimizer -i www -o build -m comments -e vendor
"#
)]
struct Args {
    /// Input path (a file or a folder).
    #[arg(short = 'i', long = "input", value_name = "PATH")]
    input: PathBuf,

    /// Output folder. Created if it does not exist.
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    output: PathBuf,

    /// Paths to exclude, relative to the input folder.
    ///
    /// Excluded files are copied but not optimized. Globs are accepted:
    ///   poptimizer -i www -o build -e vendor -e 'cache/*.php'
    #[arg(
        short = 'e',
        long = "exclude",
        value_name = "PATH",
        action = ArgAction::Append,
        num_args = 1..,
        value_delimiter = ','
    )]
    excludes: Vec<String>,

    /// Optimization modules to apply: comments, spaces or all (default).
    #[arg(
        short = 'm',
        long = "modules",
        value_name = "MODULE",
        action = ArgAction::Append,
        num_args = 1..,
        value_delimiter = ','
    )]
    modules: Vec<String>,

    /// Charset of the files to read: UTF-8, UTF-16, US-ASCII or ISO-8859-1.
    #[arg(long = "ics", alias = "input-charset", value_name = "CHARSET")]
    input_charset: Option<String>,

    /// Charset of the files to write: UTF-8, UTF-16, US-ASCII or ISO-8859-1.
    #[arg(long = "ocs", alias = "output-charset", value_name = "CHARSET")]
    output_charset: Option<String>,

    /// Follow symbolic links during traversal.
    #[arg(long = "follow-symlinks")]
    follow_symlinks: bool,

    /// Print the run report as JSON on stdout.
    #[arg(long = "json")]
    json: bool,

    /// Only log warnings and errors.
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse_from(legacy_args(std::env::args_os()));
    init_tracing(args.quiet);

    let cfg = Config {
        input: args.input,
        output: args.output,
        excludes: args.excludes,
        pipeline: select_stages(&args.modules),
        input_charset: parse_charset(args.input_charset.as_deref()),
        output_charset: parse_charset(args.output_charset.as_deref()),
        follow_symlinks: args.follow_symlinks,
    };

    info!("Beginning optimization");
    let report = run_with_config(cfg)?;

    if args.json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        print_summary(&report);
    }

    Ok(())
}

/// Rewrites the single-dash flags of the old command line (`-ics`, `-ocs`,
/// `-v`) to their long forms, which clap would otherwise read as short-flag
/// clusters.
fn legacy_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-ics") => OsString::from("--ics"),
            Some("-ocs") => OsString::from("--ocs"),
            Some("-v") => OsString::from("--version"),
            _ => arg,
        })
        .collect()
}

fn init_tracing(quiet: bool) {
    let silent = quiet
        || std::env::var("POPTIMIZER_SILENT")
            .ok()
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    let level = if silent { Level::WARN } else { Level::INFO };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .compact()
        .try_init();
}

/// Unknown names fall back to UTF-8.
fn parse_charset(name: Option<&str>) -> Charset {
    let Some(name) = name else {
        return Charset::default();
    };
    Charset::from_name(name).unwrap_or_else(|| {
        warn!("Unknown charset {name:?}, using {}", Charset::default());
        Charset::default()
    })
}

fn print_summary(report: &Report) {
    info!(
        "{} optimized, {} copied, {} directories created ({} -> {} bytes)",
        report.optimized, report.copied, report.directories, report.bytes_in, report.bytes_out
    );
    info!("Optimization achieved in {:.3} seconds", report.elapsed_secs);
}
