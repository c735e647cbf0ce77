use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder};
use rayon::prelude::*;
use tracing::{error, info, warn};

pub mod charset;
pub mod comments;
pub mod pipeline;
pub mod scan;
pub mod spaces;

pub use crate::charset::Charset;
pub use crate::comments::strip_comments;
pub use crate::pipeline::{Pipeline, Stage, run_pipeline};
pub use crate::spaces::compact_whitespace;

/// Configuration passed from the CLI layer (main.rs) into the core logic.
#[derive(Debug)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub excludes: Vec<String>,
    pub pipeline: Pipeline,
    pub input_charset: Charset,
    pub output_charset: Charset,
    pub follow_symlinks: bool,
}

/// Problems with the paths given on the command line.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("the input file/folder must exist: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("the output must be a folder, not a file: {}", .0.display())]
    OutputNotDirectory(PathBuf),
}

/// What a run did, printed at the end (or as JSON with `--json`).
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize)]
pub struct Report {
    pub optimized: usize,
    pub copied: usize,
    pub directories: usize,
    pub failed: usize,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub elapsed_secs: f64,
}

#[derive(Debug)]
struct Job {
    src: PathBuf,
    dest: PathBuf,
    display: String,
    optimize: bool,
}

#[derive(Debug)]
struct Outcome {
    optimized: bool,
    bytes_in: u64,
    bytes_out: u64,
}

/// Turn module names from the command line into a pipeline.
///
/// Names are matched case-insensitively, `all` (or no name at all) selects
/// every stage, and unknown names are skipped with a warning. Stages always run
/// in canonical order whatever order they were named in.
pub fn select_stages<S: AsRef<str>>(names: &[S]) -> Pipeline {
    if names.is_empty() {
        return Pipeline::all();
    }

    let mut selected = Vec::new();
    for name in names {
        let name = name.as_ref().trim();
        if name.eq_ignore_ascii_case("all") {
            return Pipeline::all();
        }
        match name.parse::<Stage>() {
            Ok(stage) => selected.push(stage),
            Err(err) => warn!("Ignoring {err}"),
        }
    }

    selected.sort();
    selected.dedup();
    Pipeline::new(selected)
}

/// Mirror `cfg.input` into `cfg.output`, optimizing PHP files on the way.
pub fn run_with_config(cfg: Config) -> Result<Report> {
    let started = Instant::now();

    if !cfg.input.exists() {
        return Err(ConfigError::MissingInput(cfg.input).into());
    }
    if cfg.output.exists() && !cfg.output.is_dir() {
        return Err(ConfigError::OutputNotDirectory(cfg.output).into());
    }
    if !cfg.output.exists() {
        info!("Creating directory {}", cfg.output.display());
        fs::create_dir_all(&cfg.output)
            .with_context(|| format!("Unable to create directory {}", cfg.output.display()))?;
    }

    let input = cfg
        .input
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", cfg.input.display()))?;
    let output_root = cfg
        .output
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", cfg.output.display()))?;

    // Paths are mirrored relative to the input folder, or to the folder holding the input file.
    let input_root = if input.is_dir() {
        input.clone()
    } else {
        input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| input.clone())
    };

    let exclude_globset = build_exclude_globset(&cfg.excludes)?;

    let mut report = Report::default();
    let mut jobs = Vec::new();

    let mut builder = WalkBuilder::new(&input);
    builder
        .standard_filters(false)
        .follow_links(cfg.follow_symlinks);

    // Never walk into our own output when it lives inside the input tree.
    let output_for_filter = output_root.clone();
    builder.filter_entry(move |entry: &DirEntry| {
        entry.depth() == 0 || !entry.path().starts_with(&output_for_filter)
    });

    for result in builder.build() {
        let entry = match result {
            Ok(e) => e,
            Err(err) => {
                error!("Walk error: {err}");
                report.failed += 1;
                continue;
            }
        };

        let path = entry.path();
        let rel = path.strip_prefix(&input_root).unwrap_or(path);
        let dest = output_root.join(rel);

        if entry.file_type().is_some_and(|ft| ft.is_dir()) {
            if !dest.exists() {
                info!("Creating directory {}", dest.display());
                fs::create_dir_all(&dest)
                    .with_context(|| format!("Unable to create directory {}", dest.display()))?;
                report.directories += 1;
            }
            continue;
        }

        let rel_norm = normalize_for_matching(rel);
        let excluded = exclude_globset
            .as_ref()
            .is_some_and(|gs| gs.is_match(&rel_norm));

        jobs.push(Job {
            src: path.to_path_buf(),
            dest,
            optimize: is_php_source(path) && !excluded,
            display: rel_norm,
        });
    }

    let outcomes: Vec<Result<Outcome>> = jobs
        .par_iter()
        .map(|job| process_file(job, &cfg))
        .collect();

    for (job, outcome) in jobs.iter().zip(outcomes) {
        match outcome {
            Ok(done) => {
                if done.optimized {
                    report.optimized += 1;
                } else {
                    report.copied += 1;
                }
                report.bytes_in += done.bytes_in;
                report.bytes_out += done.bytes_out;
            }
            Err(err) => {
                error!("Error processing {}: {:#}", job.display, err);
                report.failed += 1;
            }
        }
    }

    report.elapsed_secs = started.elapsed().as_secs_f64();

    if report.failed > 0 {
        anyhow::bail!(
            "{} file(s) could not be processed. See stderr for details.",
            report.failed
        );
    }

    Ok(report)
}

fn process_file(job: &Job, cfg: &Config) -> Result<Outcome> {
    let bytes = fs::read(&job.src).with_context(|| format!("Failed to read {}", job.display))?;

    if let Some(parent) = job.dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Unable to create directory {}", parent.display()))?;
    }

    let written = if job.optimize {
        info!("Optimizing {}", job.display);
        let text = cfg
            .input_charset
            .decode(&bytes)
            .with_context(|| format!("Failed to decode {} as {}", job.display, cfg.input_charset))?;
        let optimized = cfg.pipeline.run(&text);
        cfg.output_charset
            .encode(&optimized)
            .with_context(|| format!("Failed to encode {} as {}", job.display, cfg.output_charset))?
    } else if cfg.input_charset == cfg.output_charset {
        info!("Copying {}", job.display);
        bytes.clone()
    } else {
        info!("Copying {} ({} -> {})", job.display, cfg.input_charset, cfg.output_charset);
        let text = cfg
            .input_charset
            .decode(&bytes)
            .with_context(|| format!("Failed to decode {} as {}", job.display, cfg.input_charset))?;
        cfg.output_charset
            .encode(&text)
            .with_context(|| format!("Failed to encode {} as {}", job.display, cfg.output_charset))?
    };

    fs::write(&job.dest, &written)
        .with_context(|| format!("Failed to write {}", job.dest.display()))?;

    Ok(Outcome {
        optimized: job.optimize,
        bytes_in: bytes.len() as u64,
        bytes_out: written.len() as u64,
    })
}

/// Build a GlobSet from the user-provided `--exclude` entries.
///
/// Each entry is a path relative to the input folder (a leading `/` is
/// ignored) or a glob. An entry excludes the path itself and everything below
/// it. Returns `Ok(None)` if there are no entries.
fn build_exclude_globset(patterns: &[String]) -> Result<Option<GlobSet>> {
    let mut builder = GlobSetBuilder::new();
    let mut any = false;

    for pat in patterns {
        let pat = pat.trim().trim_start_matches('/').trim_end_matches('/');
        if pat.is_empty() {
            continue;
        }

        for candidate in [pat.to_string(), format!("{pat}/**")] {
            let glob = Glob::new(&candidate)
                .with_context(|| format!("Invalid --exclude pattern: {pat}"))?;
            builder.add(glob);
        }
        any = true;
    }

    if !any {
        return Ok(None);
    }

    let set = builder
        .build()
        .context("Failed to build exclude glob set")?;

    Ok(Some(set))
}

/// Files ending in `.php` (any case) with a non-empty stem are optimized.
pub fn is_php_source(path: &Path) -> bool {
    let has_stem = path.file_stem().is_some_and(|stem| !stem.is_empty());
    let is_php = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("php"));
    has_stem && is_php
}

/// Convert paths to a stable, slash-separated form for matching/printing.
fn normalize_for_matching(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
