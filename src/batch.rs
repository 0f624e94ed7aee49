//! Batch driver: enumerate CIF files, parse, reduce, write, and collect a
//! per-file success/failure report. One bad file never aborts the run.

use crate::error::{Error, Result};
use crate::io::cif;
use crate::symmetry::PrimitiveReducer;
use glob::glob;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct BatchConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub tolerance: f64,
    /// Appended to the output base name, e.g. "_primitive". Empty keeps the
    /// input name.
    pub suffix: String,
    /// Write the unreduced original when symmetry detection fails, instead
    /// of skipping the file.
    pub write_unreduced: bool,
}

impl BatchConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        BatchConfig {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            tolerance: crate::symmetry::DEFAULT_TOLERANCE,
            suffix: String::new(),
            write_unreduced: false,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct FileFailure {
    pub file: String,
    pub kind: String,
    pub message: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    /// Successfully processed files whose cell was already primitive.
    pub already_primitive: usize,
    pub failures: Vec<FileFailure>,
}

impl BatchReport {
    pub fn summary(&self) -> String {
        let mut out = format!(
            "processed {} file(s): {} succeeded ({} already primitive), {} failed",
            self.attempted,
            self.succeeded,
            self.already_primitive,
            self.failures.len()
        );
        for f in &self.failures {
            out.push_str(&format!("\n  [{}] {}: {}", f.kind, f.file, f.message));
        }
        out
    }
}

enum Outcome {
    Reduced,
    AlreadyPrimitive,
    Failed(FileFailure),
}

/// Run the full reduction pass. Per-file failures land in the report;
/// only directory-level problems return `Err`.
pub fn run(config: &BatchConfig, reducer: &dyn PrimitiveReducer) -> Result<BatchReport> {
    if !config.input_dir.is_dir() {
        return Err(Error::Directory {
            path: config.input_dir.display().to_string(),
            reason: "input directory does not exist".into(),
        });
    }
    std::fs::create_dir_all(&config.output_dir).map_err(|e| Error::Directory {
        path: config.output_dir.display().to_string(),
        reason: e.to_string(),
    })?;

    let files = list_cif_files(&config.input_dir)?;
    if files.is_empty() {
        warn!("no CIF files found in {}", config.input_dir.display());
    }

    let outcomes: Vec<Outcome> = files
        .par_iter()
        .map(|path| process_file(path, config, reducer))
        .collect();

    let mut report = BatchReport {
        attempted: files.len(),
        ..Default::default()
    };
    for outcome in outcomes {
        match outcome {
            Outcome::Reduced => report.succeeded += 1,
            Outcome::AlreadyPrimitive => {
                report.succeeded += 1;
                report.already_primitive += 1;
            }
            Outcome::Failed(f) => report.failures.push(f),
        }
    }
    report.failures.sort_by(|a, b| a.file.cmp(&b.file));
    Ok(report)
}

fn list_cif_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = dir.join("*.cif").display().to_string();
    let entries = glob(&pattern).map_err(|e| Error::Directory {
        path: dir.display().to_string(),
        reason: e.to_string(),
    })?;
    let mut files: Vec<PathBuf> = entries.filter_map(|entry| entry.ok()).collect();
    files.sort();
    Ok(files)
}

fn process_file(path: &Path, config: &BatchConfig, reducer: &dyn PrimitiveReducer) -> Outcome {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let fail = |e: &Error| {
        warn!("{}: {}", name, e);
        Outcome::Failed(FileFailure {
            file: name.clone(),
            kind: e.kind().to_string(),
            message: e.to_string(),
        })
    };

    let structure = match cif::read_file(path) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let result = match reducer.reduce(&structure, config.tolerance) {
        Ok(r) => r,
        Err(e) => {
            if config.write_unreduced {
                if let Err(io_err) = write_output(path, config, &structure) {
                    return fail(&io_err);
                }
                debug!("{}: passed through unreduced", name);
            }
            return fail(&e);
        }
    };

    if let Err(e) = write_output(path, config, &result.structure) {
        return fail(&e);
    }

    if result.changed {
        info!(
            "{}: {} -> {} sites, volume {:.2} -> {:.2}",
            name,
            structure.sites.len(),
            result.structure.sites.len(),
            structure.volume(),
            result.structure.volume()
        );
        Outcome::Reduced
    } else {
        info!("{}: already primitive", name);
        Outcome::AlreadyPrimitive
    }
}

fn write_output(input: &Path, config: &BatchConfig, structure: &crate::model::Structure) -> Result<()> {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "structure".to_string());
    let out_path = config
        .output_dir
        .join(format!("{}{}.cif", stem, config.suffix));
    cif::write_file(&out_path, structure)
}
