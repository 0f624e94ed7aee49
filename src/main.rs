use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::{debug, warn};
use std::path::{Path, PathBuf};

use primcell::io::cif;
use primcell::{batch, rendering, symmetry, BatchConfig, MoyoReducer};

#[derive(Parser)]
#[command(name = "primcell")]
#[command(about = "Reduce crystal structures to primitive unit cells and visualize them")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Number of worker threads (default: all available cores)
    #[arg(short, long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reduce every CIF file in a directory to its primitive cell
    Reduce {
        /// Directory containing input CIF files
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for the reduced CIF files
        #[arg(short, long)]
        output: PathBuf,

        /// Symmetry tolerance (symprec). A looser value may reduce a cell
        /// that a tighter one reports as already primitive.
        #[arg(long, default_value_t = primcell::DEFAULT_TOLERANCE)]
        tolerance: f64,

        /// Suffix appended to output base names, e.g. "_primitive"
        #[arg(long, default_value = "")]
        suffix: String,

        /// Write the unreduced original when symmetry detection fails
        #[arg(long)]
        write_unreduced: bool,

        /// Print the batch report as JSON instead of text
        #[arg(long)]
        report_json: bool,
    },
    /// Render structures as static PNG images or interactive HTML scenes
    Render {
        /// Directory of CIF files to render
        #[arg(short, long)]
        input: PathBuf,

        /// Directory holding reduced counterparts, required for comparison
        /// mode. Files match by base name, with or without a "_primitive"
        /// suffix.
        #[arg(long)]
        reduced: Option<PathBuf>,

        /// Directory for the generated artifacts
        #[arg(short, long)]
        artifacts: PathBuf,

        #[arg(long, value_enum, default_value_t = Mode::Static)]
        mode: Mode,

        /// Symmetry tolerance used for the space-group annotation, matching
        /// the value the cells were reduced with
        #[arg(long, default_value_t = primcell::DEFAULT_TOLERANCE)]
        tolerance: f64,

        #[arg(long, default_value_t = rendering::DEFAULT_WIDTH)]
        width: u32,

        #[arg(long, default_value_t = rendering::DEFAULT_HEIGHT)]
        height: u32,
    },
}

#[derive(Clone, Copy, PartialEq, ValueEnum)]
enum Mode {
    /// Fixed-camera PNG per structure
    Static,
    /// Self-contained HTML scene per structure
    Interactive,
    /// Original and reduced side by side (PNG and HTML)
    Comparison,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure the worker pool")?;
    }

    match cli.command {
        Commands::Reduce {
            input,
            output,
            tolerance,
            suffix,
            write_unreduced,
            report_json,
        } => {
            let config = BatchConfig {
                input_dir: input,
                output_dir: output,
                tolerance,
                suffix,
                write_unreduced,
            };
            let report = batch::run(&config, &MoyoReducer)?;
            if report_json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.summary());
            }
            // Per-file failures are part of a completed run; only
            // directory-level errors (above, via `?`) exit non-zero.
            Ok(())
        }
        Commands::Render {
            input,
            reduced,
            artifacts,
            mode,
            tolerance,
            width,
            height,
        } => render_all(
            &input,
            reduced.as_deref(),
            &artifacts,
            mode,
            tolerance,
            width,
            height,
        ),
    }
}

fn render_all(
    input: &Path,
    reduced_dir: Option<&Path>,
    artifacts: &Path,
    mode: Mode,
    tolerance: f64,
    width: u32,
    height: u32,
) -> Result<()> {
    if mode == Mode::Comparison && reduced_dir.is_none() {
        bail!("comparison mode requires --reduced");
    }
    if !input.is_dir() {
        bail!("input directory {} does not exist", input.display());
    }
    std::fs::create_dir_all(artifacts)
        .with_context(|| format!("cannot create artifact directory {}", artifacts.display()))?;

    let pattern = input.join("*.cif").display().to_string();
    let mut files: Vec<PathBuf> = glob::glob(&pattern)
        .context("bad input directory path")?
        .filter_map(|e| e.ok())
        .collect();
    files.sort();
    if files.is_empty() {
        warn!("no CIF files found in {}", input.display());
    }

    for path in &files {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "structure".into());
        let structure = match cif::read_file(path) {
            Ok(s) => s,
            Err(e) => {
                warn!("{}: {}", stem, e);
                continue;
            }
        };
        if let Ok(info) = symmetry::analyze(&structure, tolerance) {
            debug!("{}: detected {} ({})", stem, info.symbol, info.system);
        }

        let outcome = match mode {
            Mode::Static => rendering::render_png(
                &structure,
                &format!("{} unit cell", stem),
                &artifacts.join(format!("{}.png", stem)),
                width,
                height,
            ),
            Mode::Interactive => rendering::render_html(
                &structure,
                &format!("{} unit cell", stem),
                &artifacts.join(format!("{}.html", stem)),
            ),
            Mode::Comparison => {
                match reduced_dir.and_then(|dir| find_counterpart(dir, &stem)) {
                    Some(reduced_path) => match cif::read_file(&reduced_path) {
                        Ok(reduced) => render_comparison(
                            &structure, &reduced, &stem, artifacts, width, height,
                        ),
                        Err(e) => Err(e),
                    },
                    None => {
                        warn!("{}: no reduced counterpart, rendering original only", stem);
                        rendering::render_png(
                            &structure,
                            &format!("{} unit cell", stem),
                            &artifacts.join(format!("{}.png", stem)),
                            width,
                            height,
                        )
                    }
                }
            }
        };
        if let Err(e) = outcome {
            // Fatal to this render only, never to the whole pass.
            warn!("{}: {}", stem, e);
        }
    }

    println!("wrote artifacts to {}", artifacts.display());
    Ok(())
}

fn render_comparison(
    original: &primcell::Structure,
    reduced: &primcell::Structure,
    stem: &str,
    artifacts: &Path,
    width: u32,
    height: u32,
) -> primcell::Result<()> {
    let title = format!("{} original vs primitive", stem);
    rendering::render_comparison_png(
        original,
        reduced,
        &title,
        &artifacts.join(format!("{}_compare.png", stem)),
        width,
        height,
    )?;
    rendering::render_comparison_html(
        original,
        reduced,
        &title,
        &artifacts.join(format!("{}_compare.html", stem)),
    )
}

/// Reduced files may keep the input name or carry a "_primitive" suffix.
fn find_counterpart(dir: &Path, stem: &str) -> Option<PathBuf> {
    [
        dir.join(format!("{}.cif", stem)),
        dir.join(format!("{}_primitive.cif", stem)),
    ]
    .into_iter()
    .find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_accepts_tolerance_flag() {
        let cli = Cli::try_parse_from([
            "primcell",
            "render",
            "--input",
            "in",
            "--artifacts",
            "out",
            "--tolerance",
            "0.1",
        ])
        .unwrap();
        match cli.command {
            Commands::Render { tolerance, .. } => assert!((tolerance - 0.1).abs() < 1e-12),
            _ => panic!("expected render subcommand"),
        }
    }

    #[test]
    fn render_tolerance_defaults_to_reduce_default() {
        let cli = Cli::try_parse_from(["primcell", "render", "-i", "in", "-a", "out"]).unwrap();
        match cli.command {
            Commands::Render { tolerance, .. } => {
                assert!((tolerance - primcell::DEFAULT_TOLERANCE).abs() < 1e-12)
            }
            _ => panic!("expected render subcommand"),
        }
    }
}
