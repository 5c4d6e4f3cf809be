use crate::utils::Result;
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    )
});

#[derive(Parser)]
#[command(name="scgtree",
          version=&**FULL_VERSION,
          about="Builds a reference phylogeny from single-copy marker gene profiles",
          long_about = None,
          disable_help_subcommand = true,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Marker-based species tree builder")]
    Tree(TreeArgs),
    #[clap(about = "Alignment column filter")]
    Filter(FilterArgs),
    #[clap(about = "Input validator")]
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("tree")))]
#[command(arg_required_else_help(true))]
pub struct TreeArgs {
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "proteins")]
    #[clap(help = "Directory with per-genome protein FASTA files")]
    #[clap(value_name = "DIR")]
    #[arg(value_parser = check_dir_exists)]
    pub protein_dir: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'm')]
    #[clap(long = "markers")]
    #[clap(help = "Combined HMM flatfile with the marker profile library")]
    #[clap(value_name = "HMM")]
    #[arg(value_parser = check_file_exists)]
    pub markers_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "out-dir")]
    #[clap(help = "Output directory (created if absent)")]
    #[clap(value_name = "OUT_DIR")]
    pub out_dir: PathBuf,

    #[clap(short = 'x')]
    #[clap(long = "extension")]
    #[clap(help = "Extension of the protein FASTA files")]
    #[clap(value_name = "EXT")]
    #[clap(default_value = "faa")]
    pub extension: String,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,

    #[clap(long = "min-coverage")]
    #[clap(value_name = "PERC")]
    #[clap(help = "Remove columns with a gap percentage above this cutoff")]
    #[clap(default_value = "50")]
    #[arg(value_parser = ensure_percent)]
    pub min_coverage: f64,

    #[clap(long = "min-consensus")]
    #[clap(value_name = "PERC")]
    #[clap(help = "Remove columns whose most abundant residue is below this cutoff")]
    #[clap(default_value = "25")]
    #[arg(value_parser = ensure_percent)]
    pub min_consensus: f64,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "hmmsearch")]
    #[clap(value_name = "EXE")]
    #[clap(help = "Path to the hmmsearch executable")]
    #[clap(default_value = "hmmsearch")]
    pub hmmsearch_exe: String,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "hmmalign")]
    #[clap(value_name = "EXE")]
    #[clap(help = "Path to the hmmalign executable")]
    #[clap(default_value = "hmmalign")]
    pub hmmalign_exe: String,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "fasttree")]
    #[clap(value_name = "EXE")]
    #[clap(help = "Path to the FastTree executable")]
    #[clap(default_value = "FastTree")]
    pub fasttree_exe: String,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "skip-tree")]
    #[clap(help = "Stop after writing the filtered supermatrix")]
    pub skip_tree: bool,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("filter")))]
#[command(arg_required_else_help(true))]
pub struct FilterArgs {
    #[clap(required = true)]
    #[clap(short = 'a')]
    #[clap(long = "alignment")]
    #[clap(help = "FASTA alignment to filter")]
    #[clap(value_name = "ALN")]
    #[arg(value_parser = check_file_exists)]
    pub alignment_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(help = "Path of the filtered alignment")]
    #[clap(value_name = "OUT")]
    #[arg(value_parser = check_prefix_path)]
    pub output_path: String,

    #[clap(long = "min-coverage")]
    #[clap(value_name = "PERC")]
    #[clap(help = "Remove columns with a gap percentage above this cutoff")]
    #[clap(default_value = "50")]
    #[arg(value_parser = ensure_percent)]
    pub min_coverage: f64,

    #[clap(long = "min-consensus")]
    #[clap(value_name = "PERC")]
    #[clap(help = "Remove columns whose most abundant residue is below this cutoff")]
    #[clap(default_value = "25")]
    #[arg(value_parser = ensure_percent)]
    pub min_consensus: f64,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("validate")))]
#[command(arg_required_else_help(true))]
pub struct ValidateArgs {
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "proteins")]
    #[clap(help = "Directory with per-genome protein FASTA files")]
    #[clap(value_name = "DIR")]
    #[arg(value_parser = check_dir_exists)]
    pub protein_dir: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'm')]
    #[clap(long = "markers")]
    #[clap(help = "Combined HMM flatfile with the marker profile library")]
    #[clap(value_name = "HMM")]
    #[arg(value_parser = check_file_exists)]
    pub markers_path: PathBuf,

    #[clap(short = 'x')]
    #[clap(long = "extension")]
    #[clap(help = "Extension of the protein FASTA files")]
    #[clap(value_name = "EXT")]
    #[clap(default_value = "faa")]
    pub extension: String,
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_prefix_path(s: &str) -> Result<String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(s.to_string())
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn check_dir_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.is_dir() {
        Err(format!("Directory does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn ensure_percent(s: &str) -> Result<f64> {
    let value = s
        .parse::<f64>()
        .map_err(|e| format!("Could not parse percentage: {}", e))?;
    if !(0.0..=100.0).contains(&value) {
        Err(format!(
            "The value must be between 0 and 100, got: {}",
            value
        ))
    } else {
        Ok(value)
    }
}
