//! Branchline CLI: stitch experiment lineages from the command line.
//!
//! Usage:
//!   branchline run --pool pool.yml --output dir [--recipe recipe.yml] [--data-root dir] [--parallel]
//!   branchline projects [--recipe recipe.yml]
//!   branchline convert <source> <target> [--mass-kind CO2] [--area-multiplied]

use branchline::io::CubeLoader;
use branchline::{
    conversion_factor, CandidatePool, ConversionOptions, JsonCubeLoader, JsonDirectoryStore, PoolManifest,
    StitchConfig, Stitcher,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "branchline",
    version,
    about = "Stitch climate model experiments onto their parent runs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stitch every top-level child in a pool and write the results
    Run {
        /// YAML list of the datasets available to the run
        #[arg(long)]
        pool: PathBuf,
        /// Directory to write stitched cubes and provenance to
        #[arg(long)]
        output: PathBuf,
        /// Recipe with stitching options
        #[arg(long)]
        recipe: Option<PathBuf>,
        /// Directory pool file references are relative to
        #[arg(long)]
        data_root: Option<PathBuf>,
        /// Stitch children concurrently
        #[arg(long)]
        parallel: bool,
    },
    /// List the projects whose attributes can be mapped
    Projects {
        /// Recipe that may register further projects
        #[arg(long)]
        recipe: Option<PathBuf>,
    },
    /// Print the factor converting one unit to another
    Convert {
        source: String,
        target: String,
        /// Species whose molar mass applies, e.g. CO2
        #[arg(long)]
        mass_kind: Option<String>,
        /// Source values were multiplied by cell area
        #[arg(long)]
        area_multiplied: bool,
    },
}

fn load_config(recipe: Option<&Path>) -> Result<StitchConfig, String> {
    match recipe {
        Some(path) => StitchConfig::from_path(path).map_err(|e| format!("{}: {}", path.display(), e)),
        None => Ok(StitchConfig::default()),
    }
}

fn load_manifest(path: &Path) -> Result<PoolManifest, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    serde_yaml::from_str(&text).map_err(|e| format!("cannot parse '{}': {}", path.display(), e))
}

fn cmd_run(pool: &Path, output: &Path, recipe: Option<&Path>, data_root: Option<PathBuf>, parallel: bool) -> i32 {
    let config = match load_config(recipe) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let manifest = match load_manifest(pool) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let store = match JsonDirectoryStore::open(output) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: cannot open output directory '{}': {}", output.display(), e);
            return 1;
        }
    };

    let loader: Arc<dyn CubeLoader> = match data_root {
        Some(root) => Arc::new(JsonCubeLoader::with_root(root)),
        None => Arc::new(JsonCubeLoader::new()),
    };
    let stitcher = Stitcher::new(config);
    let (pool, skipped) = CandidatePool::from_manifest(&manifest, loader.as_ref(), stitcher.registry());
    for (file, reason) in &skipped {
        eprintln!("Warning: skipped {}: {}", file, reason);
    }

    let reports = if parallel {
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                eprintln!("Error: cannot start runtime: {}", e);
                return 1;
            }
        };
        let stitcher = Arc::new(stitcher.clone());
        runtime.block_on(stitcher.run_parallel(Arc::new(pool), loader))
    } else {
        stitcher.run(&pool, loader.as_ref())
    };

    let summary = stitcher.persist(&reports, &store);
    for report in &reports {
        match &report.result {
            Ok(output) => println!(
                "{:<10} {:<40} {} ({} steps)",
                "stitched",
                report.child.as_str(),
                output.provenance.caption,
                output.steps
            ),
            Err(e) => println!("{:<10} {:<40} {}", "failed", report.child.as_str(), e),
        }
    }
    for (identifier, error) in &summary.failed {
        eprintln!("Error: cannot save {}: {}", identifier, error);
    }
    println!(
        "{} stitched, {} failed, {} saved to {}",
        reports.iter().filter(|r| r.is_ok()).count(),
        summary.skipped,
        summary.saved.len(),
        store.dir().display()
    );

    if summary.skipped > 0 || !summary.failed.is_empty() {
        1
    } else {
        0
    }
}

fn cmd_projects(recipe: Option<&Path>) -> i32 {
    let config = match load_config(recipe) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let registry = config.registry();
    for project in registry.projects() {
        println!("{}", project);
    }
    0
}

fn cmd_convert(source: &str, target: &str, mass_kind: Option<String>, area_multiplied: bool) -> i32 {
    let options = ConversionOptions {
        mass_kind,
        area_multiplied,
    };
    match conversion_factor(source, target, &options) {
        Ok(f) => {
            println!("{} -> {}: {}", f.effective_source, target, f.factor);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Run {
            pool,
            output,
            recipe,
            data_root,
            parallel,
        } => cmd_run(&pool, &output, recipe.as_deref(), data_root, parallel),
        Commands::Projects { recipe } => cmd_projects(recipe.as_deref()),
        Commands::Convert {
            source,
            target,
            mass_kind,
            area_multiplied,
        } => cmd_convert(&source, &target, mass_kind, area_multiplied),
    };
    std::process::exit(code);
}
