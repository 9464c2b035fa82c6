//! knnmap CLI - k-nearest-neighbor maps from point layers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

use knnmap_algorithms::pattern::{output_schema, KnnMapParams, KnnMapProcess};
use knnmap_core::io::{read_geojson, write_geojson};
use knnmap_core::vector::{FeatureCollection, FieldType, Schema};
use knnmap_core::{Error, ProgressListener};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "knnmap")]
#[command(author, version, about = "k-nearest-neighbor maps from point layers", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a GeoJSON point layer
    Info {
        /// Input GeoJSON file
        input: PathBuf,
    },
    /// Build a k-nearest-neighbor map
    Map {
        /// Input GeoJSON file with point features
        input: PathBuf,
        /// Output GeoJSON file
        output: PathBuf,
        /// Number of neighbors per point
        #[arg(short = 'k', long)]
        neighbors: usize,
        /// Emit one convex hull per neighbor cluster instead of lines
        #[arg(long)]
        convex_hull: bool,
    },
}

// ─── Progress ───────────────────────────────────────────────────────────

/// Spinner-backed progress listener for the terminal.
struct SpinnerProgress {
    pb: ProgressBar,
}

impl SpinnerProgress {
    fn new() -> Self {
        Self { pb: spinner("Starting...") }
    }
}

impl ProgressListener for SpinnerProgress {
    fn set_task(&mut self, description: &str) {
        self.pb.set_message(description.to_string());
    }

    fn progress(&mut self, percent: f32) {
        debug!("progress {:.0}%", percent);
    }

    fn exception_occurred(&mut self, error: &Error) {
        error!("{}", error);
    }

    fn dispose(&mut self) {
        self.pb.finish_and_clear();
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_points(path: &PathBuf) -> Result<FeatureCollection> {
    let pb = spinner("Reading features...");
    let fc = read_geojson(path).context("Failed to read GeoJSON")?;
    pb.finish_and_clear();
    info!("Input: {} features", fc.len());
    Ok(fc)
}

fn write_result(fc: &FeatureCollection, path: &PathBuf) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geojson(fc, path).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn field_type_name(t: FieldType) -> &'static str {
    match t {
        FieldType::Bool => "bool",
        FieldType::Int => "int",
        FieldType::Float => "float",
        FieldType::String => "string",
        FieldType::Unknown => "unknown",
    }
}

fn print_schema(schema: &Schema) {
    for field in &schema.fields {
        println!("  {:<20} {}", field.name, field_type_name(field.field_type));
    }
}

fn done(name: &str, path: &PathBuf, count: usize, elapsed: std::time::Duration) {
    println!("{} saved to: {} ({} features)", name, path.display(), count);
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Info { input } => {
            let fc = read_points(&input)?;
            let points = fc.iter().filter(|f| f.coord().is_some()).count();
            let with_z = fc.iter().filter(|f| f.z.is_some()).count();

            println!("File: {}", input.display());
            println!("Features: {}", fc.len());
            println!("  Points: {}", points);
            println!("  Other/none: {}", fc.len() - points);
            println!("  With Z: {}", with_z);

            let schema = Schema::infer(&fc);
            if !schema.is_empty() {
                println!("Attributes:");
                print_schema(&schema);
            }
        }

        Commands::Map {
            input,
            output,
            neighbors,
            convex_hull,
        } => {
            let fc = read_points(&input)?;
            let params = KnnMapParams::from_options(Some(neighbors), Some(convex_hull))
                .context("Invalid parameters")?;

            let start = Instant::now();
            let mut listener = SpinnerProgress::new();
            let mut process = KnnMapProcess::new();
            let result = process
                .execute(&fc, params, Some(&mut listener))
                .context("k-nearest-neighbor map failed")?;
            let elapsed = start.elapsed();

            let Some(result) = result else {
                println!("Canceled, nothing written");
                return Ok(());
            };

            if cli.verbose {
                println!("Output attributes:");
                print_schema(&output_schema(&Schema::infer(&fc), convex_hull));
            }

            write_result(&result, &output)?;
            let name = if convex_hull { "KNN hulls" } else { "KNN lines" };
            done(name, &output, result.len(), elapsed);
        }
    }

    Ok(())
}
