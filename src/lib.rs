//! Ortholay: bracket overlay compositing for treatment previews.
//!
//! Ortholay takes a photograph, the tooth regions an external detector
//! found in it, and a bracket appliance asset, and composites a preview of
//! the appliance onto every detected tooth. The detector itself is an
//! external collaborator; ortholay only consumes its records.
//!
//! # Modules
//!
//! - [`regions`]: Region normalization (detector records, ToothRegion,
//!   reports) plus JSON/CSV readers
//! - [`compose`]: Overlay compositing (placement, painting, flattening)
//! - [`assets`]: Bracket asset store
//! - [`error`]: Error types for ortholay operations

pub mod assets;
pub mod compose;
pub mod error;
pub mod regions;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use image::RgbImage;
use log::info;

pub use error::OrtholayError;

use assets::AssetStore;
use compose::CompositeReport;
use regions::{normalize, NormalizeReport, RawDetection};

/// The ortholay CLI application.
#[derive(Parser)]
#[command(name = "ortholay")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Composite bracket overlays onto a photograph.
    Apply(ApplyArgs),

    /// Inspect detector output without compositing.
    Inspect(InspectArgs),
}

/// Arguments for the apply subcommand.
#[derive(clap::Args)]
struct ApplyArgs {
    /// Photograph to composite onto.
    #[arg(long)]
    image: PathBuf,

    /// Detector output file.
    #[arg(long)]
    detections: PathBuf,

    /// Detections format ('json' or 'csv').
    #[arg(long, default_value = "json")]
    format: String,

    /// Bracket type ('metal' or 'ceramic').
    #[arg(long)]
    bracket: String,

    /// Directory containing bracket assets.
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    /// Where to write the composited image.
    #[arg(long)]
    output: PathBuf,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    report: String,
}

/// Arguments for the inspect subcommand.
#[derive(clap::Args)]
struct InspectArgs {
    /// Detector output file.
    #[arg(long)]
    detections: PathBuf,

    /// Detections format ('json' or 'csv').
    #[arg(long, default_value = "json")]
    format: String,

    /// Photograph the detections refer to (reports its dimensions).
    #[arg(long)]
    image: Option<PathBuf>,

    /// Write a copy of the photograph with region outlines drawn.
    #[arg(long, requires = "image")]
    render: Option<PathBuf>,

    /// Exit non-zero if any record was skipped as malformed.
    #[arg(long)]
    strict: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    report: String,
}

/// Run the ortholay CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), OrtholayError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Apply(args)) => run_apply(args),
        Some(Commands::Inspect(args)) => run_inspect(args),
        None => {
            // No subcommand: just print help hint and exit successfully
            println!("ortholay {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Bracket overlay compositing for treatment previews.");
            println!();
            println!("Run 'ortholay --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the apply subcommand.
fn run_apply(args: ApplyArgs) -> Result<(), OrtholayError> {
    let records = read_detections(&args.detections, &args.format)?;
    let (tooth_regions, normalize_report) = normalize(&records);
    info!(
        "normalized {} region(s) from {} record(s)",
        tooth_regions.len(),
        records.len()
    );

    let photo = read_photo(&args.image)?;

    // Resolve the asset before any compositing so an unsupported bracket
    // type fails the request up front.
    let store = AssetStore::new(&args.assets);
    let (kind, asset) = store.load_key(&args.bracket)?;

    let (preview, composite_report) = compose::composite(&photo, &tooth_regions, &asset)?;
    info!(
        "painted {} bracket(s), skipped {} degenerate region(s)",
        composite_report.painted, composite_report.skipped
    );

    preview
        .save(&args.output)
        .map_err(|source| OrtholayError::ImageEncode {
            path: args.output.clone(),
            source,
        })?;

    match args.report.as_str() {
        "json" => print_apply_json(&args.output, kind.as_str(), &composite_report, &normalize_report),
        _ => {
            println!("Composited preview written to {}", args.output.display());
            println!("Bracket type: {}", kind);
            println!("{}", composite_report);
            print!("{}", normalize_report);
        }
    }

    Ok(())
}

/// Execute the inspect subcommand.
fn run_inspect(args: InspectArgs) -> Result<(), OrtholayError> {
    let records = read_detections(&args.detections, &args.format)?;
    let (tooth_regions, report) = normalize(&records);

    let photo = match &args.image {
        Some(path) => Some(read_photo(path)?),
        None => None,
    };

    if let (Some(render_path), Some(photo)) = (&args.render, &photo) {
        let outlined = compose::outline_regions(photo, &tooth_regions);
        outlined
            .save(render_path)
            .map_err(|source| OrtholayError::ImageEncode {
                path: render_path.clone(),
                source,
            })?;
        info!("rendered region outlines to {}", render_path.display());
    }

    match args.report.as_str() {
        "json" => print_inspect_json(&report, photo.as_ref()),
        _ => {
            print!("{}", report);
            if let Some(photo) = &photo {
                let (width, height) = photo.dimensions();
                println!("Photograph dimensions: {}x{}", width, height);
            }
            if let Some(render_path) = &args.render {
                println!("Region outlines written to {}", render_path.display());
            }
        }
    }

    // Determine exit status
    let skipped = report.skipped_count();
    if args.strict && skipped > 0 {
        Err(OrtholayError::NormalizationFailed { skipped })
    } else {
        Ok(())
    }
}

/// Loads detector records in the requested format.
fn read_detections(path: &Path, format: &str) -> Result<Vec<RawDetection>, OrtholayError> {
    match format {
        "json" => regions::io_json::read_detections_json(path),
        "csv" => regions::io_csv::read_detections_csv(path),
        other => Err(OrtholayError::UnsupportedFormat(format!(
            "'{}' (supported: json, csv)",
            other
        ))),
    }
}

/// Decodes a photograph to RGB.
fn read_photo(path: &Path) -> Result<RgbImage, OrtholayError> {
    let photo = image::open(path)
        .map_err(|source| OrtholayError::ImageDecode {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgb8();
    Ok(photo)
}

/// Simple JSON output for programmatic use of the apply subcommand.
fn print_apply_json(
    output: &Path,
    bracket: &str,
    composite_report: &CompositeReport,
    normalize_report: &NormalizeReport,
) {
    println!("{{");
    println!("  \"success\": true,");
    println!("  \"output\": \"{}\",", output.display());
    println!("  \"bracket_type\": \"{}\",", bracket);
    println!("  \"painted\": {},", composite_report.painted);
    println!("  \"skipped_degenerate\": {},", composite_report.skipped);
    println!(
        "  \"skipped_malformed\": {}",
        normalize_report.skipped_count()
    );
    println!("}}");
}

/// Simple JSON output for programmatic use of the inspect subcommand.
fn print_inspect_json(report: &NormalizeReport, photo: Option<&RgbImage>) {
    println!("{{");
    println!("  \"accepted\": {},", report.accepted);
    println!("  \"skipped_malformed\": {},", report.skipped_count());
    if let Some(photo) = photo {
        let (width, height) = photo.dimensions();
        println!("  \"image_dimensions\": {{");
        println!("    \"width\": {},", width);
        println!("    \"height\": {}", height);
        println!("  }},");
    }
    println!("  \"issues\": [");
    for (i, issue) in report.issues.iter().enumerate() {
        let comma = if i < report.issues.len() - 1 { "," } else { "" };
        println!("    {{");
        println!("      \"code\": \"{:?}\",", issue.code);
        println!("      \"record_index\": {},", issue.record_index);
        println!("      \"skipped\": {},", issue.skipped);
        println!(
            "      \"message\": \"{}\"",
            issue.message.replace('"', "\\\"")
        );
        println!("    }}{}", comma);
    }
    println!("  ]");
    println!("}}");
}
