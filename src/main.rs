use clap::{Parser, Subcommand};
use paintpile::config::{self, Config, UploadConfig};
use paintpile::imaging::{self, CropRect, ImageFile, claim_unique_name, mime_for_name};
use paintpile::output::{self, CompressEntry, CompressReport, CropReport, EntryStatus};
use paintpile::upload;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn version_string() -> &'static str {
    match env!("PAINTPILE_BUILD") {
        "" => env!("CARGO_PKG_VERSION"),
        dev => dev,
    }
}

#[derive(Parser)]
#[command(name = "paintpile")]
#[command(about = "Prepare miniature progress photos for upload")]
#[command(long_about = "\
Prepare miniature progress photos for upload

Every photo attached to a progress log is shrunk so its longer edge fits the
configured cap and re-encoded as WebP (JPEG when WebP encoding is not
available). Photos that already fit and are already in that format are kept
byte for byte. The crop command applies an editor result: rotate by any
angle, then cut out a rectangle of the rotated image.

Configuration is read from ./paintpile.toml when present, or from the file
given with --config. Run 'paintpile gen-config' for a documented template.

Set RUST_LOG=debug to see per-file decisions.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: ./paintpile.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct CompressArgs {
    /// Image files or directories (searched recursively)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory the prepared files are written to
    #[arg(long, default_value = "compressed")]
    out_dir: PathBuf,

    /// Override compress.max_dimension
    #[arg(long)]
    max_dimension: Option<u32>,

    /// Override compress.quality
    #[arg(long)]
    quality: Option<f32>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct CropArgs {
    /// Image file to crop
    input: PathBuf,

    /// Left edge of the crop, in rotated-image pixels
    #[arg(long)]
    x: u32,

    /// Top edge of the crop, in rotated-image pixels
    #[arg(long)]
    y: u32,

    #[arg(long)]
    width: u32,

    #[arg(long)]
    height: u32,

    /// Clockwise rotation in degrees, applied before cropping
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    rotation: f64,

    /// Output file (default: cropped.<ext> next to the input)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Resize and re-encode photos for upload
    Compress(CompressArgs),
    /// Rotate, then crop, one photo
    Crop(CropArgs),
    /// Print the output format this build encodes to
    Probe,
    /// Print a stock paintpile.toml with all options documented
    GenConfig,
}

fn main() -> CliResult {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Compress(args) => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(max_dimension) = args.max_dimension {
                config.compress.max_dimension = max_dimension;
            }
            if let Some(quality) = args.quality {
                config.compress.quality = quality;
            }
            config.validate()?;
            run_compress(&args, &config)?;
        }
        Command::Crop(args) => {
            let config = load_config(cli.config.as_deref())?;
            run_crop(&args, &config)?;
        }
        Command::Probe => {
            println!("{}", imaging::resolve_output_format()?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<Config, config::ConfigError> {
    match explicit {
        Some(path) => config::load_config_file(path),
        None => config::load_config(Path::new(".")),
    }
}

/// Expand directories into the image files beneath them, in name order.
///
/// Files named explicitly are kept whatever their extension, so the
/// selection rules can report them.
fn collect_inputs(inputs: &[PathBuf], upload: &UploadConfig) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            paths.push(input.clone());
            continue;
        }
        for entry in WalkDir::new(input).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    let name = entry.file_name().to_string_lossy();
                    if mime_for_name(&name).is_some_and(|mime| upload.allows_type(mime)) {
                        paths.push(entry.into_path());
                    }
                }
                Ok(_) => {}
                Err(e) => log::warn!("Skipping unreadable entry: {e}"),
            }
        }
    }
    paths
}

fn run_compress(args: &CompressArgs, config: &Config) -> CliResult {
    let format = imaging::resolve_output_format()?;
    let paths = collect_inputs(&args.inputs, &config.upload);
    log::info!("Compressing {} file(s) to {}", paths.len(), format);

    // Selection rules first; the count limit does not apply to a batch.
    let checked: Vec<Result<ImageFile, String>> = paths
        .iter()
        .map(|path| {
            let file = ImageFile::read(path).map_err(|e| format!("{}: {e}", path.display()))?;
            upload::validate_file(&file, &config.upload).map_err(|e| e.to_string())?;
            Ok(file)
        })
        .collect();

    let accepted: Vec<ImageFile> = checked.iter().filter_map(|c| c.as_ref().ok()).cloned().collect();
    let mut prepared = imaging::compress_batch(accepted, &config.compress.options()).into_iter();

    std::fs::create_dir_all(&args.out_dir)?;
    // Inputs from different directories can share a name once flattened.
    let mut taken = HashSet::new();
    let mut entries = Vec::with_capacity(paths.len());
    for (path, checked) in paths.iter().zip(checked) {
        let entry = match checked {
            Err(reason) => CompressEntry {
                source: path.clone(),
                original_bytes: std::fs::metadata(path).map(|m| m.len()).unwrap_or(0),
                status: EntryStatus::Rejected { reason },
            },
            Ok(original) => {
                let result = prepared
                    .next()
                    .ok_or("batch returned fewer files than it was given")?;
                let name = claim_unique_name(&result.name, &mut taken);
                if name != result.name {
                    log::warn!("{} would overwrite {}, writing {name}", path.display(), result.name);
                }
                let out_path = args.out_dir.join(&name);
                std::fs::write(&out_path, &result.bytes)?;
                let status = if result.shares_payload(&original) {
                    EntryStatus::Kept { output: out_path }
                } else {
                    EntryStatus::Compressed {
                        output: out_path,
                        output_bytes: result.size() as u64,
                    }
                };
                CompressEntry {
                    source: path.clone(),
                    original_bytes: original.size() as u64,
                    status,
                }
            }
        };
        entries.push(entry);
    }

    let report = CompressReport { format, entries };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_compress_report(&report);
    }
    Ok(())
}

fn run_crop(args: &CropArgs, config: &Config) -> CliResult {
    let rect = CropRect::new(args.x, args.y, args.width, args.height);
    let source = args.input.to_string_lossy();
    let cropped = imaging::crop_image(&source, rect, args.rotation, &config.crop.options())?;

    let out_path = match &args.out {
        Some(out) => out.clone(),
        None => args
            .input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&cropped.name),
    };
    if let Some(dir) = out_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&out_path, &cropped.bytes)?;

    let report = CropReport {
        source: args.input.clone(),
        output: out_path,
        rect,
        rotation: args.rotation,
        output_bytes: cropped.size() as u64,
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_crop_report(&report);
    }
    Ok(())
}
