use clap::{ArgAction, Parser, Subcommand};
use imgbatch::imaging::supported_input_extensions;
use imgbatch::{BatchRequest, config, output, process};
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "imgbatch")]
#[command(about = "Batch image converter: resize, re-encode, strip metadata")]
#[command(long_about = "\
Batch image converter: resize, re-encode, strip metadata

Every input is converted on its own. A file that cannot be read or decoded is
reported as failed and the rest of the batch carries on.

Inputs:
  Files are decoded by content, whatever their extension.
  Directories are walked recursively for jpg, jpeg, png, gif, webp and bmp.

Outputs:
  <output>/<input stem>.<format extension>
  Existing files are never overwritten: photo.jpg, photo-1.jpg, photo-2.jpg...

Privacy:
  keep_all   EXIF and ICC profile are copied into JPEG, PNG and WebP outputs
  strip_all  EXIF (GPS, camera, timestamps) is removed; orientation is baked
             into the pixels; the ICC colour profile is kept

Run 'imgbatch gen-config' to generate a documented imgbatch.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: ./imgbatch.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert images into the output directory
    Convert(ConvertArgs),
    /// Print a stock imgbatch.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Image files or directories
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Output directory (created if missing)
    #[arg(short, long)]
    output: PathBuf,

    /// low | medium | high
    #[arg(short, long, default_value = "high")]
    quality: String,

    /// jpeg | png | webp | gif | bmp
    #[arg(short, long, default_value = "jpeg")]
    format: String,

    /// keep_all | strip_all
    #[arg(short, long, default_value = "keep_all")]
    privacy: String,

    /// Maximum output width in pixels; smaller images are never upscaled
    #[arg(short, long)]
    width: Option<u32>,

    /// Print the full result as JSON instead of progress lines
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Convert(args) => {
            let batch_config = match &cli.config {
                Some(path) => config::load_config_file(path)?,
                None => config::load_config(Path::new("."))?,
            };

            let request = BatchRequest {
                paths: expand_inputs(&args.paths),
                quality: args.quality.parse()?,
                format: args.format.parse()?,
                privacy: args.privacy.parse()?,
                width: args.width,
                output_dir: args.output,
            };

            if args.json {
                let result = process::run(&request, &batch_config, None, None)?;
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_batch_event(&event);
                }
            });
            let result = process::run(&request, &batch_config, None, Some(tx));
            printer.join().map_err(|_| "output thread panicked")?;
            output::print_summary(&result?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr so stdout stays clean for progress lines and `--json`.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Expand directory arguments into the image files beneath them.
///
/// File arguments pass through untouched. Each directory's files are sorted
/// so repeated runs see the same order.
fn expand_inputs(args: &[PathBuf]) -> Vec<PathBuf> {
    let mut inputs = Vec::new();
    for arg in args {
        if !arg.is_dir() {
            inputs.push(arg.clone());
            continue;
        }
        let mut found: Vec<PathBuf> = WalkDir::new(arg)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("skipping unreadable entry: {e}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && has_image_extension(entry.path()))
            .map(|entry| entry.into_path())
            .collect();
        found.sort();
        inputs.extend(found);
    }
    inputs
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}
