use clap::Parser;
use std::path::PathBuf;

use stripcut::types::OutputFormat;
use stripcut::{SplitStrategy, WidthEnforcement};

fn parse_output_type(value: &str) -> Result<OutputFormat, String> {
    OutputFormat::from_extension(value).map_err(|e| e.to_string())
}

#[derive(Parser)]
#[command(name = "stripcut", version, about = "Re-paginate vertical comic strips")]
pub struct CliArgs {
    /// Input folder of page images (or of chapter folders with --batch)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output folder; defaults to "<input> [Stitched]" (batch: the input folder)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON file with stitching parameters; flags given explicitly override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Rough height of each output page in pixels
    #[arg(short = 'H', long)]
    pub split_height: Option<u32>,

    /// Output file type (.png, .jpg, .jpeg, .bmp, .tif, .tiff, .tga)
    #[arg(short = 't', long, value_parser = parse_output_type)]
    pub output_type: Option<OutputFormat>,

    /// Width enforcement (none, match-minimum, custom)
    #[arg(short = 'w', long, value_enum)]
    pub width_enforcement: Option<WidthEnforcement>,

    /// Target width for --width-enforcement custom
    #[arg(long)]
    pub custom_width: Option<u32>,

    /// Cut sensitivity, 0-100; higher accepts busier rows
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub sensitivity: Option<u8>,

    /// Pixels ignored at both row edges when judging a cut
    #[arg(long)]
    pub ignorable_pixels: Option<u32>,

    /// Rows moved per search step, 1-20
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=20))]
    pub scan_step: Option<u32>,

    /// Cut search strategy (nudge or windowed)
    #[arg(long, value_enum)]
    pub strategy: Option<SplitStrategy>,

    /// Process files in batches to bound memory use
    #[arg(short = 'l', long, default_value_t = false)]
    pub low_ram: bool,

    /// Files per batch in low-RAM mode
    #[arg(long)]
    pub unit_images: Option<usize>,

    /// Output filename template ({num}, {char}, {ext}, {parent}, {date}, {time})
    #[arg(long)]
    pub template: Option<String>,

    /// ONNX bubble/text detector model; without it cuts only avoid busy rows
    #[arg(long)]
    pub detector_model: Option<PathBuf>,

    /// Treat every subfolder of --input as a chapter
    #[arg(short, long, default_value_t = false)]
    pub batch: bool,

    /// Write {"processed","total","done"} JSON progress to this file
    /// (default: progress.json in the output folder)
    #[arg(long)]
    pub progress_file: Option<PathBuf>,

    /// Enable logging (optionally with a filter such as "stripcut=trace")
    #[arg(long, num_args = 0..=1, default_missing_value = "debug")]
    pub log: Option<String>,
}
