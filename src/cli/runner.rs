use std::path::{Path, PathBuf};

use tracing::info;
use tracing_subscriber::EnvFilter;

use stripcut::io::progress::JsonProgressFile;
use stripcut::{StitchParams, default_output_folder, stitch_directory, stitch_folder};

use super::args::CliArgs;
use super::errors::AppError;

const PROGRESS_FILE_NAME: &str = "progress.json";

fn init_logging(filter: &str) -> Result<(), AppError> {
    let filter = EnvFilter::try_new(filter).map_err(|e| AppError::InvalidLogFilter {
        filter: filter.to_string(),
        reason: e.to_string(),
    })?;
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

/// Config file values first, then any flag given on the command line.
fn build_params(args: &CliArgs) -> Result<StitchParams, AppError> {
    let mut params = match &args.config {
        Some(path) => StitchParams::from_json_file(path)?,
        None => StitchParams::default(),
    };
    if let Some(v) = args.split_height {
        params.split_height = v;
    }
    if let Some(v) = args.output_type {
        params.output_format = v;
    }
    if let Some(v) = args.width_enforcement {
        params.width_enforcement = v;
    }
    if let Some(v) = args.custom_width {
        params.custom_width = v;
    }
    if let Some(v) = args.sensitivity {
        params.sensitivity = v;
    }
    if let Some(v) = args.ignorable_pixels {
        params.ignorable_pixels = v;
    }
    if let Some(v) = args.scan_step {
        params.scan_step = v;
    }
    if let Some(v) = args.strategy {
        params.strategy = v;
    }
    if args.low_ram {
        params.bounded_memory = true;
    }
    if let Some(v) = args.unit_images {
        params.batch_unit_size = v;
    }
    if let Some(v) = &args.template {
        params.filename_template = Some(v.clone());
    }
    if let Some(v) = &args.detector_model {
        params.detector.model_path = Some(v.clone());
    }
    params.validate()?;
    Ok(params)
}

/// `--progress-file`, or `progress.json` inside the output folder.
fn progress_path(args: &CliArgs, output_dir: &Path) -> PathBuf {
    args.progress_file
        .clone()
        .unwrap_or_else(|| output_dir.join(PROGRESS_FILE_NAME))
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(filter) = args.log.as_deref() {
        init_logging(filter)?;
    }

    if !args.input.is_dir() {
        return Err(AppError::MissingInput {
            path: args.input.display().to_string(),
        }
        .into());
    }
    let params = build_params(&args)?;

    let output_dir = match &args.output {
        Some(path) => path.clone(),
        None if args.batch => args.input.clone(),
        None => default_output_folder(&args.input),
    };
    let mut progress = JsonProgressFile::new(progress_path(&args, &output_dir));

    if args.batch {
        info!("Starting batch processing from directory: {:?}", args.input);
        info!("Output directory: {:?}", output_dir);

        let report = stitch_directory(&args.input, &output_dir, &params, true, &mut progress)?;
        info!("Batch processing complete!");
        info!("Processed: {}", report.processed);
        info!("Skipped: {}", report.skipped);
        info!("Errors: {}", report.errors);
        for job in &report.jobs {
            println!("{} -> {:?}", job.segments, job.output_folder);
        }
        if report.errors > 0 {
            return Err(AppError::BatchFailures {
                failed: report.errors,
                total: report.processed + report.skipped + report.errors,
            }
            .into());
        }
    } else {
        let report = stitch_folder(&args.input, &output_dir, &params, &mut progress)
            .map_err(AppError::from)?;
        info!(
            "Successfully stitched {:?} -> {:?} ({} segments)",
            report.input_folder, report.output_folder, report.segments
        );
        println!("{} -> {:?}", report.segments, report.output_folder);
    }

    Ok(())
}
