use std::path::Path;

use image::RgbaImage;
use tracing::{debug, info};

use crate::error::{Result, StageContext};
use crate::io::progress::ProgressTracker;
use crate::io::writers::{NamingContext, write_segment};
use crate::types::OutputFormat;

/// Encode segments in order, numbering them from `offset + 1`.
///
/// Each segment is written, reported to `progress` and dropped before the
/// next one is pulled from `segments`. Returns the last index used, which is
/// the `offset` for the next batch.
pub fn save_segments<I>(
    segments: I,
    folder: &Path,
    format: OutputFormat,
    naming: &NamingContext,
    offset: usize,
    progress: &mut ProgressTracker<'_>,
) -> Result<usize>
where
    I: IntoIterator<Item = RgbaImage>,
{
    std::fs::create_dir_all(folder).stage("create output folder", folder)?;

    let mut index = offset;
    for segment in segments {
        index += 1;
        let output = folder.join(naming.file_name(index, format.extension()));
        debug!(
            "Writing segment {} ({}x{}) to {:?}",
            index,
            segment.width(),
            segment.height(),
            output
        );
        write_segment(&output, segment, format).stage("encode segment", &output)?;
        progress.step();
    }
    info!(
        "Saved {} {} segments to {:?}",
        index - offset,
        format,
        folder
    );
    Ok(index)
}
