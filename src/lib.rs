#![doc = r#"
stripcut: re-paginate vertical comic strips.

This crate takes a folder of comic/webtoon pages, normalizes their widths, stacks
them into one tall canvas and cuts that canvas into new pages of roughly a chosen
height. Cuts are placed on visually quiet rows (where the row has little pixel
variation) and, when an ONNX speech-bubble detector is available, never through a
detected bubble or text block. It powers the `stripcut` CLI and can be embedded in
your own Rust applications.

Stability
---------
The public library API is experimental in initial releases and may evolve as the
crate stabilizes. Breaking changes can occur.

Features
--------
- `detector` (default): bubble/text avoidance through ONNX Runtime (`ort`).
  Without it, or without a model file, cuts only avoid busy rows.

Add dependency
--------------
```toml
[dependencies]
stripcut = "0.1"
```

Quick start: stitch a chapter folder
------------------------------------
```rust,no_run
use std::path::Path;
use stripcut::{NoProgress, OutputFormat, SplitStrategy, StitchParams, WidthEnforcement};

fn main() -> stripcut::Result<()> {
    let params = StitchParams {
        split_height: 3000,
        output_format: OutputFormat::Jpeg,
        width_enforcement: WidthEnforcement::MatchMinimum,
        strategy: SplitStrategy::Windowed,
        ..StitchParams::default()
    };

    let report = stripcut::stitch_folder(
        Path::new("/comics/Chapter 12"),
        Path::new("/comics/Chapter 12 [Stitched]"),
        &params,
        &mut NoProgress,
    )?;
    println!("wrote {} pages", report.segments);
    Ok(())
}
```

Bounded memory and progress
---------------------------
For very long chapters, `bounded_memory` processes `batch_unit_size` files at a
time, carrying the last page of each batch into the next. Progress is published
to any [`ProgressSink`]; [`JsonProgressFile`] mirrors it into a JSON file:

```rust,no_run
use std::path::Path;
use stripcut::{JsonProgressFile, StitchParams};

fn main() -> stripcut::Result<()> {
    let params = StitchParams {
        bounded_memory: true,
        batch_unit_size: 10,
        ..StitchParams::default()
    };
    let mut progress = JsonProgressFile::new("/tmp/progress.json");
    let report = stripcut::stitch_directory(
        Path::new("/comics/Series"),
        Path::new("/comics/Series out"),
        &params,
        true,
        &mut progress,
    )?;
    println!("{} chapters, {} skipped", report.processed, report.skipped);
    Ok(())
}
```

Bubble avoidance
----------------
Point `params.detector.model_path` at a YOLO-style comic text/bubble ONNX model.
A missing or unloadable model is logged and the job continues without avoidance.

Useful modules
--------------
- [`api`]: high-level, ergonomic entry points.
- [`core`]: resizing, combining, split planning and the job drivers.
- [`detection`]: exclusion ranges, detectors and the per-cut probe.
- [`io`]: loading frames, progress sinks, segment writers.
- [`types`]: enums shared by the library and CLI.
- [`error`]: crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod detection;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use crate::core::params::{DetectorParams, SplitTuning, StitchParams};
pub use error::{Error, Result};
pub use types::{OutputFormat, SplitStrategy, WidthEnforcement};

// Building blocks
pub use crate::core::processing::{SplitPlan, SplitSettings, Stitcher, plan_splits};
pub use detection::{ExclusionDetector, ExclusionRange, NoDetector, select_detector};
pub use io::progress::{JsonProgressFile, NoProgress, ProgressSink, ProgressState};

// High-level API re-exports
pub use api::{
    BatchReport, StitchReport, default_output_folder, stitch_directory,
    stitch_directory_with_cancel, stitch_folder, stitch_folder_with_cancel,
};
