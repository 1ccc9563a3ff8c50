//! I/O layer: folder listing and frame decoding (`loader`), the progress side
//! channel (`progress`), and segment `writers` with filename templating.
pub mod loader;
pub use loader::{list_image_files, load_frame, load_frames};

pub mod progress;
pub use progress::{JsonProgressFile, NoProgress, ProgressSink, ProgressState, ProgressTracker};

pub mod writers;
