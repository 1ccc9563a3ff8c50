pub mod combine;
pub mod ops;
pub mod padding;
pub mod pipeline;
pub mod resize;
pub mod save;
pub mod split;
pub mod streaming;

pub use pipeline::Stitcher;
pub use split::{ExclusionSource, SplitPlan, SplitSettings, plan_splits};
