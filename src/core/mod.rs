//! Core processing building blocks: resize/padding, canvas combining, split
//! planning, the unbounded and streaming job drivers, and save helpers. These
//! are internal primitives consumed by the high-level `api` module.
pub mod params;
pub mod processing;
