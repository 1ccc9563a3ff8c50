//! Command Line Interface (CLI) layer for stripcut.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) for single-folder and batch
//! stitching. It wires user-provided options, optionally layered over a JSON
//! config file, to the library functionality exposed via `stripcut::api`.
//!
//! If you are embedding stripcut into another application, prefer using
//! the high-level `stripcut::api` module instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
