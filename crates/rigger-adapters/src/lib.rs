//! Infrastructure adapters for rigger.
//!
//! This crate implements the ports defined in `rigger_core::application::ports`.
//! It contains all external dependencies and I/O operations: spawning the
//! container engine, reading and writing project files, rendering compose
//! fragments and pausing between readiness probes.

pub mod config_writer;
pub mod filesystem;
pub mod process;
pub mod renderer;
pub mod sleeper;

// Re-export commonly used adapters
pub use config_writer::FileConfigWriter;
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use process::{Invocation, ScriptedProcessRunner, SystemProcessRunner};
pub use renderer::BuiltinManifestRenderer;
pub use sleeper::{RecordingSleeper, ThreadSleeper};
