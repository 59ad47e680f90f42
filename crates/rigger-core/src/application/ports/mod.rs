//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `rigger-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `ProcessRunner`: container engine invocations
//!   - `Filesystem`: manifest reads and writes
//!   - `ManifestRenderer`: compose fragments per service key
//!   - `ConfigWriter`: configuration operations on project files
//!   - `Sleeper`: readiness poll pacing
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

pub use output::{ConfigWriter, Filesystem, ManifestRenderer, ProcessRunner, Sleeper};

#[cfg(test)]
pub use output::{
    MockConfigWriter, MockFilesystem, MockManifestRenderer, MockProcessRunner, MockSleeper,
};
