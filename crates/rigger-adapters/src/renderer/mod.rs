//! Manifest renderer adapters.

mod builtin;
mod fragments;

pub use builtin::BuiltinManifestRenderer;
