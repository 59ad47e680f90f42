//! Process runner adapters.

mod scripted;
mod system;

pub use scripted::{Invocation, ScriptedProcessRunner};
pub use system::SystemProcessRunner;
