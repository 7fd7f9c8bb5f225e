//! Native single-executable assembly.
//!
//! This module drives the host runtime and the external injection and
//! signing tools that turn a script into a self-contained binary.

pub mod events;
pub mod native;
pub mod sea_config;
pub mod signing;

pub use events::BuildEvent;
pub use native::{NativeAssembler, NativeBuildOptions, NativeTools};
pub use sea_config::SeaConfig;
pub use signing::SigningTools;
