//! Core data structures for seapack.
//!
//! This module contains the packaging data model and the pure logic that
//! works on it:
//! - Targets and host detection
//! - The runtime capability model
//! - Target validation
//! - Build strategy decisions

pub mod capability;
pub mod decision;
pub mod error;
pub mod host;
pub mod result;
pub mod target;
pub mod validate;

pub use capability::{capability_of, native_capabilities_of, CapabilityInfo, NativeCapabilities};
pub use decision::{decide, BuildDecision, BuildMode, ProjectTraits};
pub use error::PackError;
pub use host::{HostInfo, HostRuntime};
pub use result::BuildResult;
pub use target::{Arch, Platform, Target};
pub use validate::{validate, Validation};
