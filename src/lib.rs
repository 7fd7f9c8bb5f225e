//! seapack - A Node.js application packager
//!
//! This crate provides the core library functionality for seapack,
//! including target validation, strategy decisions, runtime resolution,
//! and the native and legacy packaging pipelines.

pub mod builder;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test utilities and mocks for seapack unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides mock implementations for process
/// execution, HTTP downloads, and the legacy toolchain.
#[cfg(test)]
pub mod test_support;

pub use core::{
    decision::{BuildDecision, BuildMode},
    result::BuildResult,
    target::Target,
};

pub use util::context::GlobalContext;
