//! High-level operations.
//!
//! This module contains the implementation of seapack commands.

pub mod doctor;
pub mod explain;
pub mod hybrid_build;
pub mod legacy;

pub use doctor::{doctor, format_report, DoctorOptions, DoctorReport};
pub use explain::{capability_matrix, format_matrix, format_plan, CapabilityRow};
pub use hybrid_build::{HybridBuilder, HybridOptions, HybridReport, StrategySummary, TargetOutcome};
pub use legacy::{LegacyPackager, LegacyRequest, PkgCli};
