//! Runtime binary sources.
//!
//! Sources are responsible for locating Node.js executables for a target:
//! the local cache, the official distribution and the legacy toolchain's
//! fetcher.

pub mod dist;
pub mod download;
pub mod legacy_fetch;
pub mod runtime;

pub use download::{HttpClient, ReqwestClient};
pub use legacy_fetch::{LegacyFetcher, PkgFetchCli};
pub use runtime::{ExtendedVersionResolver, ResolvedRuntime, ResolverConfig};
