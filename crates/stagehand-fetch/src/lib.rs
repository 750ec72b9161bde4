//! Stagehand Fetch - fetch backends for deployment sources
//!
//! Implements the fetch contract for the `stagehand-core` source
//! variants:
//! - manifests are downloaded as-is
//! - Helm charts are pulled from their repository (standard
//!   `{repo}/{name}-{version}.tgz` layout) and unpacked
//! - archives are downloaded and extracted through their glob-based
//!   path rules
//!
//! All backends stage content next to the destination directory and
//! publish it atomically on success; a failed fetch never leaves a
//! partially populated destination.

pub mod backend;
pub mod error;

mod stage;

pub use backend::{FetchBackend, Fetcher};
pub use error::{FetchError, Result};
