//! Dependency tracking and rebuild decisions for translated build units.
//!
//! For each unit this crate asks the external tool which files the unit
//! depends on, decides from the persisted fingerprints whether the existing
//! artifact is still valid, rebuilds it if not, and collects every unit's
//! dependency set so the batch can commit them to the fingerprint table in
//! one update.
//!
//! The pieces, leaves first:
//!
//! - [`depfile`] parses the tool's makefile-style dependency report.
//! - [`DependencyExtractor`] runs the report invocation per source.
//! - [`Orchestrator`] processes one unit: extract, check, rebuild, register.
//! - [`LifecycleCoordinator`] owns the per-batch registrations and the store.
//! - [`Session`] adapts all of this to resolve/load/start/end host hooks, and
//!   [`run_batch`] drives a whole batch on a worker pool.

#![warn(missing_docs)]

pub mod batch;
pub mod depfile;
pub mod error;
pub mod extract;
pub mod lifecycle;
pub mod orchestrator;
pub mod session;
pub mod toolchain;
pub mod unit;

pub use batch::{run_batch, BatchReport, UnitFailure, UnitRequest};
pub use error::{BuildError, ExtractionFailed};
pub use extract::{DependencyExtractor, Extraction};
pub use lifecycle::{BatchCommit, LifecycleCoordinator};
pub use orchestrator::Orchestrator;
pub use session::{Session, UnitStatus};
pub use toolchain::{EmccToolchain, ToolOutput, Toolchain};
pub use unit::{Artifact, BuildEnv, BuildUnit, ContentKind, RawAttributes, UnitAttributes};
