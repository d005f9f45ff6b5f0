//! NUMA benchmark sweep (`numasweep`)
//!
//! Drives a hash-table benchmark through a matrix of experiment
//! configurations, pinning each run to a NUMA node and recording its output
//! into a single cumulative log, and controls the host policies that add
//! measurement noise.

// Modules
pub mod affinity;
pub mod collaborator;
pub mod config;
pub mod driver;
pub mod error;
pub mod executor;
pub mod invocation;
pub mod matrix;
pub mod policy;
pub mod run_log;

// Exports
pub use self::{
	affinity::{AffinityBinding, NodeId},
	collaborator::ExternalCommand,
	config::Config,
	driver::SweepDriver,
	error::{CollaboratorError, PolicyError, PolicyWriteError, RunError, SweepError},
	executor::{ProcessExecutor, RunExecutor},
	invocation::Invocation,
	matrix::{Distribution, ExperimentMatrix, Locality, RunSpec},
	policy::{PolicyController, PolicyReport, Switch},
	run_log::CumulativeLog,
};
