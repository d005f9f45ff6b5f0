//! Errors

// Imports
use {
	crate::{matrix::RunSpec, policy::Switch},
	itertools::Itertools,
	std::{io, path::PathBuf, process::ExitStatus},
};

/// Sweep error
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
	/// The benchmark could not be built.
	///
	/// No run was attempted.
	#[error("Unable to build benchmark")]
	Build(#[source] CollaboratorError),

	/// The log could not be reset
	#[error("Unable to reset log {path:?}")]
	LogReset {
		path:   PathBuf,
		#[source]
		source: io::Error,
	},

	/// A run failed, halting the sweep
	#[error("Run #{number} ({spec}) failed")]
	Run {
		number: usize,
		spec:   RunSpec,
		#[source]
		source: RunError,
	},

	/// Plotting failed after every run completed.
	///
	/// The log is retained.
	#[error("Unable to plot log {log_path:?} ({runs} runs recorded)")]
	Plot {
		log_path: PathBuf,
		runs:     usize,
		#[source]
		source:   CollaboratorError,
	},
}

/// Run error
#[derive(Debug, thiserror::Error)]
pub enum RunError {
	#[error("Unable to open log")]
	OpenLog(#[source] io::Error),

	#[error("Unable to spawn {program:?}")]
	Spawn {
		program: PathBuf,
		#[source]
		source:  io::Error,
	},

	#[error("Unable to record output")]
	Record(#[source] io::Error),

	#[error("Unable to wait for benchmark")]
	Wait(#[source] io::Error),

	#[error("Benchmark exited with {0}")]
	ExitStatus(ExitStatus),
}

/// External command error
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
	#[error("Unable to spawn {program:?}")]
	Spawn {
		program: PathBuf,
		#[source]
		source:  io::Error,
	},

	#[error("{program:?} exited with {status}")]
	ExitStatus { program: PathBuf, status: ExitStatus },
}

/// Policy error
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
	/// Privilege escalation is unavailable, so no switch was written
	#[error("Privilege escalation is unavailable")]
	EscalationUnavailable(#[source] PolicyWriteError),

	/// Some switches could not be applied
	#[error("Unable to apply {}", .failed.iter().join(", "))]
	Failed { failed: Vec<Switch> },
}

/// Error writing a single policy switch
#[derive(Debug, thiserror::Error)]
pub enum PolicyWriteError {
	#[error("Unable to access {path:?}")]
	Io {
		path:   PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("Unable to spawn {program:?}")]
	Spawn {
		program: PathBuf,
		#[source]
		source:  io::Error,
	},

	#[error("{program:?} exited with {status}: {stderr}")]
	Escalated {
		program: PathBuf,
		status:  ExitStatus,
		stderr:  String,
	},
}
