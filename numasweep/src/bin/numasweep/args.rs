//! Arguments

// Imports
use std::path::PathBuf;

/// Arguments
#[derive(Debug)]
#[derive(clap::Parser)]
pub struct Args {
	/// Log file
	///
	/// Specifies a file to perform verbose logging to.
	/// You can use `RUST_LOG_FILE` to set filtering options
	#[clap(long = "log-file")]
	pub log_file: Option<PathBuf>,

	/// Whether to append to the log file
	#[clap(long = "log-file-append")]
	pub log_file_append: bool,

	/// Config file
	///
	/// Uses the default read-only sweep if not given.
	#[clap(long = "config")]
	pub config_file: Option<PathBuf>,

	/// Sub-command
	#[command(subcommand)]
	pub sub_cmd: SubCmd,
}

/// Sub-command
#[derive(Debug, clap::Subcommand)]
pub enum SubCmd {
	/// Builds the benchmark, runs every configuration and plots the results
	#[clap(name = "sweep")]
	Sweep(Sweep),

	/// Lists every run of the sweep, in order, without running anything
	#[clap(name = "matrix")]
	Matrix,

	/// Host policy
	#[clap(name = "policy", subcommand)]
	Policy(Policy),
}

/// Sweep
#[derive(Debug, clap::Args)]
pub struct Sweep {
	/// Cumulative log, overriding the configured one
	#[clap(long = "log")]
	pub log: Option<PathBuf>,

	/// Use the benchmark as-is, without building it
	#[clap(long = "skip-build")]
	pub skip_build: bool,

	/// Don't plot the log once finished
	#[clap(long = "skip-plot")]
	pub skip_plot: bool,
}

/// Host policy
#[derive(Debug, clap::Subcommand)]
pub enum Policy {
	/// Disables every noisy kernel feature
	#[clap(name = "apply")]
	Apply,

	/// Shows the current value of every switch
	#[clap(name = "status")]
	Status,
}
