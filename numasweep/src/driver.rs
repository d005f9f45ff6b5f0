//! Sweep driver

// Imports
use {
	crate::{
		collaborator::ExternalCommand,
		error::SweepError,
		executor::RunExecutor,
		matrix::ExperimentMatrix,
		run_log::CumulativeLog,
	},
	std::time::Instant,
};

/// Sweep driver.
///
/// Builds the benchmark, resets the log, executes every run of the matrix
/// sequentially and finally plots the log. Each step only starts once the
/// previous one succeeded, and the sweep halts on the first failing run.
#[derive(Debug)]
pub struct SweepDriver<E> {
	/// Matrix
	matrix: ExperimentMatrix,

	/// Log
	log: CumulativeLog,

	/// Executor
	executor: E,

	/// Build command
	build: Option<ExternalCommand>,

	/// Plot command
	plot: Option<ExternalCommand>,
}

impl<E: RunExecutor> SweepDriver<E> {
	/// Creates a new driver, building with `build` before any run
	pub fn new(matrix: ExperimentMatrix, log: CumulativeLog, executor: E, build: ExternalCommand) -> Self {
		Self {
			matrix,
			log,
			executor,
			build: Some(build),
			plot: None,
		}
	}

	/// Creates a new driver that runs the benchmark as-is, without building it
	pub fn without_build(matrix: ExperimentMatrix, log: CumulativeLog, executor: E) -> Self {
		Self {
			matrix,
			log,
			executor,
			build: None,
			plot: None,
		}
	}

	/// Sets the plot command
	pub fn with_plot(mut self, plot: Option<ExternalCommand>) -> Self {
		self.plot = plot;
		self
	}

	/// Returns the executor
	pub fn executor(&self) -> &E {
		&self.executor
	}

	/// Runs the sweep, returning the number of runs executed.
	///
	/// On error, the log is left as-is for inspection.
	pub fn run(&mut self) -> Result<usize, SweepError> {
		let start_time = Instant::now();

		// Build the benchmark
		match &self.build {
			Some(build) => build.run::<[&str; 0]>([]).map_err(SweepError::Build)?,
			None => tracing::warn!("Skipping build, using benchmark as-is"),
		}

		self.log.reset().map_err(|source| SweepError::LogReset {
			path: self.log.path().to_path_buf(),
			source,
		})?;
		tracing::debug!(log_path = ?self.log.path(), "Reset log");

		// Note: Runs must not overlap, they share the pinned nodes.
		let total_runs = self.matrix.len();
		let mut runs = 0;
		for (idx, spec) in self.matrix.iter().enumerate() {
			tracing::info!("[{}/{total_runs}] {spec}", idx + 1);
			self.executor
				.execute(&spec, &self.log)
				.map_err(|source| SweepError::Run {
					number: idx + 1,
					spec,
					source,
				})?;
			runs += 1;
		}
		tracing::info!(runs, elapsed = ?start_time.elapsed(), log_path = ?self.log.path(), "Finished all runs");

		if let Some(plot) = &self.plot {
			plot.run([self.log.path()]).map_err(|source| SweepError::Plot {
				log_path: self.log.path().to_path_buf(),
				runs,
				source,
			})?;
		}

		Ok(runs)
	}
}
