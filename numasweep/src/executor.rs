//! Run executor

// Imports
use {
	crate::{error::RunError, invocation::Invocation, matrix::RunSpec, run_log::CumulativeLog},
	numasweep_util::CommandDisplay,
	std::{
		io::{self, BufRead, Write},
		path::PathBuf,
		process::{Child, Stdio},
		time::Instant,
	},
};

/// Run executor
pub trait RunExecutor {
	/// Executes a single run, appending its output to `log`.
	///
	/// Returns once the run has finished. Output is appended while it is
	/// produced, so a failing run may leave partial output in the log.
	fn execute(&mut self, spec: &RunSpec, log: &CumulativeLog) -> Result<(), RunError>;
}

/// Executes each run as a subprocess.
///
/// The subprocess' standard output is duplicated, line by line, to the log
/// and to `terminal`. Standard error is inherited.
#[derive(Debug)]
pub struct ProcessExecutor<W> {
	/// Invocation
	invocation: Invocation,

	/// Terminal output
	terminal: W,
}

impl ProcessExecutor<io::Stdout> {
	/// Creates an executor echoing to standard output
	pub fn new(invocation: Invocation) -> Self {
		Self::with_terminal(invocation, io::stdout())
	}
}

impl<W: Write> ProcessExecutor<W> {
	/// Creates an executor echoing to `terminal`
	pub fn with_terminal(invocation: Invocation, terminal: W) -> Self {
		Self { invocation, terminal }
	}

	/// Returns the terminal output
	pub fn terminal(&self) -> &W {
		&self.terminal
	}
}

impl<W: Write> RunExecutor for ProcessExecutor<W> {
	fn execute(&mut self, spec: &RunSpec, log: &CumulativeLog) -> Result<(), RunError> {
		let mut command = self.invocation.command(spec);
		command.stdin(Stdio::null()).stdout(Stdio::piped());
		tracing::info!(%spec, binding = %spec.affinity(), command = %command.to_shell_line(), "Starting run");

		let mut log_file = log.open_append().map_err(RunError::OpenLog)?;

		let start_time = Instant::now();
		let mut child = command.spawn().map_err(|source| RunError::Spawn {
			program: PathBuf::from(command.get_program()),
			source,
		})?;

		let Some(stdout) = child.stdout.take() else {
			self::kill(&mut child);
			return Err(RunError::Record(io::Error::new(
				io::ErrorKind::BrokenPipe,
				"Benchmark stdout was not captured",
			)));
		};
		let mut stdout = io::BufReader::new(stdout);
		if let Err(err) = self::tee(&mut stdout, &mut log_file, &mut self.terminal) {
			self::kill(&mut child);
			return Err(RunError::Record(err));
		}

		let status = child.wait().map_err(RunError::Wait)?;
		let elapsed = start_time.elapsed();
		match status.success() {
			true => {
				tracing::info!(%spec, ?elapsed, "Run finished");
				Ok(())
			},
			false => {
				tracing::error!(%spec, ?elapsed, %status, "Run failed");
				Err(RunError::ExitStatus(status))
			},
		}
	}
}

/// Copies every line of `input` to both `log` and `terminal`, in order.
///
/// Each line is written to the log with a single write, so records are never
/// split.
fn tee(input: &mut impl BufRead, log: &mut impl Write, terminal: &mut impl Write) -> Result<(), io::Error> {
	let mut line = vec![];
	loop {
		line.clear();
		if input.read_until(b'\n', &mut line)? == 0 {
			break;
		}

		log.write_all(&line)?;
		log.flush()?;

		// Note: Losing the terminal copy is not worth failing the run over.
		if let Err(err) = terminal.write_all(&line).and_then(|()| terminal.flush()) {
			tracing::warn!(?err, "Unable to echo run output");
		}
	}

	Ok(())
}

/// Kills and reaps `child`
fn kill(child: &mut Child) {
	if let Err(err) = child.kill() {
		tracing::warn!(?err, "Unable to kill benchmark");
	}
	if let Err(err) = child.wait() {
		tracing::warn!(?err, "Unable to wait for killed benchmark");
	}
}
