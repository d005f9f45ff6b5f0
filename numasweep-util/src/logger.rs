//! Logger

// Imports
use {
	std::{fs, io, path::Path, sync::Mutex},
	tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter},
};

/// Initializes the logger.
///
/// Logs to stderr, filtered by `RUST_LOG` (`info` by default), and, if
/// `log_file` is given, verbosely to that file, filtered by `RUST_LOG_FILE`
/// (`debug` by default).
///
/// Any messages buffered through [`pre_init`] are emitted once initialized.
pub fn init(log_file: Option<&Path>, log_file_append: bool) {
	let term_filter = EnvFilter::builder()
		.with_default_directive(LevelFilter::INFO.into())
		.from_env_lossy();
	let term_layer = fmt::layer().with_writer(io::stderr).with_filter(term_filter);

	let file_layer = log_file
		.and_then(|log_file| match self::open_log_file(log_file, log_file_append) {
			Ok(file) => Some(file),
			Err(err) => {
				// Note: We can't log it yet, since the logger isn't initialized
				eprintln!("Unable to open log file {log_file:?}, ignoring: {err}");
				None
			},
		})
		.map(|file| {
			let file_filter = EnvFilter::builder()
				.with_env_var("RUST_LOG_FILE")
				.with_default_directive(LevelFilter::DEBUG.into())
				.from_env_lossy();
			fmt::layer()
				.with_ansi(false)
				.with_writer(Mutex::new(file))
				.with_filter(file_filter)
		});

	if let Err(err) = tracing_subscriber::registry()
		.with(term_layer)
		.with(file_layer)
		.try_init()
	{
		eprintln!("Unable to initialize logger: {err}");
	}

	pre_init::flush();
}

/// Opens the log file
fn open_log_file(path: &Path, append: bool) -> Result<fs::File, io::Error> {
	fs::OpenOptions::new()
		.create(true)
		.write(true)
		.append(append)
		.truncate(!append)
		.open(path)
}

/// Logging before the logger is initialized.
///
/// Messages are buffered and emitted by [`init`](super::init).
pub mod pre_init {
	// Imports
	use std::sync::Mutex;

	/// Buffered debug messages
	static MESSAGES: Mutex<Vec<String>> = Mutex::new(Vec::new());

	/// Buffers a debug message
	pub fn debug(msg: impl Into<String>) {
		// Note: A poisoned lock only means another thread panicked while pushing
		MESSAGES.lock().unwrap_or_else(|err| err.into_inner()).push(msg.into());
	}

	/// Emits all buffered messages
	pub(super) fn flush() {
		let messages = std::mem::take(&mut *MESSAGES.lock().unwrap_or_else(|err| err.into_inner()));
		for msg in messages {
			tracing::debug!("{msg}");
		}
	}
}
