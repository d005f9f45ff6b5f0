//! Cumulative run log

// Imports
use {
	std::{
		fs,
		io::{self, BufRead},
		path::{Path, PathBuf},
	},
};

/// Cumulative log.
///
/// Holds the raw output of every run of a single sweep, in run order.
/// Its contents are never parsed by the sweep itself.
#[derive(Clone, Debug)]
pub struct CumulativeLog {
	/// Path
	path: PathBuf,
}

impl CumulativeLog {
	/// Creates a new log at `path`.
	///
	/// Does not touch the file system.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Returns the path of this log
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Resets this log to an empty file, creating it if it doesn't exist
	pub fn reset(&self) -> Result<(), io::Error> {
		if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
			fs::create_dir_all(parent)?;
		}

		fs::OpenOptions::new()
			.write(true)
			.create(true)
			.truncate(true)
			.open(&self.path)?;

		Ok(())
	}

	/// Opens this log for appending
	pub fn open_append(&self) -> Result<fs::File, io::Error> {
		fs::OpenOptions::new().create(true).append(true).open(&self.path)
	}

	/// Reads all records currently in this log
	pub fn records(&self) -> Result<Vec<String>, io::Error> {
		let file = fs::File::open(&self.path)?;
		io::BufReader::new(file).lines().collect()
	}
}
