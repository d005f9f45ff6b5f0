//! External collaborators (build and plot commands)

// Imports
use {
	crate::{config::CommandConfig, error::CollaboratorError},
	numasweep_util::CommandDisplay,
	std::{ffi::OsStr, process::Command},
};

/// External command
#[derive(Clone, Debug)]
pub struct ExternalCommand {
	/// Name, for logging
	name: &'static str,

	/// Configuration
	config: CommandConfig,
}

impl ExternalCommand {
	/// Creates a new external command
	pub fn new(name: &'static str, config: CommandConfig) -> Self {
		Self { name, config }
	}

	/// Runs this command to completion with `extra_args` appended.
	///
	/// Standard streams are inherited.
	pub fn run<I>(&self, extra_args: I) -> Result<(), CollaboratorError>
	where
		I: IntoIterator,
		I::Item: AsRef<OsStr>,
	{
		let mut command = Command::new(&self.config.program);
		command.args(&self.config.args).args(extra_args);
		if let Some(dir) = &self.config.dir {
			command.current_dir(dir);
		}

		tracing::info!(name = self.name, command = %command.to_shell_line(), "Running command");
		let status = command.status().map_err(|source| CollaboratorError::Spawn {
			program: self.config.program.clone(),
			source,
		})?;

		match status.success() {
			true => Ok(()),
			false => Err(CollaboratorError::ExitStatus {
				program: self.config.program.clone(),
				status,
			}),
		}
	}
}
