//! Host policy
//!
//! Suppresses kernel features that add noise to measurements by writing
//! their "off" value to each control file. Every write is independent and
//! idempotent. Previous values are not saved or restored.

// Imports
use {
	crate::error::{PolicyError, PolicyWriteError},
	std::{
		fmt,
		fs,
		io::{self, Write},
		path::{Path, PathBuf},
		process::{Command, Stdio},
	},
};

/// Policy switch
#[derive(PartialEq, Eq, Clone, Copy, Hash, Debug)]
pub enum Switch {
	/// Automatic NUMA page migration
	NumaBalancing,

	/// Kernel same-page merging
	KsmRun,

	/// Kernel same-page merging across NUMA nodes
	KsmMergeAcrossNodes,

	/// Transparent huge pages
	TransparentHugepage,

	/// Simultaneous multi-threading
	SmtControl,
}

impl Switch {
	/// All switches, in the order they're applied
	pub const ALL: [Self; 5] = [
		Self::NumaBalancing,
		Self::KsmRun,
		Self::KsmMergeAcrossNodes,
		Self::TransparentHugepage,
		Self::SmtControl,
	];

	/// Returns the name of this switch
	pub fn name(self) -> &'static str {
		match self {
			Self::NumaBalancing => "numa_balancing",
			Self::KsmRun => "ksm.run",
			Self::KsmMergeAcrossNodes => "ksm.merge_across_nodes",
			Self::TransparentHugepage => "transparent_hugepage.enabled",
			Self::SmtControl => "smt.control",
		}
	}

	/// Returns the control file of this switch, relative to the root
	pub fn path(self) -> &'static str {
		match self {
			Self::NumaBalancing => "proc/sys/kernel/numa_balancing",
			Self::KsmRun => "sys/kernel/mm/ksm/run",
			Self::KsmMergeAcrossNodes => "sys/kernel/mm/ksm/merge_across_nodes",
			Self::TransparentHugepage => "sys/kernel/mm/transparent_hugepage/enabled",
			Self::SmtControl => "sys/devices/system/cpu/smt/control",
		}
	}

	/// Returns the value disabling this switch
	pub fn disabled_value(self) -> &'static str {
		match self {
			Self::NumaBalancing | Self::KsmRun | Self::KsmMergeAcrossNodes => "0",
			Self::TransparentHugepage => "never",
			Self::SmtControl => "off",
		}
	}
}

impl fmt::Display for Switch {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.pad(self.name())
	}
}

/// How to obtain the privilege to write switches
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Escalation {
	/// Write through `sudo tee`
	Sudo,

	/// Write directly, for when already privileged
	None,
}

/// Policy writer
pub trait PolicyWriter {
	/// Checks that this writer is able to write with elevated privileges
	fn ensure_escalation(&mut self) -> Result<(), PolicyWriteError>;

	/// Writes `value` to the control file at `path`
	fn write(&mut self, path: &Path, value: &str) -> Result<(), PolicyWriteError>;
}

impl<W: PolicyWriter + ?Sized> PolicyWriter for Box<W> {
	fn ensure_escalation(&mut self) -> Result<(), PolicyWriteError> {
		(**self).ensure_escalation()
	}

	fn write(&mut self, path: &Path, value: &str) -> Result<(), PolicyWriteError> {
		(**self).write(path, value)
	}
}

/// Writes control files directly.
///
/// Control files are never created, so a missing feature is reported
/// as an error.
#[derive(Clone, Copy, Default, Debug)]
pub struct DirectWriter;

impl PolicyWriter for DirectWriter {
	fn ensure_escalation(&mut self) -> Result<(), PolicyWriteError> {
		Ok(())
	}

	fn write(&mut self, path: &Path, value: &str) -> Result<(), PolicyWriteError> {
		let to_err = |source| PolicyWriteError::Io {
			path: path.to_path_buf(),
			source,
		};

		let mut file = fs::OpenOptions::new()
			.write(true)
			.truncate(true)
			.open(path).map_err(to_err)?;
		file.write_all(format!("{value}\n").as_bytes()).map_err(to_err)?;

		Ok(())
	}
}

/// Writes control files through `sudo -n tee`
#[derive(Clone, Debug)]
pub struct SudoWriter {
	/// `sudo` program
	program: PathBuf,
}

impl SudoWriter {
	/// Creates a new writer using `program` as `sudo`
	pub fn new(program: impl Into<PathBuf>) -> Self {
		Self {
			program: program.into(),
		}
	}

	fn spawn_err(&self, source: io::Error) -> PolicyWriteError {
		PolicyWriteError::Spawn {
			program: self.program.clone(),
			source,
		}
	}
}

impl Default for SudoWriter {
	fn default() -> Self {
		Self::new("sudo")
	}
}

impl PolicyWriter for SudoWriter {
	fn ensure_escalation(&mut self) -> Result<(), PolicyWriteError> {
		let output = Command::new(&self.program)
			.args(["-n", "true"])
			.stdin(Stdio::null())
			.output()
			.map_err(|err| self.spawn_err(err))?;

		match output.status.success() {
			true => Ok(()),
			false => Err(PolicyWriteError::Escalated {
				program: self.program.clone(),
				status:  output.status,
				stderr:  String::from_utf8_lossy(&output.stderr).trim().to_owned(),
			}),
		}
	}

	fn write(&mut self, path: &Path, value: &str) -> Result<(), PolicyWriteError> {
		let mut child = Command::new(&self.program)
			.args(["-n", "tee"])
			.arg(path)
			.stdin(Stdio::piped())
			.stdout(Stdio::null())
			.stderr(Stdio::piped())
			.spawn()
			.map_err(|err| self.spawn_err(err))?;

		// Note: `stdin` is dropped after writing, so `tee` sees the end of input.
		let write_res = match child.stdin.take() {
			Some(mut stdin) => stdin.write_all(format!("{value}\n").as_bytes()),
			None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "`tee` stdin was not captured")),
		};

		let output = child.wait_with_output().map_err(|err| self.spawn_err(err))?;
		if !output.status.success() {
			return Err(PolicyWriteError::Escalated {
				program: self.program.clone(),
				status:  output.status,
				stderr:  String::from_utf8_lossy(&output.stderr).trim().to_owned(),
			});
		}

		write_res.map_err(|source| PolicyWriteError::Io {
			path: path.to_path_buf(),
			source,
		})
	}
}

/// Policy controller
#[derive(Debug)]
pub struct PolicyController<W> {
	/// Root that control files are resolved against
	root: PathBuf,

	/// Writer
	writer: W,
}

impl<W: PolicyWriter> PolicyController<W> {
	/// Creates a new controller
	pub fn new(root: impl Into<PathBuf>, writer: W) -> Self {
		Self {
			root: root.into(),
			writer,
		}
	}

	/// Returns the control file path of `switch`
	pub fn switch_path(&self, switch: Switch) -> PathBuf {
		self.root.join(switch.path())
	}

	/// Disables every switch.
	///
	/// # Errors
	/// Returns an error only if privilege escalation is unavailable, in which case nothing is written.
	/// Failures of individual switches are reported in the returned [`PolicyReport`].
	pub fn apply(&mut self) -> Result<PolicyReport, PolicyError> {
		self.writer
			.ensure_escalation()
			.map_err(PolicyError::EscalationUnavailable)?;

		let outcomes = Switch::ALL
			.into_iter()
			.map(|switch| {
				let path = self.switch_path(switch);
				let value = switch.disabled_value();
				let res = self.writer.write(&path, value);
				match &res {
					Ok(()) => tracing::info!(%switch, ?path, value, "Applied switch"),
					Err(err) => tracing::warn!(%switch, ?path, value, ?err, "Unable to apply switch"),
				}

				(switch, res)
			})
			.collect();

		Ok(PolicyReport { outcomes })
	}

	/// Reads the current value of every switch
	pub fn query(&self) -> Vec<SwitchStatus> {
		Switch::ALL
			.into_iter()
			.map(|switch| {
				let path = self.switch_path(switch);
				let value = fs::read_to_string(&path).map(|raw| self::active_value(&raw).to_owned());
				if let Err(err) = &value {
					tracing::debug!(%switch, ?path, ?err, "Unable to read switch");
				}

				SwitchStatus { switch, value }
			})
			.collect()
	}
}

/// Outcome of [`PolicyController::apply`]
#[derive(Debug)]
pub struct PolicyReport {
	/// Outcome of each switch, in order
	outcomes: Vec<(Switch, Result<(), PolicyWriteError>)>,
}

impl PolicyReport {
	/// Returns the outcome of every switch, in the order they were applied
	pub fn outcomes(&self) -> &[(Switch, Result<(), PolicyWriteError>)] {
		&self.outcomes
	}

	/// Returns all switches that couldn't be applied
	pub fn failed(&self) -> Vec<Switch> {
		self.outcomes
			.iter()
			.filter(|(_, res)| res.is_err())
			.map(|&(switch, _)| switch)
			.collect()
	}

	/// Returns an error if any switch couldn't be applied
	pub fn ensure_applied(&self) -> Result<(), PolicyError> {
		let failed = self.failed();
		match failed.is_empty() {
			true => Ok(()),
			false => Err(PolicyError::Failed { failed }),
		}
	}
}

/// Current value of a switch
#[derive(Debug)]
pub struct SwitchStatus {
	pub switch: Switch,

	/// Active value, or why it couldn't be read
	pub value: Result<String, io::Error>,
}

/// Returns the active value of a control file's contents.
///
/// Files listing every choice, like `always madvise [never]`, have the
/// active one bracketed.
pub fn active_value(raw: &str) -> &str {
	let raw = raw.trim();
	raw.split_whitespace()
		.find_map(|choice| choice.strip_prefix('[')?.strip_suffix(']'))
		.unwrap_or(raw)
}

#[cfg(test)]
mod tests {
	use super::*;

	/// Creates a fake root with every switch enabled
	fn fake_root() -> tempfile::TempDir {
		let root = tempfile::tempdir().expect("Unable to create temporary directory");
		for (switch, value) in [
			(Switch::NumaBalancing, "1"),
			(Switch::KsmRun, "1"),
			(Switch::KsmMergeAcrossNodes, "1"),
			(Switch::TransparentHugepage, "[always] madvise never"),
			(Switch::SmtControl, "on"),
		] {
			let path = root.path().join(switch.path());
			fs::create_dir_all(path.parent().expect("Switch path has a parent")).expect("Unable to create dir");
			fs::write(&path, format!("{value}\n")).expect("Unable to write switch");
		}

		root
	}

	fn contents(root: &Path) -> Vec<String> {
		Switch::ALL
			.into_iter()
			.map(|switch| fs::read_to_string(root.join(switch.path())).expect("Unable to read switch"))
			.collect()
	}

	#[test]
	fn apply_disables_every_switch() {
		let root = self::fake_root();
		let mut controller = PolicyController::new(root.path(), DirectWriter);

		let report = controller.apply().expect("Escalation should be available");
		report.ensure_applied().expect("Every switch should be applied");
		assert_eq!(report.outcomes().len(), 5);
		assert_eq!(self::contents(root.path()), ["0\n", "0\n", "0\n", "never\n", "off\n"]);
	}

	#[test]
	fn apply_is_idempotent() {
		let root = self::fake_root();
		let mut controller = PolicyController::new(root.path(), DirectWriter);

		controller.apply().expect("First apply").ensure_applied().expect("First apply should succeed");
		let after_first = self::contents(root.path());

		let report = controller.apply().expect("Second apply");
		assert!(report.failed().is_empty(), "{report:?}");
		assert_eq!(self::contents(root.path()), after_first);
	}

	#[test]
	fn missing_switch_is_reported_without_stopping_others() {
		let root = self::fake_root();
		fs::remove_file(root.path().join(Switch::SmtControl.path())).expect("Unable to remove switch");
		fs::remove_file(root.path().join(Switch::KsmRun.path())).expect("Unable to remove switch");
		let mut controller = PolicyController::new(root.path(), DirectWriter);

		let report = controller.apply().expect("Escalation should be available");
		assert_eq!(report.failed(), [Switch::KsmRun, Switch::SmtControl]);

		let err = report.ensure_applied().expect_err("Report should fail");
		assert_eq!(err.to_string(), "Unable to apply ksm.run, smt.control");

		// Others were still applied, and missing ones weren't created
		let numa_balancing = fs::read_to_string(root.path().join(Switch::NumaBalancing.path())).expect("Unable to read");
		assert_eq!(numa_balancing, "0\n");
		assert!(!root.path().join(Switch::SmtControl.path()).exists());
	}

	#[test]
	fn unavailable_escalation_writes_nothing() {
		struct NoEscalation(usize);
		impl PolicyWriter for NoEscalation {
			fn ensure_escalation(&mut self) -> Result<(), PolicyWriteError> {
				Err(PolicyWriteError::Io {
					path:   PathBuf::from("sudo"),
					source: io::Error::new(io::ErrorKind::PermissionDenied, "no sudo"),
				})
			}

			fn write(&mut self, _path: &Path, _value: &str) -> Result<(), PolicyWriteError> {
				self.0 += 1;
				Ok(())
			}
		}

		let mut controller = PolicyController::new("/", NoEscalation(0));
		let err = controller.apply().expect_err("Escalation should be unavailable");
		assert!(matches!(err, PolicyError::EscalationUnavailable(_)), "{err:?}");
		assert_eq!(controller.writer.0, 0);
	}

	#[test]
	fn query_reads_active_values() {
		let root = self::fake_root();
		fs::remove_file(root.path().join(Switch::SmtControl.path())).expect("Unable to remove switch");
		let controller = PolicyController::new(root.path(), DirectWriter);

		let statuses = controller.query();
		let values = statuses
			.iter()
			.map(|status| (status.switch, status.value.as_deref().ok()))
			.collect::<Vec<_>>();
		assert_eq!(values, [
			(Switch::NumaBalancing, Some("1")),
			(Switch::KsmRun, Some("1")),
			(Switch::KsmMergeAcrossNodes, Some("1")),
			(Switch::TransparentHugepage, Some("always")),
			(Switch::SmtControl, None),
		]);
	}

	#[test]
	fn active_value_parsing() {
		assert_eq!(active_value("always madvise [never]\n"), "never");
		assert_eq!(active_value("[always] madvise never"), "always");
		assert_eq!(active_value("0\n"), "0");
		assert_eq!(active_value("notsupported\n"), "notsupported");
	}

	#[test]
	fn sudo_writer_reports_missing_program() {
		let mut writer = SudoWriter::new("/nonexistent/sudo");
		let err = writer.ensure_escalation().expect_err("Missing sudo should fail");
		assert!(matches!(err, PolicyWriteError::Spawn { .. }), "{err:?}");
	}
}
