//! Stub collaborators shared by the integration tests

// Lints
#![allow(dead_code, reason = "Not every test uses every stub")]

// Imports
use {
	numasweep::config::{BenchConfig, CommandConfig, Config, NumactlConfig},
	std::{
		fs,
		os::unix::fs::PermissionsExt,
		path::{Path, PathBuf},
		sync::{Mutex, MutexGuard},
	},
};

/// Serializes tests that write and execute scripts.
///
/// Executing a script while another thread still has it open for writing fails
/// with `ETXTBSY`, so scripts are only written and run while holding this.
static SCRIPTS: Mutex<()> = Mutex::new(());

/// Locks [`SCRIPTS`]
pub fn lock_scripts() -> MutexGuard<'static, ()> {
	SCRIPTS.lock().unwrap_or_else(|err| err.into_inner())
}

/// Writes an executable shell script
pub fn write_script(path: &Path, body: &str) -> PathBuf {
	fs::write(path, format!("#!/bin/sh\n{body}")).expect("Unable to write script");
	fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("Unable to make script executable");
	path.to_path_buf()
}

/// Stub environment
pub struct Stubs {
	pub dir: tempfile::TempDir,
}

impl Stubs {
	/// Creates stubs with a benchmark failing on the run `fail_on`, if any.
	///
	/// `fail_on` is matched against `<locality> <distribution> <read ratio>`.
	pub fn new(fail_on: Option<&str>) -> Self {
		let dir = tempfile::tempdir().expect("Unable to create temporary directory");

		// Records its binding and the thread limit, then runs the benchmark
		self::write_script(
			&dir.path().join("numactl"),
			&format!(
				"printf '%s %s %s\\n' \"$1\" \"$2\" \"$RAYON_NUM_THREADS\" >> '{}'\nshift 2\nexec \"$@\"\n",
				dir.path().join("numactl.record").display()
			),
		);

		let fail = match fail_on {
			Some(run) => format!("if [ \"$loc $dist $reads\" = '{run}' ]; then\n\techo \"partial $loc $dist $reads\"\n\texit 3\nfi\n"),
			None => String::new(),
		};
		self::write_script(
			&dir.path().join("bench"),
			&format!(
				r#"while [ $# -gt 0 ]; do
	case "$1" in
		--mode) mode=$2; shift 2 ;;
		--reads) reads=$2; shift 2 ;;
		--writes) writes=$2; shift 2 ;;
		--distribution) dist=$2; shift 2 ;;
		--locality) loc=$2; shift 2 ;;
		*) echo "unexpected argument $1" >&2; exit 2 ;;
	esac
done
[ "$mode" = correctness ] || exit 4
[ "$writes" = 0 ] || exit 5
{fail}echo "OK $loc $dist $reads"
"#
			),
		);

		Self { dir }
	}

	/// Returns a path inside the stub directory
	pub fn path(&self, name: &str) -> PathBuf {
		self.dir.path().join(name)
	}

	/// Returns the lines recorded by the stub `numactl`
	pub fn numactl_record(&self) -> Vec<String> {
		match fs::read_to_string(self.path("numactl.record")) {
			Ok(record) => record.lines().map(str::to_owned).collect(),
			Err(_) => vec![],
		}
	}

	/// Returns a command running `script` through `sh -c`
	pub fn sh(&self, script: &str) -> CommandConfig {
		CommandConfig {
			program: PathBuf::from("sh"),
			args:    vec!["-c".to_owned(), script.to_owned(), "sh".to_owned()],
			dir:     Some(self.dir.path().to_path_buf()),
		}
	}

	/// Returns a config running the stubs
	pub fn config(&self) -> Config {
		Config {
			log_path: self.path("sweep.log"),
			bench: BenchConfig {
				program: self.path("bench"),
				..BenchConfig::default()
			},
			numactl: NumactlConfig {
				program: self.path("numactl"),
			},
			build: Some(self.sh("echo built >> build.record")),
			plot: Some(self.sh("cp \"$1\" plotted.log")),
			..Config::default()
		}
	}
}

/// Expected log of the default matrix
pub fn expected_log() -> Vec<String> {
	let mut expected = vec![];
	for locality in ["local", "remote"] {
		for distribution in ["uniform", "skewed"] {
			for read_ratio in [1, 4, 8] {
				expected.push(format!("OK {locality} {distribution} {read_ratio}"));
			}
		}
	}

	expected
}
