//! Configuration
//!
//! Every field has a default, so `{}` is a complete configuration describing
//! the read-only sweep over both localities, both distributions and read
//! ratios `1, 4, 8`.

// Imports
use {
	crate::{
		matrix::{Distribution, ExperimentMatrix, Locality, MatrixError},
		policy::Escalation,
	},
	std::path::PathBuf,
};

/// Configuration
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	/// Cumulative log path.
	///
	/// Shared by the run executor and the plotting command.
	pub log_path: PathBuf,

	/// Matrix
	pub matrix: MatrixConfig,

	/// Benchmark
	pub bench: BenchConfig,

	/// Affinity launcher
	pub numactl: NumactlConfig,

	/// Build command, `None` to never build
	pub build: Option<CommandConfig>,

	/// Plot command, `None` to never plot.
	///
	/// The log path is appended as the last argument.
	pub plot: Option<CommandConfig>,

	/// Host policy
	pub policy: PolicyConfig,
}

impl Config {
	/// Creates the experiment matrix
	pub fn matrix(&self) -> Result<ExperimentMatrix, MatrixError> {
		ExperimentMatrix::new(
			self.matrix.localities.clone(),
			self.matrix.distributions.clone(),
			self.matrix.read_ratios.clone(),
			self.matrix.write_ratio,
		)
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			log_path: PathBuf::from("hashbench.log"),
			matrix:   MatrixConfig::default(),
			bench:    BenchConfig::default(),
			numactl:  NumactlConfig::default(),
			build:    Some(CommandConfig {
				program: PathBuf::from("cargo"),
				args:    ["build", "--release", "--bin", "hashbench"].map(str::to_owned).to_vec(),
				dir:     None,
			}),
			plot:     Some(CommandConfig {
				program: PathBuf::from("numasweep-graphs"),
				args:    ["--output", "hashbench.png"].map(str::to_owned).to_vec(),
				dir:     None,
			}),
			policy:   PolicyConfig::default(),
		}
	}
}

/// Matrix configuration
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatrixConfig {
	pub localities:    Vec<Locality>,
	pub distributions: Vec<Distribution>,
	pub read_ratios:   Vec<u32>,
	pub write_ratio:   u32,
}

impl Default for MatrixConfig {
	fn default() -> Self {
		Self {
			localities:    Locality::ALL.to_vec(),
			distributions: Distribution::ALL.to_vec(),
			read_ratios:   vec![1, 4, 8],
			write_ratio:   0,
		}
	}
}

/// Benchmark configuration
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
	/// Benchmark executable
	pub program: PathBuf,

	/// Arguments selecting the benchmark's correctness mode, passed first
	pub mode_args: Vec<String>,

	pub reads_flag:        String,
	pub writes_flag:       String,
	pub distribution_flag: String,
	pub locality_flag:     String,

	/// Flag forwarding the memory node, if the benchmark accepts one
	pub mem_node_flag: Option<String>,

	/// Environment variable limiting the benchmark to a single thread
	pub threads_env: String,
}

impl Default for BenchConfig {
	fn default() -> Self {
		Self {
			program:           PathBuf::from("target/release/hashbench"),
			mode_args:         ["--mode", "correctness"].map(str::to_owned).to_vec(),
			reads_flag:        "--reads".to_owned(),
			writes_flag:       "--writes".to_owned(),
			distribution_flag: "--distribution".to_owned(),
			locality_flag:     "--locality".to_owned(),
			mem_node_flag:     None,
			threads_env:       "RAYON_NUM_THREADS".to_owned(),
		}
	}
}

/// Affinity launcher configuration
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NumactlConfig {
	pub program: PathBuf,
}

impl Default for NumactlConfig {
	fn default() -> Self {
		Self {
			program: PathBuf::from("numactl"),
		}
	}
}

/// External command configuration
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandConfig {
	pub program: PathBuf,

	#[serde(default)]
	pub args: Vec<String>,

	/// Working directory
	#[serde(default)]
	pub dir: Option<PathBuf>,
}

/// Host policy configuration
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
	/// Root that `proc` and `sys` are resolved against
	pub sysfs_root: PathBuf,

	/// How to obtain the privilege to write switches
	pub escalation: Escalation,
}

impl Default for PolicyConfig {
	fn default() -> Self {
		Self {
			sysfs_root: PathBuf::from("/"),
			escalation: Escalation::Sudo,
		}
	}
}
