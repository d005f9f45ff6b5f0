//! Benchmark invocation

// Imports
use {
	crate::{
		config::{BenchConfig, NumactlConfig},
		matrix::RunSpec,
	},
	std::process::Command,
};

/// Builds the affinity-pinned command for each run
#[derive(Clone, Debug)]
pub struct Invocation {
	/// Affinity launcher
	numactl: NumactlConfig,

	/// Benchmark
	bench: BenchConfig,
}

impl Invocation {
	/// Creates a new invocation builder
	pub fn new(numactl: NumactlConfig, bench: BenchConfig) -> Self {
		Self { numactl, bench }
	}

	/// Returns the command for `spec`.
	///
	/// The benchmark runs under `numactl` with the binding derived from the
	/// run's locality, limited to a single thread through its environment.
	pub fn command(&self, spec: &RunSpec) -> Command {
		let binding = spec.affinity();

		let mut command = Command::new(&self.numactl.program);
		command
			.env(&self.bench.threads_env, "1")
			.args(binding.numactl_args())
			.arg(&self.bench.program)
			.args(&self.bench.mode_args)
			.arg(&self.bench.reads_flag)
			.arg(spec.read_ratio.to_string())
			.arg(&self.bench.writes_flag)
			.arg(spec.write_ratio.to_string())
			.arg(&self.bench.distribution_flag)
			.arg(spec.distribution.as_str())
			.arg(&self.bench.locality_flag)
			.arg(spec.locality.as_str());

		if let Some(mem_node_flag) = &self.bench.mem_node_flag {
			command.arg(mem_node_flag).arg(binding.mem_node().to_string());
		}

		command
	}
}

#[cfg(test)]
mod tests {
	use {
		super::*,
		crate::matrix::{Distribution, Locality},
		numasweep_util::CommandDisplay,
		std::ffi::OsStr,
	};

	fn spec(locality: Locality) -> RunSpec {
		RunSpec {
			locality,
			distribution: Distribution::Skewed,
			read_ratio: 8,
			write_ratio: 0,
		}
	}

	#[test]
	fn remote_run_command() {
		let invocation = Invocation::new(NumactlConfig::default(), BenchConfig::default());
		let command = invocation.command(&self::spec(Locality::Remote));

		assert_eq!(
			command.to_shell_line(),
			"RAYON_NUM_THREADS=1 numactl --cpunodebind=0 --membind=1 target/release/hashbench --mode correctness \
			 --reads 8 --writes 0 --distribution skewed --locality remote"
		);
	}

	#[test]
	fn local_run_binds_memory_locally() {
		let invocation = Invocation::new(NumactlConfig::default(), BenchConfig::default());
		let command = invocation.command(&self::spec(Locality::Local));

		let args = command.get_args().take(2).collect::<Vec<_>>();
		assert_eq!(args, [OsStr::new("--cpunodebind=0"), OsStr::new("--membind=0")]);
	}

	#[test]
	fn single_thread_is_set_through_the_environment() {
		let bench = BenchConfig {
			threads_env: "BENCH_THREADS".to_owned(),
			..BenchConfig::default()
		};
		let command = Invocation::new(NumactlConfig::default(), bench).command(&self::spec(Locality::Local));

		let envs = command.get_envs().collect::<Vec<_>>();
		assert_eq!(envs, [(OsStr::new("BENCH_THREADS"), Some(OsStr::new("1")))]);
		assert!(!command.get_args().any(|arg| arg == "BENCH_THREADS"));
	}

	#[test]
	fn mem_node_flag_is_forwarded() {
		let bench = BenchConfig {
			mem_node_flag: Some("--node".to_owned()),
			..BenchConfig::default()
		};
		let invocation = Invocation::new(NumactlConfig::default(), bench);

		let command = invocation.command(&self::spec(Locality::Remote));
		let args = command.get_args().collect::<Vec<_>>();
		assert_eq!(&args[args.len() - 2..], [OsStr::new("--node"), OsStr::new("1")]);

		let command = invocation.command(&self::spec(Locality::Local));
		let args = command.get_args().collect::<Vec<_>>();
		assert_eq!(&args[args.len() - 2..], [OsStr::new("--node"), OsStr::new("0")]);
	}
}
