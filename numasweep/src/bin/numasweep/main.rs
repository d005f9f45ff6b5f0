//! NUMA benchmark sweep (`numasweep`)

// Modules
mod args;

// Imports
use {
	self::args::Args,
	anyhow::Context,
	clap::Parser,
	numasweep::{
		policy::{DirectWriter, Escalation, PolicyWriter, SudoWriter},
		Config,
		CumulativeLog,
		ExternalCommand,
		Invocation,
		PolicyController,
		ProcessExecutor,
		SweepDriver,
		SweepError,
	},
	numasweep_util::{logger, CommandDisplay},
	std::fs,
};

fn main() -> Result<(), anyhow::Error> {
	// Get arguments
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));

	// Initialize logging
	logger::init(args.log_file.as_deref(), args.log_file_append);

	// Read the config file
	let config = match &args.config_file {
		Some(config_file) => {
			let config_file = fs::File::open(config_file).context("Unable to open config file")?;
			serde_json::from_reader::<_, Config>(config_file).context("Unable to parse config file")?
		},
		None => {
			tracing::debug!("No config file given, using defaults");
			Config::default()
		},
	};
	tracing::trace!(?config, "Loaded config");

	match args.sub_cmd {
		args::SubCmd::Sweep(sweep) => self::sweep(config, sweep),
		args::SubCmd::Matrix => self::matrix(config),
		args::SubCmd::Policy(args::Policy::Apply) => self::policy_apply(&config),
		args::SubCmd::Policy(args::Policy::Status) => self::policy_status(&config),
	}
}

/// Runs the whole sweep
fn sweep(config: Config, sweep: args::Sweep) -> Result<(), anyhow::Error> {
	let matrix = config.matrix().context("Invalid matrix")?;
	let log_path = sweep.log.unwrap_or(config.log_path);

	let build = match sweep.skip_build {
		true => None,
		false => config.build.map(|build| ExternalCommand::new("build", build)),
	};
	let plot = match sweep.skip_plot {
		true => None,
		false => config.plot.map(|plot| ExternalCommand::new("plot", plot)),
	};

	let executor = ProcessExecutor::new(Invocation::new(config.numactl, config.bench));
	let log = CumulativeLog::new(&log_path);
	let mut driver = match build {
		Some(build) => SweepDriver::new(matrix, log, executor, build),
		None => SweepDriver::without_build(matrix, log, executor),
	}
	.with_plot(plot);

	match driver.run() {
		Ok(runs) => {
			tracing::info!(runs, ?log_path, "Sweep finished");
			Ok(())
		},
		Err(err) => {
			if matches!(err, SweepError::Run { .. } | SweepError::Plot { .. }) {
				tracing::warn!(?log_path, "Keeping log for inspection");
			}
			Err(err).context("Sweep failed")
		},
	}
}

/// Lists every run
fn matrix(config: Config) -> Result<(), anyhow::Error> {
	let matrix = config.matrix().context("Invalid matrix")?;
	let invocation = Invocation::new(config.numactl, config.bench);

	for (idx, spec) in matrix.iter().enumerate() {
		println!(
			"{:>3} {:<24} {:<14} {}",
			idx + 1,
			spec.to_string(),
			spec.affinity().to_string(),
			invocation.command(&spec).to_shell_line()
		);
	}

	Ok(())
}

/// Applies the host policy
fn policy_apply(config: &Config) -> Result<(), anyhow::Error> {
	let writer: Box<dyn PolicyWriter> = match config.policy.escalation {
		Escalation::Sudo => Box::new(SudoWriter::default()),
		Escalation::None => Box::new(DirectWriter),
	};
	let mut controller = PolicyController::new(&config.policy.sysfs_root, writer);

	let report = controller.apply().context("Unable to apply host policy")?;
	for (switch, res) in report.outcomes() {
		match res {
			Ok(()) => println!("{switch:<28} {}", switch.disabled_value()),
			Err(err) => println!("{switch:<28} FAILED: {err}"),
		}
	}

	report.ensure_applied().context("Host policy partially applied")
}

/// Shows the host policy
fn policy_status(config: &Config) -> Result<(), anyhow::Error> {
	let controller = PolicyController::new(&config.policy.sysfs_root, DirectWriter);
	for status in controller.query() {
		match status.value {
			Ok(value) => println!("{:<28} {value}", status.switch),
			Err(err) => println!("{:<28} unavailable: {err}", status.switch),
		}
	}

	Ok(())
}
