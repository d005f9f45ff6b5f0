//! Creates graphs from `numasweep`'s log

// Modules
mod args;
mod samples;

// Imports
use {
	self::{
		args::Args,
		samples::Sample,
	},
	anyhow::Context,
	clap::Parser,
	gnuplot::{AxesCommon, Figure, PlotOption},
	numasweep_util::logger,
	palette::{FromColor, Hsv, Srgb},
	std::{
		fs,
		io::{self, BufRead},
	},
};

fn main() -> Result<(), anyhow::Error> {
	// Get arguments
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));

	// Initialize logging
	logger::init(args.log_file.as_deref(), args.log_file_append);

	// Read all samples
	let samples = {
		let input_file = fs::File::open(&args.input_file).context("Unable to open input file")?;
		self::read_samples(io::BufReader::new(input_file)).context("Unable to read input file")?
	};
	anyhow::ensure!(
		!samples.is_empty(),
		"No samples found in {:?}",
		args.input_file
	);
	tracing::debug!(samples = samples.len(), "Read samples");

	let series = samples::group(samples);
	for series in &series {
		for point in &series.points {
			tracing::info!(
				series = %series.key,
				read_ratio = point.read_ratio,
				mean = point.mean,
				error = point.error,
				samples = point.samples,
				"Throughput"
			);
		}
	}

	// Then build the figure
	let mut fg = Figure::new();
	let fg_axes2d = fg
		.axes2d()
		.set_title(&args.title, &[])
		.set_x_label("Read ratio", &[])
		.set_y_label("Throughput", &[]);

	let colors = self::series_colors(series.len());
	for (series, color) in series.iter().zip(&colors) {
		let caption = series.key.to_string();
		fg_axes2d.y_error_lines(
			series.points.iter().map(|point| point.read_ratio),
			series.points.iter().map(|point| point.mean),
			series.points.iter().map(|point| point.error),
			&[PlotOption::Caption(caption.as_str()), PlotOption::Color(color.as_str())],
		);
	}

	// Finally output it
	if let Some(output_file) = &args.output.file {
		fg.save_to_png(output_file, args.output.width, args.output.height)
			.map_err(|err| anyhow::anyhow!("Unable to save output file: {err:?}"))?;
		tracing::info!(?output_file, "Saved graph");
	}
	if args.output.interactive {
		fg.show().map_err(|err| anyhow::anyhow!("Unable to show figure: {err:?}"))?;
	}

	Ok(())
}

/// Reads every recognizable sample, skipping other lines
fn read_samples(reader: impl BufRead) -> Result<Vec<Sample>, io::Error> {
	let mut samples = vec![];
	for line in reader.lines() {
		let line = line?;
		match Sample::parse_line(&line) {
			Some(sample) => samples.push(sample),
			None => tracing::trace!(?line, "Skipping line"),
		}
	}

	Ok(samples)
}

/// Returns `len` colors with evenly spaced hues
fn series_colors(len: usize) -> Vec<String> {
	(0..len)
		.map(|idx| {
			let hue = 360.0 * idx as f32 / len as f32;
			let rgb = Srgb::<f32>::from_color(Hsv::new(hue, 0.8, 0.8)).into_format::<u8>();
			format!("#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
		})
		.collect()
}
