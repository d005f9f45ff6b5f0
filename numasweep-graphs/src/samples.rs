//! Throughput samples read from a sweep log

// Imports
use {
	numasweep::{Distribution, Locality},
	std::{fmt, str::FromStr},
};

/// A single throughput measurement
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct Sample {
	pub locality:     Locality,
	pub distribution: Distribution,
	pub read_ratio:   u32,
	pub throughput:   f64,
}

impl Sample {
	/// Parses a log line.
	///
	/// Expects `<locality> <distribution> <read_ratio> <throughput>`, separated
	/// by whitespace or commas, optionally preceded by a tag such as `OK`.
	/// Returns `None` for any other line.
	pub fn parse_line(line: &str) -> Option<Self> {
		let fields = line
			.split(|ch: char| ch.is_whitespace() || ch == ',')
			.filter(|field| !field.is_empty())
			.collect::<Vec<_>>();

		match *fields {
			[locality, distribution, read_ratio, throughput] |
			[_, locality, distribution, read_ratio, throughput] => Some(Self {
				locality:     locality.parse().ok()?,
				distribution: distribution.parse().ok()?,
				read_ratio:   read_ratio.parse().ok()?,
				throughput:   self::parse_throughput(throughput)?,
			}),
			_ => None,
		}
	}
}

fn parse_throughput(s: &str) -> Option<f64> {
	let throughput = f64::from_str(s).ok()?;
	throughput.is_finite().then_some(throughput)
}

/// Series key
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct SeriesKey {
	pub locality:     Locality,
	pub distribution: Distribution,
}

impl fmt::Display for SeriesKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.locality, self.distribution)
	}
}

/// Mean throughput for a read ratio
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct Point {
	pub read_ratio: u32,
	pub mean:       f64,
	pub error:      f64,
	pub samples:    usize,
}

/// All points of a (locality, distribution) pair
#[derive(PartialEq, Clone, Debug)]
pub struct Series {
	pub key:    SeriesKey,
	pub points: Vec<Point>,
}

/// Groups samples into series.
///
/// Series and points within them keep the order they first appear in.
pub fn group(samples: impl IntoIterator<Item = Sample>) -> Vec<Series> {
	let mut groups = Vec::<(SeriesKey, Vec<(u32, Vec<f64>)>)>::new();
	for sample in samples {
		let key = SeriesKey {
			locality:     sample.locality,
			distribution: sample.distribution,
		};

		let idx = match groups.iter().position(|(group_key, _)| *group_key == key) {
			Some(idx) => idx,
			None => {
				groups.push((key, vec![]));
				groups.len() - 1
			},
		};
		let ratios = &mut groups[idx].1;

		match ratios.iter_mut().find(|(read_ratio, _)| *read_ratio == sample.read_ratio) {
			Some((_, throughputs)) => throughputs.push(sample.throughput),
			None => ratios.push((sample.read_ratio, vec![sample.throughput])),
		}
	}

	groups
		.into_iter()
		.map(|(key, ratios)| Series {
			key,
			points: ratios
				.into_iter()
				.map(|(read_ratio, throughputs)| {
					let variance = throughputs.iter().copied().collect::<average::Variance>();
					Point {
						read_ratio,
						mean: variance.mean(),
						// Note: A single sample has no spread
						error: match throughputs.len() {
							0 | 1 => 0.0,
							_ => variance.error(),
						},
						samples: throughputs.len(),
					}
				})
				.collect(),
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_plain_and_tagged_lines() {
		let expected = Sample {
			locality:     Locality::Remote,
			distribution: Distribution::Skewed,
			read_ratio:   4,
			throughput:   1250.5,
		};

		assert_eq!(Sample::parse_line("remote skewed 4 1250.5"), Some(expected));
		assert_eq!(Sample::parse_line("OK remote skewed 4 1250.5"), Some(expected));
		assert_eq!(Sample::parse_line("remote,skewed,4,1250.5"), Some(expected));
		assert_eq!(Sample::parse_line("  OK, remote\tskewed ,4, 1250.5 "), Some(expected));
	}

	#[test]
	fn ignores_other_lines() {
		for line in [
			"",
			"Running correctness checks",
			"OK local uniform 1",
			"local uniform one 10",
			"local uniform 1 fast",
			"local uniform 1 NaN",
			"nearby uniform 1 10",
			"local zipf 1 10",
			"OK local uniform 1 10 extra",
		] {
			assert_eq!(Sample::parse_line(line), None, "{line:?}");
		}
	}

	#[test]
	fn groups_by_first_appearance() {
		let lines = [
			"OK local uniform 1 10",
			"OK local uniform 4 20",
			"OK remote skewed 1 5",
			"OK local uniform 1 30",
			"OK local skewed 8 7",
			"garbage",
		];
		let series = self::group(lines.into_iter().filter_map(Sample::parse_line));

		let keys = series.iter().map(|series| series.key.to_string()).collect::<Vec<_>>();
		assert_eq!(keys, ["local uniform", "remote skewed", "local skewed"]);

		let local_uniform = &series[0].points;
		assert_eq!(local_uniform.len(), 2);
		assert_eq!(local_uniform[0].read_ratio, 1);
		assert_eq!(local_uniform[0].samples, 2);
		assert!((local_uniform[0].mean - 20.0).abs() < 1e-9);
		// Sample standard deviation 10*sqrt(2), over sqrt(2) samples
		assert!((local_uniform[0].error - 10.0).abs() < 1e-9);

		assert_eq!(local_uniform[1].read_ratio, 4);
		assert_eq!(local_uniform[1].samples, 1);
		assert_eq!(local_uniform[1].error, 0.0);
	}

	#[test]
	fn no_samples_no_series() {
		assert!(self::group([]).is_empty());
	}
}
