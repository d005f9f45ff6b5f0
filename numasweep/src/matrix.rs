//! Experiment matrix
//!
//! Enumerates every run of a sweep as the cartesian product
//! `locality × distribution × read ratio`, in that nesting order.
//! Downstream consumers of the log group records by locality first and
//! distribution second, so the order produced here is part of the contract.

// Imports
use {
	crate::affinity::AffinityBinding,
	itertools::Itertools,
	std::{fmt, hash::Hash, str::FromStr},
};

/// Memory locality of a run
#[derive(PartialEq, Eq, Clone, Copy, Hash, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locality {
	/// Memory is allocated on the executing node
	Local,

	/// Memory is allocated on a different node than the executing one
	Remote,
}

impl Locality {
	/// All localities, in sweep order
	pub const ALL: [Self; 2] = [Self::Local, Self::Remote];

	/// Returns the label forwarded to the benchmark
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Local => "local",
			Self::Remote => "remote",
		}
	}

	/// Returns the affinity binding for this locality
	pub fn affinity(self) -> AffinityBinding {
		AffinityBinding::for_locality(self)
	}
}

impl fmt::Display for Locality {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.pad(self.as_str())
	}
}

impl FromStr for Locality {
	type Err = ParseLabelError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|locality| locality.as_str() == s)
			.ok_or_else(|| ParseLabelError::new("locality", s))
	}
}

/// Key-access distribution of a run
#[derive(PartialEq, Eq, Clone, Copy, Hash, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
	Uniform,
	Skewed,
}

impl Distribution {
	/// All distributions, in sweep order
	pub const ALL: [Self; 2] = [Self::Uniform, Self::Skewed];

	/// Returns the label forwarded to the benchmark
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Uniform => "uniform",
			Self::Skewed => "skewed",
		}
	}
}

impl fmt::Display for Distribution {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.pad(self.as_str())
	}
}

impl FromStr for Distribution {
	type Err = ParseLabelError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|distribution| distribution.as_str() == s)
			.ok_or_else(|| ParseLabelError::new("distribution", s))
	}
}

/// Error for parsing a [`Locality`] or [`Distribution`] label
#[derive(PartialEq, Eq, Clone, Debug, thiserror::Error)]
#[error("Unknown {kind} label {label:?}")]
pub struct ParseLabelError {
	kind:  &'static str,
	label: String,
}

impl ParseLabelError {
	fn new(kind: &'static str, label: &str) -> Self {
		Self {
			kind,
			label: label.to_owned(),
		}
	}
}

/// A single benchmark run
#[derive(PartialEq, Eq, Clone, Copy, Hash, Debug)]
pub struct RunSpec {
	pub locality:     Locality,
	pub distribution: Distribution,
	pub read_ratio:   u32,
	pub write_ratio:  u32,
}

impl RunSpec {
	/// Returns if this run has any work to measure.
	///
	/// A run with neither reads nor writes is meaningless and is never executed.
	pub fn is_eligible(&self) -> bool {
		self.read_ratio > 0 || self.write_ratio > 0
	}

	/// Returns the affinity binding of this run
	pub fn affinity(&self) -> AffinityBinding {
		self.locality.affinity()
	}
}

impl fmt::Display for RunSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}/{}/r{}w{}",
			self.locality, self.distribution, self.read_ratio, self.write_ratio
		)
	}
}

/// Experiment matrix
#[derive(Clone, Debug)]
pub struct ExperimentMatrix {
	/// Localities (outermost dimension)
	localities: Vec<Locality>,

	/// Distributions
	distributions: Vec<Distribution>,

	/// Read ratios (innermost dimension)
	read_ratios: Vec<u32>,

	/// Write ratio, shared by every run
	write_ratio: u32,
}

impl ExperimentMatrix {
	/// Creates a new matrix.
	///
	/// # Errors
	/// Returns an error if any dimension repeats a value, since that would revisit a configuration.
	pub fn new(
		localities: Vec<Locality>,
		distributions: Vec<Distribution>,
		read_ratios: Vec<u32>,
		write_ratio: u32,
	) -> Result<Self, MatrixError> {
		self::ensure_unique("locality", &localities)?;
		self::ensure_unique("distribution", &distributions)?;
		self::ensure_unique("read ratio", &read_ratios)?;

		Ok(Self {
			localities,
			distributions,
			read_ratios,
			write_ratio,
		})
	}

	/// Returns all eligible runs, in sweep order.
	///
	/// Each call starts a fresh enumeration.
	pub fn iter(&self) -> impl Iterator<Item = RunSpec> + '_ {
		itertools::iproduct!(&self.localities, &self.distributions, &self.read_ratios)
			.map(|(&locality, &distribution, &read_ratio)| RunSpec {
				locality,
				distribution,
				read_ratio,
				write_ratio: self.write_ratio,
			})
			.filter(|spec| {
				let eligible = spec.is_eligible();
				if !eligible {
					tracing::debug!(%spec, "Skipping run with no reads or writes");
				}
				eligible
			})
	}

	/// Returns the number of eligible runs
	pub fn len(&self) -> usize {
		self.iter().count()
	}

	/// Returns if there are no eligible runs
	pub fn is_empty(&self) -> bool {
		self.iter().next().is_none()
	}
}

impl Default for ExperimentMatrix {
	/// The read-only sweep: both localities, both distributions, read ratios `1, 4, 8`.
	fn default() -> Self {
		Self {
			localities:    Locality::ALL.to_vec(),
			distributions: Distribution::ALL.to_vec(),
			read_ratios:   vec![1, 4, 8],
			write_ratio:   0,
		}
	}
}

impl<'a> IntoIterator for &'a ExperimentMatrix {
	type IntoIter = Box<dyn Iterator<Item = RunSpec> + 'a>;
	type Item = RunSpec;

	fn into_iter(self) -> Self::IntoIter {
		Box::new(self.iter())
	}
}

/// Matrix error
#[derive(PartialEq, Eq, Clone, Debug, thiserror::Error)]
pub enum MatrixError {
	#[error("Duplicate {dimension} in matrix: {value}")]
	Duplicate { dimension: &'static str, value: String },
}

fn ensure_unique<T: Eq + Hash + fmt::Debug>(dimension: &'static str, values: &[T]) -> Result<(), MatrixError> {
	match values.iter().duplicates().next() {
		Some(value) => Err(MatrixError::Duplicate {
			dimension,
			value: format!("{value:?}"),
		}),
		None => Ok(()),
	}
}
