//! NUMA affinity

// Imports
use {crate::matrix::Locality, std::fmt};

/// NUMA node identifier
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Debug)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.0, f)
	}
}

/// CPU and memory binding of a run.
///
/// Only obtainable from a [`Locality`]: execution is always pinned to
/// [`EXECUTION_NODE`](Self::EXECUTION_NODE), while memory is served from the
/// same node for local runs and from [`REMOTE_MEMORY_NODE`](Self::REMOTE_MEMORY_NODE)
/// for remote runs.
#[derive(PartialEq, Eq, Clone, Copy, Hash, Debug)]
pub struct AffinityBinding {
	cpu_node: NodeId,
	mem_node: NodeId,
}

impl AffinityBinding {
	/// Node every run executes on
	pub const EXECUTION_NODE: NodeId = NodeId(0);
	/// Node remote runs allocate from
	pub const REMOTE_MEMORY_NODE: NodeId = NodeId(1);

	/// Returns the binding for `locality`
	pub fn for_locality(locality: Locality) -> Self {
		let mem_node = match locality {
			Locality::Local => Self::EXECUTION_NODE,
			Locality::Remote => Self::REMOTE_MEMORY_NODE,
		};

		Self {
			cpu_node: Self::EXECUTION_NODE,
			mem_node,
		}
	}

	/// Returns the node to execute on
	pub fn cpu_node(&self) -> NodeId {
		self.cpu_node
	}

	/// Returns the node to allocate memory from
	pub fn mem_node(&self) -> NodeId {
		self.mem_node
	}

	/// Returns the `numactl` arguments enforcing this binding
	pub fn numactl_args(&self) -> [String; 2] {
		[
			format!("--cpunodebind={}", self.cpu_node),
			format!("--membind={}", self.mem_node),
		]
	}
}

impl fmt::Display for AffinityBinding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "cpu={} mem={}", self.cpu_node, self.mem_node)
	}
}
