//! Pool counters.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of the pool counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InternStats {
	/// Nodes visited while canonicalizing, passthrough scalars included.
	pub nodes: u64,
	/// Distinct instances stored in the pool.
	pub unique: u64,
	pub hits: u64,
	pub misses: u64,
}

impl InternStats {
	/// Fraction of pool lookups that found an existing instance, in `[0, 1]`.
	pub fn hit_rate(&self) -> f64 {
		let total = self.hits + self.misses;
		if total == 0 {
			0.0
		} else {
			self.hits as f64 / total as f64
		}
	}
}

impl fmt::Display for InternStats {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"nodes={} unique={} hits={} misses={} hit_rate={:.1}%",
			self.nodes,
			self.unique,
			self.hits,
			self.misses,
			self.hit_rate() * 100.0
		)
	}
}

/// Running counters, updated with relaxed atomics.
#[derive(Debug, Default)]
pub(crate) struct Counters {
	nodes: AtomicU64,
	hits: AtomicU64,
	misses: AtomicU64,
}

impl Counters {
	#[inline]
	pub(crate) fn node(&self) {
		self.nodes.fetch_add(1, Ordering::Relaxed);
	}

	#[inline]
	pub(crate) fn hit(&self) {
		self.hits.fetch_add(1, Ordering::Relaxed);
	}

	#[inline]
	pub(crate) fn miss(&self) {
		self.misses.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn snapshot(&self, unique: u64) -> InternStats {
		InternStats {
			nodes: self.nodes.load(Ordering::Relaxed),
			unique,
			hits: self.hits.load(Ordering::Relaxed),
			misses: self.misses.load(Ordering::Relaxed),
		}
	}

	pub(crate) fn reset(&self) {
		self.nodes.store(0, Ordering::Relaxed);
		self.hits.store(0, Ordering::Relaxed);
		self.misses.store(0, Ordering::Relaxed);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn display_matches_cli_format() {
		let stats = InternStats {
			nodes: 10,
			unique: 4,
			hits: 3,
			misses: 1,
		};
		assert_eq!(
			stats.to_string(),
			"nodes=10 unique=4 hits=3 misses=1 hit_rate=75.0%"
		);
	}

	#[test]
	fn hit_rate_of_empty_pool_is_zero() {
		assert_eq!(InternStats::default().hit_rate(), 0.0);
	}
}
