//! Additive query caches.
//!
//! Both caches only ever gain entries; the index they serve never changes, so nothing is
//! invalidated. Writers use insert-if-absent under a write lock, which makes a shared index safe
//! to query from several threads.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::pattern::{SEPARATOR, component_key};

/// A query name split into segments, with its component shape key precomputed.
#[derive(Debug)]
pub(crate) struct Split {
	pub segments: Box<[Box<str>]>,
	/// Shape key for two- and three-segment names; the member is always `segments[1]`.
	pub shape: Option<Box<str>>,
}

impl Split {
	fn new(name: &str) -> Self {
		Self {
			segments: name.split(SEPARATOR).map(Box::from).collect(),
			shape: component_key(name).map(|(shape, _)| shape.into_boxed_str()),
		}
	}

	pub fn member(&self) -> Option<&str> {
		self.shape.as_ref().map(|_| &*self.segments[1])
	}
}

/// Memoized [`Split`] per query name.
#[derive(Debug, Default)]
pub(crate) struct SplitCache {
	inner: RwLock<FxHashMap<Box<str>, Arc<Split>>>,
}

impl SplitCache {
	pub fn get_or_split(&self, name: &str) -> Arc<Split> {
		if let Some(split) = self.inner.read().get(name) {
			return split.clone();
		}
		let split = Arc::new(Split::new(name));
		self.inner
			.write()
			.entry(Box::from(name))
			.or_insert(split)
			.clone()
	}

	pub fn len(&self) -> usize {
		self.inner.read().len()
	}
}

/// Memoized generic-fallback resolution per query name.
///
/// Stores the index of the winning generic pattern, or `None` for a confirmed miss.
#[derive(Debug, Default)]
pub(crate) struct MatchCache {
	inner: RwLock<FxHashMap<Box<str>, Option<u32>>>,
}

impl MatchCache {
	pub fn get(&self, name: &str) -> Option<Option<u32>> {
		self.inner.read().get(name).copied()
	}

	/// Records a resolution unless another writer got there first; returns the stored one.
	pub fn insert(&self, name: &str, resolved: Option<u32>) -> Option<u32> {
		*self
			.inner
			.write()
			.entry(Box::from(name))
			.or_insert(resolved)
	}

	/// Names that resolved to a generic pattern, with that pattern's index.
	pub fn hits(&self) -> Vec<(Box<str>, u32)> {
		self.inner
			.read()
			.iter()
			.filter_map(|(name, hit)| hit.map(|i| (name.clone(), i)))
			.collect()
	}

	pub fn len(&self) -> usize {
		self.inner.read().len()
	}
}
