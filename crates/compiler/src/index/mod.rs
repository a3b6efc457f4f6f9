//! The compiled, queryable service index.
//!
//! # Purpose
//!
//! [`CompiledIndex`] answers "service name → weight" queries. It is produced once by
//! [`crate::Compiler::compile`] and is read-only afterwards, apart from its additive caches.
//!
//! # Lookup Order
//!
//! 1. **Direct:** exact keys, one hash probe.
//! 2. **Component:** the name is split (memoized) into a shape key and member; one probe for the
//!    bucket, one binary search inside the interned bucket.
//! 3. **Generic:** segment-wise match against irregular patterns in source order; the first match
//!    wins and the outcome, hit or miss, is memoized per name.
//!
//! # Invariants
//!
//! - A concrete key lives in at most one of the direct and component tables.
//!   - Enforced in: [`crate::compiler::Compiler::compile`].
//!   - Tested by: `compiler::tests::later_literal_overrides_wildcard`,
//!     `compiler::tests::later_wildcard_overrides_literal`.
//! - Caches never change an answer, only its cost.
//!   - Tested by: `index::tests::repeat_queries_hit_the_match_cache`.

mod cache;
mod glob;
mod info;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use svcmap_intern::{Canonical, Value};

pub(crate) use cache::{MatchCache, Split, SplitCache};
pub use glob::Glob;
pub use info::{CompilationStats, FoundIn, ServiceInfo, ServiceMetadata};

use crate::diagnostic::Diagnostic;
use crate::hierarchy::Hierarchy;
use crate::pattern::{Pattern, WILDCARD};

/// An irregular pattern kept unexpanded.
#[derive(Debug, Clone)]
pub(crate) struct GenericEntry {
	pub pattern: Pattern,
	pub value: f64,
}

/// Where a lookup was answered.
enum Hit {
	Direct(f64),
	/// The member is `split.member()`; the split is shared with the cache.
	Component { shape: Arc<str>, split: Arc<Split>, value: f64 },
	Generic { index: u32 },
}

/// Queryable result of a compilation.
#[derive(Debug)]
pub struct CompiledIndex {
	pub(crate) hierarchy: Arc<Hierarchy>,
	/// Exact key → weight; keys are shared with `direct_canon`.
	pub(crate) direct: FxHashMap<Arc<str>, f64>,
	/// Interned mapping backing `direct`.
	pub(crate) direct_canon: Canonical,
	/// Shape key → interned bucket of member → weight.
	pub(crate) components: FxHashMap<Arc<str>, Canonical>,
	pub(crate) generic: Box<[GenericEntry]>,
	pub(crate) splits: SplitCache,
	pub(crate) matches: MatchCache,
	pub(crate) diagnostics: Vec<Diagnostic>,
	pub(crate) stats: CompilationStats,
}

impl CompiledIndex {
	/// Returns the weight for `name`, or `None` if no pattern matched.
	pub fn service_time(&self, name: &str) -> Option<f64> {
		Some(match self.lookup(name)? {
			Hit::Direct(value) | Hit::Component { value, .. } => value,
			Hit::Generic { index } => self.generic[index as usize].value,
		})
	}

	/// Returns the weight for `name`, or `default` if no pattern matched.
	#[inline]
	pub fn get_service_time(&self, name: &str, default: f64) -> f64 {
		self.service_time(name).unwrap_or(default)
	}

	/// Resolves `name` and reports which table answered. Unmatched names report a time of 0.
	pub fn get_service_info(&self, name: &str) -> ServiceInfo {
		let (service_time, found_in, metadata) = match self.lookup(name) {
			None => (0.0, FoundIn::Default, ServiceMetadata::default()),
			Some(Hit::Direct(value)) => (value, FoundIn::Direct, ServiceMetadata::default()),
			Some(Hit::Component { shape, split, value }) => {
				let member = split.member();
				(
					value,
					FoundIn::Component,
					ServiceMetadata {
						shape: Some(shape.to_string()),
						region: member
							.and_then(|m| self.hierarchy.region_of(m))
							.map(str::to_owned),
						member: member.map(str::to_owned),
						pattern: None,
					},
				)
			}
			Some(Hit::Generic { index }) => {
				let entry = &self.generic[index as usize];
				(
					entry.value,
					FoundIn::Generic,
					ServiceMetadata {
						pattern: Some(entry.pattern.to_string()),
						..Default::default()
					},
				)
			}
		};
		ServiceInfo {
			service_name: name.to_owned(),
			service_time,
			found_in,
			metadata,
		}
	}

	fn lookup(&self, name: &str) -> Option<Hit> {
		if let Some(&value) = self.direct.get(name) {
			return Some(Hit::Direct(value));
		}

		let split = self.splits.get_or_split(name);
		if let Some(hit) = self.lookup_component(&split) {
			return Some(hit);
		}

		if self.generic.is_empty() {
			return None;
		}
		let resolved = match self.matches.get(name) {
			Some(cached) => cached,
			None => {
				let found = self
					.generic
					.iter()
					.position(|g| g.pattern.matches(&split.segments))
					.map(|i| i as u32);
				tracing::trace!(name, ?found, "generic fallback resolved");
				self.matches.insert(name, found)
			}
		};
		resolved.map(|index| Hit::Generic { index })
	}

	fn lookup_component(&self, split: &Arc<Split>) -> Option<Hit> {
		let (shape, bucket) = self.components.get_key_value(split.shape.as_deref()?)?;
		let value = bucket.get(split.member()?)?.as_f64()?;
		Some(Hit::Component {
			shape: shape.clone(),
			split: split.clone(),
			value,
		})
	}

	/// Every known concrete key matching `glob`, sorted.
	///
	/// Scans direct keys, component keys, and names previously resolved through the generic
	/// fallback. Generic patterns themselves are not enumerated.
	pub fn get_services_by_pattern(&self, glob: &str) -> BTreeMap<String, f64> {
		let glob = match Glob::new(glob) {
			Ok(glob) => glob,
			Err(error) => {
				tracing::warn!(glob, %error, "unusable glob");
				return BTreeMap::new();
			}
		};
		self.concrete_entries()
			.filter(|(name, _)| glob.is_match(name))
			.collect()
	}

	/// Every known concrete key, sorted and deduplicated.
	pub fn list_all_services(&self) -> Vec<String> {
		self.concrete_entries()
			.map(|(name, _)| name)
			.collect::<BTreeSet<_>>()
			.into_iter()
			.collect()
	}

	/// Component entries whose member is `region` or one of its prefectures.
	pub fn get_services_by_region(&self, region: &str) -> BTreeMap<String, f64> {
		let prefectures = self.hierarchy.prefectures_of(region);
		self.component_entries()
			.filter(|(_, member, _)| *member == region || prefectures.iter().any(|p| p == member))
			.map(|(shape, member, value)| (instantiate_shape(shape, member), value))
			.collect()
	}

	/// Component entries whose member is `prefecture`.
	pub fn get_services_by_prefecture(&self, prefecture: &str) -> BTreeMap<String, f64> {
		self.component_entries()
			.filter(|(_, member, _)| *member == prefecture)
			.map(|(shape, member, value)| (instantiate_shape(shape, member), value))
			.collect()
	}

	pub fn get_compilation_stats(&self) -> &CompilationStats {
		&self.stats
	}

	/// Findings recorded during compilation, in input order.
	pub fn diagnostics(&self) -> &[Diagnostic] {
		&self.diagnostics
	}

	pub fn fingerprint(&self) -> &str {
		&self.stats.fingerprint
	}

	pub fn hierarchy(&self) -> &Hierarchy {
		&self.hierarchy
	}

	/// Sorted `(key, weight)` pairs of the direct table.
	pub fn direct_entries(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
		self.direct_canon
			.map_entries()
			.unwrap_or(&[])
			.iter()
			.filter_map(|(k, v)| Some((k.as_ref(), v.as_f64()?)))
	}

	/// `(shape, member, weight)` triples of the component table, sorted by shape then member.
	pub fn component_entries(&self) -> impl Iterator<Item = (&str, &str, f64)> + '_ {
		let mut shapes: Vec<(&Arc<str>, &Canonical)> = self.components.iter().collect();
		shapes.sort_unstable_by(|a, b| a.0.cmp(b.0));
		shapes.into_iter().flat_map(|(shape, bucket)| {
			bucket
				.map_entries()
				.unwrap_or(&[])
				.iter()
				.filter_map(move |(member, v)| Some((shape.as_ref(), member.as_ref(), v.as_f64()?)))
		})
	}

	/// The interned bucket for a shape key, if any.
	pub fn component_bucket(&self, shape: &str) -> Option<&Canonical> {
		self.components.get(shape)
	}

	/// Generic patterns in source order.
	pub fn generic_patterns(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
		self.generic.iter().map(|g| (g.pattern.as_str(), g.value))
	}

	/// Plain copy of the tables: `{"direct": {...}, "components": {shape: {member: weight}}}`.
	pub fn thaw(&self) -> Value {
		let components: IndexMap<String, Value> = {
			let mut shapes: Vec<_> = self.components.iter().collect();
			shapes.sort_unstable_by(|a, b| a.0.cmp(b.0));
			shapes
				.into_iter()
				.map(|(shape, bucket)| (shape.to_string(), bucket.thaw()))
				.collect()
		};
		Value::Map(IndexMap::from([
			("direct".to_owned(), self.direct_canon.thaw()),
			("components".to_owned(), Value::Map(components)),
		]))
	}

	fn concrete_entries(&self) -> impl Iterator<Item = (String, f64)> + '_ {
		let direct = self.direct_entries().map(|(k, v)| (k.to_owned(), v));
		let component = self
			.component_entries()
			.map(|(shape, member, v)| (instantiate_shape(shape, member), v));
		let generic = self
			.matches
			.hits()
			.into_iter()
			.map(|(name, index)| (name.into_string(), self.generic[index as usize].value));
		direct.chain(component).chain(generic)
	}

	/// Cache sizes, for diagnostics and tests.
	pub fn cache_sizes(&self) -> (usize, usize) {
		(self.splits.len(), self.matches.len())
	}
}

/// Replaces the wildcard in a shape key with `member`.
fn instantiate_shape(shape: &str, member: &str) -> String {
	shape.replacen(WILDCARD, member, 1)
}

#[cfg(test)]
mod tests;
