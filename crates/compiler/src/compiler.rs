//! Service map compilation.
//!
//! Routes every pattern to one of the index tables, resolving conflicts between exact and
//! expanded entries by source order, then interns the finished tables through the shared pool.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use svcmap_intern::{Canonical, InternPool, Value, quantize};

use crate::diagnostic::Diagnostic;
use crate::expand::instantiate;
use crate::fingerprint::fingerprint;
use crate::hierarchy::Hierarchy;
use crate::index::{CompilationStats, CompiledIndex, GenericEntry, MatchCache, SplitCache};
use crate::pattern::{Pattern, PatternShape, component_key};
use crate::service_map::ServiceMap;

/// Knobs for one compilation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
	/// Quantization step applied to weights while interning.
	pub qfloat: Option<f64>,
	/// Source files, recorded in the stats only.
	pub input_files: Vec<PathBuf>,
}

/// Compiles service maps against a shared [`InternPool`].
///
/// Buckets with identical contents are shared across every index built by compilers that
/// share a pool.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
	pool: Arc<InternPool>,
	options: CompileOptions,
}

/// Tables under construction, before interning.
#[derive(Default)]
struct Tables {
	direct: IndexMap<String, f64>,
	components: IndexMap<String, IndexMap<String, f64>>,
	generic: Vec<GenericEntry>,
	diagnostics: Vec<Diagnostic>,
}

impl Tables {
	fn exact(&mut self, key: &str, value: f64) {
		if let Some((shape, member)) = component_key(key) {
			if let Some(bucket) = self.components.get_mut(&shape) {
				bucket.swap_remove(member);
			}
		}
		self.direct.insert(key.to_owned(), value);
	}

	fn component(&mut self, shape: &str, key: String, member: &str, value: f64) {
		if !resolves_to(&key, shape, member) {
			// Lookups would not split this key back into `shape` and `member`; keep it exact.
			self.exact(&key, value);
			return;
		}
		self.direct.swap_remove(&key);
		self.components
			.entry(shape.to_owned())
			.or_default()
			.insert(member.to_owned(), value);
	}
}

/// True if `component_key` splits `key` back into exactly `shape` and `member`.
///
/// Fails for members that are empty, `*`, or contain the separator.
fn resolves_to(key: &str, shape: &str, member: &str) -> bool {
	matches!(component_key(key), Some((s, m)) if s == shape && m == member)
}

impl Compiler {
	/// Creates a compiler with a private pool.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a compiler that interns into `pool`.
	pub fn with_pool(pool: Arc<InternPool>) -> Self {
		Self {
			pool,
			options: CompileOptions::default(),
		}
	}

	pub fn options(mut self, options: CompileOptions) -> Self {
		self.options = options;
		self
	}

	pub fn pool(&self) -> &Arc<InternPool> {
		&self.pool
	}

	/// Compiles a JSON service document, keeping the diagnostics of skipped weights.
	pub fn compile_document(&self, document: &serde_json::Value, hierarchy: &Hierarchy) -> CompiledIndex {
		let (services, diagnostics) = ServiceMap::from_json(document);
		self.compile_with_diagnostics(&services, hierarchy, diagnostics)
	}

	/// Compiles `services` into a queryable index. Never fails; malformed entries are skipped
	/// and reported through [`CompiledIndex::diagnostics`].
	pub fn compile(&self, services: &ServiceMap, hierarchy: &Hierarchy) -> CompiledIndex {
		self.compile_with_diagnostics(services, hierarchy, Vec::new())
	}

	/// Like [`Compiler::compile`], carrying findings already recorded while loading `services`.
	/// They are reported and counted as if compilation had found them.
	pub fn compile_with_diagnostics(
		&self,
		services: &ServiceMap,
		hierarchy: &Hierarchy,
		diagnostics: Vec<Diagnostic>,
	) -> CompiledIndex {
		let started = Instant::now();
		let mut tables = Tables {
			diagnostics,
			..Tables::default()
		};

		for (text, value) in services.iter() {
			let pattern = match Pattern::parse(text) {
				Ok(pattern) => pattern,
				Err(kind) => {
					tables.diagnostics.push(Diagnostic::new(text, kind));
					continue;
				}
			};
			match pattern.shape() {
				PatternShape::Exact => tables.exact(text, value),
				PatternShape::TwoPart { .. } | PatternShape::ThreePart { .. } => {
					match instantiate(&pattern, hierarchy) {
						Ok(instances) => {
							for instance in instances {
								tables.component(text, instance.key, instance.members[0], value);
							}
						}
						Err(kind) => tables.diagnostics.push(Diagnostic::new(text, kind)),
					}
				}
				PatternShape::Generic => tables.generic.push(GenericEntry {
					value: self.options.qfloat.map_or(value, |q| quantize(value, q)),
					pattern,
				}),
			}
		}

		for diagnostic in &tables.diagnostics {
			tracing::warn!(pattern = %diagnostic.pattern, kind = %diagnostic.kind, "skipped service entry");
		}

		let qfloat = self.options.qfloat;
		let direct_canon = self.pool.intern(
			&tables
				.direct
				.iter()
				.map(|(k, v)| (k.as_str(), *v))
				.collect::<Value>(),
			qfloat,
		);
		let direct: FxHashMap<Arc<str>, f64> = direct_canon
			.map_entries()
			.unwrap_or(&[])
			.iter()
			.filter_map(|(k, v)| Some((k.clone(), v.as_f64()?)))
			.collect();

		let components: FxHashMap<Arc<str>, Canonical> = tables
			.components
			.iter()
			.filter(|(_, bucket)| !bucket.is_empty())
			.map(|(shape, bucket)| {
				let bucket = bucket.iter().map(|(m, v)| (m.as_str(), *v)).collect::<Value>();
				(self.pool.intern_str(shape), self.pool.intern(&bucket, qfloat))
			})
			.collect();

		let generic = tables.generic.into_boxed_slice();
		let component_mappings: usize = components.values().map(Canonical::len).sum();
		let stats = CompilationStats {
			total_services: direct.len() + component_mappings,
			direct_mappings: direct.len(),
			component_mappings,
			generic_patterns: generic.len(),
			skipped_entries: tables.diagnostics.iter().filter(|d| d.kind.is_skip()).count(),
			compilation_time: started.elapsed().as_secs_f64(),
			memory_usage_mb: estimate_bytes(&direct, &components, &generic) as f64 / (1024.0 * 1024.0),
			input_files: self.options.input_files.clone(),
			fingerprint: fingerprint(services, hierarchy),
		};

		tracing::debug!(
			direct = stats.direct_mappings,
			component = stats.component_mappings,
			shapes = components.len(),
			generic = stats.generic_patterns,
			skipped = stats.skipped_entries,
			elapsed = stats.compilation_time,
			"compiled service map"
		);

		CompiledIndex {
			hierarchy: Arc::new(hierarchy.clone()),
			direct,
			direct_canon,
			components,
			generic,
			splits: SplitCache::default(),
			matches: MatchCache::default(),
			diagnostics: tables.diagnostics,
			stats,
		}
	}
}

/// Compiles with a fresh pool and default options.
pub fn compile(services: &ServiceMap, hierarchy: &Hierarchy) -> CompiledIndex {
	Compiler::new().compile(services, hierarchy)
}

/// Rough size of the index tables: slot sizes plus string bytes. Interned buckets shared with
/// other indexes are counted in full.
fn estimate_bytes(
	direct: &FxHashMap<Arc<str>, f64>,
	components: &FxHashMap<Arc<str>, Canonical>,
	generic: &[GenericEntry],
) -> usize {
	const ENTRY: usize = size_of::<(Arc<str>, f64)>();
	const NODE: usize = size_of::<(Arc<str>, Canonical)>() + 2 * size_of::<usize>() + size_of::<f64>();

	let direct_bytes: usize = direct.keys().map(|k| 2 * ENTRY + k.len()).sum();
	let component_bytes: usize = components
		.iter()
		.map(|(shape, bucket)| {
			let members: usize = bucket
				.map_entries()
				.unwrap_or(&[])
				.iter()
				.map(|(m, _)| NODE + m.len())
				.sum();
			ENTRY + shape.len() + members
		})
		.sum();
	let generic_bytes: usize = generic
		.iter()
		.map(|g| size_of::<GenericEntry>() + g.pattern.as_str().len())
		.sum();
	direct_bytes + component_bytes + generic_bytes
}
