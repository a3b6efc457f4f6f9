//! Renders a [`CompiledIndex`] as a self-contained Rust source module.
//!
//! The output has no dependencies: sorted static tables, provenance constants, and the query
//! functions from `lookup.rs.in`. Lookups binary-search the tables, so answers match the
//! in-process index for every direct, component, and generic entry.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::hierarchy::Hierarchy;
use crate::index::CompiledIndex;

const QUERIES: &str = include_str!("lookup.rs.in");

/// Where and when a generated module came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
	pub generated_at: DateTime<Utc>,
	pub compiler_version: String,
	/// Entries in the merged service map.
	pub pattern_count: usize,
}

impl Provenance {
	/// Provenance stamped with the current time and this crate's version.
	pub fn now(pattern_count: usize) -> Self {
		Self {
			generated_at: Utc::now(),
			compiler_version: env!("CARGO_PKG_VERSION").to_string(),
			pattern_count,
		}
	}
}

/// Renders `index` as Rust source.
pub fn render(index: &CompiledIndex, provenance: &Provenance) -> String {
	let stats = index.get_compilation_stats();
	let mut out = String::new();

	out.push_str(&format!(
		"// @generated by svcmap-compile {}. Do not edit.\n\n",
		provenance.compiler_version
	));

	out.push_str(&format!(
		"pub const GENERATED_AT: &str = {:?};\n",
		provenance
			.generated_at
			.to_rfc3339_opts(SecondsFormat::Secs, true)
	));
	out.push_str(&format!(
		"pub const COMPILER_VERSION: &str = {:?};\n",
		provenance.compiler_version
	));
	let input_files: Vec<String> = stats
		.input_files
		.iter()
		.map(|p| p.display().to_string())
		.collect();
	out.push_str(&format!("pub const INPUT_FILES: &[&str] = &{input_files:?};\n"));
	out.push_str(&format!("pub const FINGERPRINT: &str = {:?};\n", stats.fingerprint));
	out.push_str(&format!(
		"pub const COMPILE_TIME_SECS: f64 = {};\n",
		float_literal(stats.compilation_time)
	));
	out.push_str(&format!(
		"pub const PEAK_MEMORY_MB: f64 = {};\n",
		float_literal(stats.memory_usage_mb)
	));
	out.push_str(&format!("pub const PATTERN_COUNT: usize = {};\n", provenance.pattern_count));
	out.push_str(&format!("pub const SKIPPED_ENTRIES: usize = {};\n\n", stats.skipped_entries));

	out.push_str("static DIRECT: &[(&str, f64)] = &[\n");
	for (key, value) in index.direct_entries() {
		out.push_str(&format!("\t({key:?}, {}),\n", float_literal(value)));
	}
	out.push_str("];\n\n");

	out.push_str("static COMPONENT: &[(&str, &str, f64)] = &[\n");
	for (shape, member, value) in index.component_entries() {
		out.push_str(&format!("\t({shape:?}, {member:?}, {}),\n", float_literal(value)));
	}
	out.push_str("];\n\n");

	out.push_str("static GENERIC: &[(&str, f64)] = &[\n");
	for (pattern, value) in index.generic_patterns() {
		out.push_str(&format!("\t({pattern:?}, {}),\n", float_literal(value)));
	}
	out.push_str("];\n\n");

	render_hierarchy(&mut out, index.hierarchy());
	out.push('\n');
	out.push_str(QUERIES);
	out
}

fn render_hierarchy(out: &mut String, hierarchy: &Hierarchy) {
	out.push_str(&format!(
		"static REGIONS: &[&str] = &{:?};\n\n",
		hierarchy.regions
	));
	out.push_str("static PREFECTURES: &[(&str, &[&str])] = &[\n");
	for (region, prefectures) in &hierarchy.prefectures {
		out.push_str(&format!("\t({region:?}, &{prefectures:?}),\n"));
	}
	out.push_str("];\n");
}

/// A Rust expression for `x` that survives a round trip through the compiler.
fn float_literal(x: f64) -> String {
	if x.is_nan() {
		"f64::NAN".to_string()
	} else if x == f64::INFINITY {
		"f64::INFINITY".to_string()
	} else if x == f64::NEG_INFINITY {
		"f64::NEG_INFINITY".to_string()
	} else {
		format!("{x:?}")
	}
}
