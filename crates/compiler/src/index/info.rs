//! Query result and statistics types.

use std::path::PathBuf;

use serde::Serialize;

/// Which table answered a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FoundIn {
	Direct,
	Component,
	Generic,
	/// Nothing matched; the caller's default was returned.
	Default,
}

/// Provenance of a resolved weight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceMetadata {
	/// Shape key of the component bucket, e.g. `edge.*.gateway`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub shape: Option<String>,
	/// Hierarchy member the wildcard resolved to.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub member: Option<String>,
	/// Region owning `member`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub region: Option<String>,
	/// Generic pattern that matched.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub pattern: Option<String>,
}

/// Result of [`crate::CompiledIndex::get_service_info`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceInfo {
	pub service_name: String,
	pub service_time: f64,
	pub found_in: FoundIn,
	pub metadata: ServiceMetadata,
}

/// Summary of one compilation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompilationStats {
	/// Concrete keys across the direct and component tables.
	pub total_services: usize,
	pub direct_mappings: usize,
	pub component_mappings: usize,
	pub generic_patterns: usize,
	/// Entries dropped as malformed.
	pub skipped_entries: usize,
	/// Wall time of the compilation, in seconds.
	pub compilation_time: f64,
	/// Structural estimate of the index tables, in MiB.
	pub memory_usage_mb: f64,
	pub input_files: Vec<PathBuf>,
	/// Hex SHA-256 over the hierarchy and service map.
	pub fingerprint: String,
}
