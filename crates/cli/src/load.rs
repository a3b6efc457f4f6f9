//! Input loading.
//!
//! Files ending in `.yaml` or `.yml` are parsed as YAML, everything else as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use svcmap_compiler::{Diagnostic, Hierarchy, ServiceMap};

/// Failure to read or parse an input file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
	#[error("failed to read {}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid JSON in {}", path.display())]
	Json {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("invalid YAML in {}", path.display())]
	Yaml {
		path: PathBuf,
		#[source]
		source: serde_yaml::Error,
	},
}

/// Input format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
	Json,
	Yaml,
}

impl Format {
	pub fn of(path: &Path) -> Self {
		match path.extension().and_then(|e| e.to_str()) {
			Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => Format::Yaml,
			_ => Format::Json,
		}
	}
}

/// Reads and deserializes `path`.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
	let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
		path: path.to_path_buf(),
		source,
	})?;
	tracing::debug!(path = %path.display(), bytes = text.len(), "loaded input");
	match Format::of(path) {
		Format::Json => serde_json::from_str(&text).map_err(|source| LoadError::Json {
			path: path.to_path_buf(),
			source,
		}),
		Format::Yaml => serde_yaml::from_str(&text).map_err(|source| LoadError::Yaml {
			path: path.to_path_buf(),
			source,
		}),
	}
}

/// Reads an arbitrary document as a JSON value tree.
pub fn load_value(path: &Path) -> Result<serde_json::Value, LoadError> {
	load(path)
}

pub fn load_hierarchy(path: &Path) -> Result<Hierarchy, LoadError> {
	load(path)
}

/// Reads and merges service files in order; later files override earlier ones.
///
/// Entries with non-numeric weights are dropped and returned as diagnostics.
pub fn load_services(paths: &[PathBuf]) -> Result<(ServiceMap, Vec<Diagnostic>), LoadError> {
	let mut services = ServiceMap::new();
	let mut diagnostics = Vec::new();
	for path in paths {
		let (map, skipped) = ServiceMap::from_json(&load_value(path)?);
		tracing::debug!(path = %path.display(), entries = map.len(), skipped = skipped.len(), "read service map");
		services.merge(map);
		diagnostics.extend(skipped);
	}
	Ok((services, diagnostics))
}

#[cfg(test)]
mod tests {
	use std::fs;

	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn format_follows_extension() {
		assert_eq!(Format::of(Path::new("a.yaml")), Format::Yaml);
		assert_eq!(Format::of(Path::new("a.YML")), Format::Yaml);
		assert_eq!(Format::of(Path::new("a.json")), Format::Json);
		assert_eq!(Format::of(Path::new("services")), Format::Json);
	}

	#[test]
	fn later_service_files_override_earlier_ones() {
		let dir = tempfile::tempdir().unwrap();
		let base = dir.path().join("base.json");
		let over = dir.path().join("override.yaml");
		fs::write(&base, r#"{"svc.*": 1.0, "solo": 2.0, "bad": "x"}"#).unwrap();
		fs::write(&over, "services:\n  svc.*: 3.0\n").unwrap();

		let (services, diagnostics) = load_services(&[base, over]).unwrap();
		assert_eq!(
			services.iter().collect::<Vec<_>>(),
			vec![("solo", 2.0), ("svc.*", 3.0)]
		);
		assert_eq!(diagnostics.len(), 1);
		assert_eq!(diagnostics[0].pattern, "bad");
	}

	#[test]
	fn errors_name_the_file() {
		let dir = tempfile::tempdir().unwrap();
		let missing = dir.path().join("missing.json");
		let err = load_value(&missing).unwrap_err();
		assert!(matches!(err, LoadError::Io { .. }));
		assert!(err.to_string().contains("missing.json"));

		let broken = dir.path().join("broken.yaml");
		fs::write(&broken, "regions: [unclosed").unwrap();
		assert!(matches!(load_hierarchy(&broken), Err(LoadError::Yaml { .. })));
	}
}
