//! Ordered pattern → weight input.

use indexmap::IndexMap;

use crate::diagnostic::{Diagnostic, DiagnosticKind};

/// Source-ordered mapping from pattern text to weight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceMap {
	entries: IndexMap<String, f64>,
}

impl ServiceMap {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts a pattern. Re-inserting an existing pattern moves it to the end, so a later
	/// definition is also processed later.
	pub fn insert(&mut self, pattern: impl Into<String>, weight: f64) {
		let pattern = pattern.into();
		self.entries.shift_remove(&pattern);
		self.entries.insert(pattern, weight);
	}

	/// Appends every entry of `other`, with `other` taking precedence.
	pub fn merge(&mut self, other: ServiceMap) {
		for (pattern, weight) in other.entries {
			self.insert(pattern, weight);
		}
	}

	pub fn get(&self, pattern: &str) -> Option<f64> {
		self.entries.get(pattern).copied()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
		self.entries.iter().map(|(k, v)| (k.as_str(), *v))
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Builds a map from a JSON object, skipping entries whose weight is not numeric.
	///
	/// A document of the form `{"services": {...}}` is unwrapped first. Anything that is not an
	/// object yields an empty map and one diagnostic.
	pub fn from_json(json: &serde_json::Value) -> (Self, Vec<Diagnostic>) {
		let mut map = Self::new();
		let mut diagnostics = Vec::new();

		let object = match json
			.get("services")
			.filter(|s| s.is_object())
			.unwrap_or(json)
		{
			serde_json::Value::Object(object) => object,
			other => {
				diagnostics.push(Diagnostic::new(
					"",
					DiagnosticKind::NonNumericValue {
						found: json_kind(other).to_string(),
					},
				));
				return (map, diagnostics);
			}
		};

		for (pattern, value) in object {
			match value.as_f64() {
				Some(weight) => map.insert(pattern.clone(), weight),
				None => diagnostics.push(Diagnostic::new(
					pattern.clone(),
					DiagnosticKind::NonNumericValue {
						found: json_kind(value).to_string(),
					},
				)),
			}
		}
		(map, diagnostics)
	}
}

fn json_kind(value: &serde_json::Value) -> &'static str {
	match value {
		serde_json::Value::Null => "null",
		serde_json::Value::Bool(_) => "bool",
		serde_json::Value::Number(_) => "number",
		serde_json::Value::String(_) => "string",
		serde_json::Value::Array(_) => "array",
		serde_json::Value::Object(_) => "object",
	}
}

impl<K: Into<String>> FromIterator<(K, f64)> for ServiceMap {
	fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
		let mut map = Self::new();
		for (k, v) in iter {
			map.insert(k, v);
		}
		map
	}
}

impl<K: Into<String>, const N: usize> From<[(K, f64); N]> for ServiceMap {
	fn from(entries: [(K, f64); N]) -> Self {
		entries.into_iter().collect()
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn keeps_source_order() {
		let map = ServiceMap::from([("b", 1.0), ("a", 2.0), ("c", 3.0)]);
		let keys: Vec<_> = map.iter().map(|(k, _)| k).collect();
		assert_eq!(keys, vec!["b", "a", "c"]);
	}

	#[test]
	fn reinsert_moves_to_end() {
		let mut map = ServiceMap::from([("a", 1.0), ("b", 2.0)]);
		map.insert("a", 5.0);
		let entries: Vec<_> = map.iter().collect();
		assert_eq!(entries, vec![("b", 2.0), ("a", 5.0)]);
	}

	#[test]
	fn from_json_skips_non_numeric_weights() {
		let doc = json!({
			"edge.*.gateway": 0.03,
			"broken": "fast",
			"count": 2,
			"flag": true,
		});
		let (map, diagnostics) = ServiceMap::from_json(&doc);
		assert_eq!(map.len(), 2);
		assert_eq!(map.get("count"), Some(2.0));
		assert_eq!(diagnostics.len(), 2);
		assert_eq!(diagnostics[0].pattern, "broken");
		assert_eq!(
			diagnostics[0].kind,
			DiagnosticKind::NonNumericValue {
				found: "string".into()
			}
		);
	}

	#[test]
	fn from_json_unwraps_services_key() {
		let doc = json!({ "services": { "a.*": 1.5 } });
		let (map, diagnostics) = ServiceMap::from_json(&doc);
		assert!(diagnostics.is_empty());
		assert_eq!(map.get("a.*"), Some(1.5));
	}

	#[test]
	fn from_json_rejects_non_objects() {
		let (map, diagnostics) = ServiceMap::from_json(&json!([1, 2]));
		assert!(map.is_empty());
		assert_eq!(diagnostics.len(), 1);
	}
}
