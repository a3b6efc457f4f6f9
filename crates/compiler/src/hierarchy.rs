//! Wildcard resolution dimensions.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Name of the top-level dimension.
pub const REGION: &str = "region";
/// Name of the flattened second-level dimension.
pub const PREFECTURE: &str = "prefecture";

/// Caller-supplied dimensions that wildcards resolve against.
///
/// Dimension order, used when a multi-wildcard pattern has no explicit position binding, is
/// [`REGION`], [`PREFECTURE`], then [`Hierarchy::dimensions`] in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Hierarchy {
	/// Ordered region names.
	pub regions: Vec<String>,
	/// Region name to its ordered prefectures.
	pub prefectures: IndexMap<String, Vec<String>>,
	/// Extra named dimensions.
	pub dimensions: IndexMap<String, Vec<String>>,
	/// Segment index to dimension name, overriding ordinal assignment.
	pub positions: BTreeMap<usize, String>,
}

impl Hierarchy {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replaces the region list.
	pub fn with_regions<I, S>(mut self, regions: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.regions = regions.into_iter().map(Into::into).collect();
		self
	}

	/// Sets the prefectures of one region.
	pub fn with_prefectures<I, S>(mut self, region: impl Into<String>, prefectures: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.prefectures.insert(
			region.into(),
			prefectures.into_iter().map(Into::into).collect(),
		);
		self
	}

	/// Adds or replaces an extra dimension.
	pub fn with_dimension<I, S>(mut self, name: impl Into<String>, members: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.dimensions
			.insert(name.into(), members.into_iter().map(Into::into).collect());
		self
	}

	/// Binds the wildcard at segment `index` to a named dimension.
	pub fn bind_position(mut self, index: usize, dimension: impl Into<String>) -> Self {
		self.positions.insert(index, dimension.into());
		self
	}

	/// All prefectures in region order, first occurrence kept.
	pub fn all_prefectures(&self) -> Vec<&str> {
		let mut seen = rustc_hash::FxHashSet::default();
		self.prefectures
			.values()
			.flatten()
			.map(String::as_str)
			.filter(|p| seen.insert(*p))
			.collect()
	}

	/// Prefectures configured for `region`.
	pub fn prefectures_of(&self, region: &str) -> &[String] {
		self.prefectures.get(region).map(Vec::as_slice).unwrap_or(&[])
	}

	/// The region a member belongs to: itself if it is a region, else the first region
	/// listing it as a prefecture.
	pub fn region_of<'a>(&'a self, member: &'a str) -> Option<&'a str> {
		if self.regions.iter().any(|r| r == member) {
			return Some(member);
		}
		self.prefectures
			.iter()
			.find(|(_, prefs)| prefs.iter().any(|p| p == member))
			.map(|(region, _)| region.as_str())
	}

	/// Members of a dimension by name.
	pub fn dimension(&self, name: &str) -> Option<Vec<&str>> {
		match name {
			REGION => Some(self.regions.iter().map(String::as_str).collect()),
			PREFECTURE => Some(self.all_prefectures()),
			other => self
				.dimensions
				.get(other)
				.map(|m| m.iter().map(String::as_str).collect()),
		}
	}

	/// Name of the dimension a wildcard resolves to.
	///
	/// `index` is the wildcard's segment index, `ordinal` its rank among the pattern's
	/// wildcards.
	pub fn dimension_for(&self, index: usize, ordinal: usize) -> Option<&str> {
		if let Some(bound) = self.positions.get(&index) {
			return Some(bound);
		}
		match ordinal {
			0 => Some(REGION),
			1 => Some(PREFECTURE),
			n => self.dimensions.keys().nth(n - 2).map(String::as_str),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn japan() -> Hierarchy {
		Hierarchy::new()
			.with_regions(["kanto", "kansai"])
			.with_prefectures("kanto", ["tokyo", "kanagawa"])
			.with_prefectures("kansai", ["osaka", "kyoto"])
	}

	#[test]
	fn flattens_prefectures_in_region_order() {
		assert_eq!(
			japan().all_prefectures(),
			vec!["tokyo", "kanagawa", "osaka", "kyoto"]
		);
	}

	#[test]
	fn duplicate_prefectures_keep_first_occurrence() {
		let h = japan().with_prefectures("border", ["kyoto", "nara"]);
		assert_eq!(
			h.all_prefectures(),
			vec!["tokyo", "kanagawa", "osaka", "kyoto", "nara"]
		);
	}

	#[test]
	fn ordinal_dimension_assignment() {
		let h = japan().with_dimension("env", ["prod", "staging"]);
		assert_eq!(h.dimension_for(1, 0), Some(REGION));
		assert_eq!(h.dimension_for(3, 1), Some(PREFECTURE));
		assert_eq!(h.dimension_for(5, 2), Some("env"));
		assert_eq!(h.dimension_for(7, 3), None);
	}

	#[test]
	fn position_binding_overrides_ordinal() {
		let h = japan()
			.with_dimension("env", ["prod"])
			.bind_position(3, "env");
		assert_eq!(h.dimension_for(1, 0), Some(REGION));
		assert_eq!(h.dimension_for(3, 1), Some("env"));
	}

	#[test]
	fn deserializes_from_yaml() {
		let yaml = r#"
regions: [kanto, kansai]
prefectures:
  kanto: [tokyo, kanagawa]
  kansai: [osaka]
dimensions:
  env: [prod, staging]
positions:
  3: env
"#;
		let h: Hierarchy = serde_yaml::from_str(yaml).unwrap();
		assert_eq!(h.regions, vec!["kanto", "kansai"]);
		assert_eq!(h.prefectures_of("kanto"), ["tokyo", "kanagawa"]);
		assert_eq!(h.prefectures_of("kyushu"), [] as [String; 0]);
		assert_eq!(h.dimension("env"), Some(vec!["prod", "staging"]));
		assert_eq!(h.positions.get(&3).map(String::as_str), Some("env"));
	}
}
