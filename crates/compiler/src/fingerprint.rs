//! Content hash over compilation inputs.

use sha2::{Digest, Sha256};

use crate::hierarchy::Hierarchy;
use crate::service_map::ServiceMap;

/// Hex SHA-256 over the hierarchy followed by the service map in source order.
///
/// Every field is length-prefixed, so adjacent strings cannot run together.
pub fn fingerprint(services: &ServiceMap, hierarchy: &Hierarchy) -> String {
	let mut hasher = Sha256::new();

	section(&mut hasher, "regions", hierarchy.regions.len());
	for region in &hierarchy.regions {
		field(&mut hasher, region.as_bytes());
	}
	section(&mut hasher, "prefectures", hierarchy.prefectures.len());
	for (region, prefectures) in &hierarchy.prefectures {
		field(&mut hasher, region.as_bytes());
		list(&mut hasher, prefectures);
	}
	section(&mut hasher, "dimensions", hierarchy.dimensions.len());
	for (name, members) in &hierarchy.dimensions {
		field(&mut hasher, name.as_bytes());
		list(&mut hasher, members);
	}
	section(&mut hasher, "positions", hierarchy.positions.len());
	for (index, name) in &hierarchy.positions {
		hasher.update((*index as u64).to_le_bytes());
		field(&mut hasher, name.as_bytes());
	}
	section(&mut hasher, "services", services.len());
	for (pattern, weight) in services.iter() {
		field(&mut hasher, pattern.as_bytes());
		hasher.update(weight.to_bits().to_le_bytes());
	}

	hex::encode(hasher.finalize())
}

fn section(hasher: &mut Sha256, name: &str, len: usize) {
	field(hasher, name.as_bytes());
	hasher.update((len as u64).to_le_bytes());
}

fn list(hasher: &mut Sha256, items: &[String]) {
	hasher.update((items.len() as u64).to_le_bytes());
	for item in items {
		field(hasher, item.as_bytes());
	}
}

fn field(hasher: &mut Sha256, bytes: &[u8]) {
	hasher.update((bytes.len() as u64).to_le_bytes());
	hasher.update(bytes);
}

#[cfg(test)]
mod tests {
	use super::*;

	fn hierarchy() -> Hierarchy {
		Hierarchy::new()
			.with_regions(["kanto"])
			.with_prefectures("kanto", ["tokyo"])
	}

	#[test]
	fn stable_for_equal_inputs() {
		let a = fingerprint(&ServiceMap::from([("a.*", 1.0)]), &hierarchy());
		let b = fingerprint(&ServiceMap::from([("a.*", 1.0)]), &hierarchy());
		assert_eq!(a, b);
		assert_eq!(a.len(), 64);
	}

	#[test]
	fn sensitive_to_order_weights_and_hierarchy() {
		let base = fingerprint(&ServiceMap::from([("a", 1.0), ("b", 2.0)]), &hierarchy());
		let swapped = fingerprint(&ServiceMap::from([("b", 2.0), ("a", 1.0)]), &hierarchy());
		let reweighted = fingerprint(&ServiceMap::from([("a", 1.0), ("b", 2.5)]), &hierarchy());
		let regions = fingerprint(
			&ServiceMap::from([("a", 1.0), ("b", 2.0)]),
			&hierarchy().with_regions(["kanto", "kansai"]),
		);
		assert_ne!(base, swapped);
		assert_ne!(base, reweighted);
		assert_ne!(base, regions);
	}

	#[test]
	fn fields_do_not_run_together() {
		let a = fingerprint(&ServiceMap::new(), &Hierarchy::new().with_regions(["ab", "c"]));
		let b = fingerprint(&ServiceMap::new(), &Hierarchy::new().with_regions(["a", "bc"]));
		assert_ne!(a, b);
	}
}
