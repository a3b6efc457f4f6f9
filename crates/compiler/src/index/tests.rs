use std::collections::BTreeMap;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use svcmap_intern::Value;

use super::{CompiledIndex, FoundIn, Hit, ServiceMetadata};
use crate::compiler::compile;
use crate::hierarchy::Hierarchy;
use crate::service_map::ServiceMap;

fn japan() -> Hierarchy {
	Hierarchy::new()
		.with_regions(["kanto", "kansai"])
		.with_prefectures("kanto", ["tokyo", "kanagawa"])
		.with_prefectures("kansai", ["osaka"])
}

fn sample() -> CompiledIndex {
	compile(
		&ServiceMap::from([
			("service-hub.*", 0.08),
			("edge.*.gateway", 0.03),
			("standalone", 1.0),
			("app.*.env.*", 0.2),
			("app.kanto.*.*", 0.9),
		]),
		&japan(),
	)
}

fn map(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
	pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[test]
fn repeat_queries_hit_the_match_cache() {
	let index = sample();
	assert_eq!(index.cache_sizes(), (0, 0));

	assert_eq!(index.service_time("app.kansai.env.prod"), Some(0.2));
	assert_eq!(index.cache_sizes(), (1, 1));
	assert_eq!(index.service_time("app.kansai.env.prod"), Some(0.2));
	assert_eq!(index.cache_sizes(), (1, 1));

	assert_eq!(index.service_time("nothing.here"), None);
	assert_eq!(index.service_time("nothing.here"), None);
	assert_eq!(index.cache_sizes(), (2, 2));
}

#[test]
fn direct_hits_skip_the_caches() {
	let index = sample();
	assert_eq!(index.service_time("standalone"), Some(1.0));
	assert_eq!(index.cache_sizes(), (0, 0));
}

#[test]
fn component_hits_do_not_consult_generics() {
	let index = sample();
	assert_eq!(index.service_time("edge.tokyo.gateway"), Some(0.03));
	assert_eq!(index.cache_sizes(), (1, 0));
}

#[test]
fn component_hits_borrow_the_member_from_the_cached_split() {
	let index = sample();
	assert_eq!(index.service_time("edge.tokyo.gateway"), Some(0.03));
	let cached = index.splits.get_or_split("edge.tokyo.gateway");

	match index.lookup("edge.tokyo.gateway") {
		Some(Hit::Component { split, value, .. }) => {
			assert!(Arc::ptr_eq(&split, &cached));
			assert_eq!(split.member(), Some("tokyo"));
			assert_eq!(value, 0.03);
		}
		_ => panic!("expected a component hit"),
	}
	assert_eq!(
		index.get_service_info("edge.tokyo.gateway").metadata.member.as_deref(),
		Some("tokyo")
	);
	assert_eq!(index.cache_sizes(), (1, 0));
}

#[test]
fn misses_are_not_cached_without_generics() {
	let index = compile(&ServiceMap::from([("svc.*", 1.0)]), &japan());
	assert_eq!(index.service_time("svc.kyushu"), None);
	assert_eq!(index.cache_sizes().1, 0);
}

#[test]
fn first_generic_pattern_in_source_order_wins() {
	let index = sample();
	let info = index.get_service_info("app.kanto.env.prod");
	assert_eq!(info.service_time, 0.2);
	assert_eq!(info.found_in, FoundIn::Generic);
	assert_eq!(info.metadata.pattern.as_deref(), Some("app.*.env.*"));

	assert_eq!(index.service_time("app.kanto.web.prod"), Some(0.9));
}

#[test]
fn service_info_reports_component_provenance() {
	let index = sample();
	let info = index.get_service_info("edge.tokyo.gateway");
	assert_eq!(info.service_name, "edge.tokyo.gateway");
	assert_eq!(info.service_time, 0.03);
	assert_eq!(info.found_in, FoundIn::Component);
	assert_eq!(
		info.metadata,
		ServiceMetadata {
			shape: Some("edge.*.gateway".into()),
			member: Some("tokyo".into()),
			region: Some("kanto".into()),
			pattern: None,
		}
	);

	let info = index.get_service_info("service-hub.kansai");
	assert_eq!(info.metadata.region.as_deref(), Some("kansai"));
}

#[test]
fn service_info_for_unknown_names_defaults_to_zero() {
	let index = sample();
	let info = index.get_service_info("unknown");
	assert_eq!(info.service_time, 0.0);
	assert_eq!(info.found_in, FoundIn::Default);
	assert_eq!(info.metadata, ServiceMetadata::default());

	let direct = index.get_service_info("standalone");
	assert_eq!(direct.found_in, FoundIn::Direct);
	assert_eq!(direct.metadata, ServiceMetadata::default());
}

#[test]
fn service_info_serializes_found_in_as_snake_case() {
	let index = sample();
	let json = serde_json::to_value(index.get_service_info("edge.osaka.gateway")).unwrap();
	assert_eq!(json["found_in"], "component");
	assert_eq!(json["metadata"]["member"], "osaka");
	assert!(json["metadata"].get("pattern").is_none());
}

#[test]
fn services_by_pattern_scans_concrete_keys() {
	let index = sample();
	assert_eq!(
		index.get_services_by_pattern("edge.*.gateway"),
		map(&[
			("edge.kanagawa.gateway", 0.03),
			("edge.osaka.gateway", 0.03),
			("edge.tokyo.gateway", 0.03),
		])
	);
	assert_eq!(
		index.get_services_by_pattern("*.kan*"),
		map(&[("service-hub.kansai", 0.08), ("service-hub.kanto", 0.08)])
	);
	assert_eq!(index.get_services_by_pattern("stand*"), map(&[("standalone", 1.0)]));
}

#[test]
fn services_by_pattern_includes_resolved_generic_names() {
	let index = sample();
	assert!(index.get_services_by_pattern("app.*.env.*").is_empty());

	index.service_time("app.kansai.env.prod");
	index.service_time("app.nowhere");
	assert_eq!(
		index.get_services_by_pattern("app.*.env.*"),
		map(&[("app.kansai.env.prod", 0.2)])
	);
}

#[test]
fn list_all_services_is_sorted() {
	let index = sample();
	assert_eq!(
		index.list_all_services(),
		vec![
			"edge.kanagawa.gateway",
			"edge.osaka.gateway",
			"edge.tokyo.gateway",
			"service-hub.kansai",
			"service-hub.kanto",
			"standalone",
		]
	);
}

#[test]
fn services_by_region_include_its_prefectures() {
	let index = sample();
	assert_eq!(
		index.get_services_by_region("kanto"),
		map(&[
			("edge.kanagawa.gateway", 0.03),
			("edge.tokyo.gateway", 0.03),
			("service-hub.kanto", 0.08),
		])
	);
	assert!(index.get_services_by_region("kyushu").is_empty());
}

#[test]
fn services_by_prefecture() {
	let index = sample();
	assert_eq!(
		index.get_services_by_prefecture("osaka"),
		map(&[("edge.osaka.gateway", 0.03)])
	);
	assert!(index.get_services_by_prefecture("kyoto").is_empty());
}

#[test]
fn table_views_are_sorted() {
	let index = sample();
	assert_eq!(index.direct_entries().collect::<Vec<_>>(), vec![("standalone", 1.0)]);
	let components: Vec<_> = index.component_entries().collect();
	assert_eq!(components[0], ("edge.*.gateway", "kanagawa", 0.03));
	assert_eq!(components.last(), Some(&("service-hub.*", "kanto", 0.08)));
	assert_eq!(
		index.generic_patterns().collect::<Vec<_>>(),
		vec![("app.*.env.*", 0.2), ("app.kanto.*.*", 0.9)]
	);
}

#[test]
fn thaw_exports_direct_and_component_tables() {
	let index = compile(
		&ServiceMap::from([("svc.*", 0.5), ("solo", 1.0), ("app.*.*.x", 2.0)]),
		&japan(),
	);
	let expected: Value = [
		("direct", [("solo", 1.0)].into_iter().collect::<Value>()),
		(
			"components",
			[(
				"svc.*",
				[("kansai", 0.5), ("kanto", 0.5)].into_iter().collect::<Value>(),
			)]
			.into_iter()
			.collect::<Value>(),
		),
	]
	.into_iter()
	.collect();
	assert_eq!(index.thaw(), expected);
}

#[test]
fn concurrent_queries_agree() {
	fn assert_shareable<T: Send + Sync>() {}
	assert_shareable::<CompiledIndex>();

	let index = sample();
	std::thread::scope(|scope| {
		for _ in 0..4 {
			scope.spawn(|| {
				for _ in 0..100 {
					assert_eq!(index.service_time("app.kansai.env.dev"), Some(0.2));
					assert_eq!(index.service_time("edge.tokyo.gateway"), Some(0.03));
					assert_eq!(index.service_time("missing.a.b.c"), None);
				}
			});
		}
	});
	assert_eq!(index.cache_sizes(), (3, 2));
}
