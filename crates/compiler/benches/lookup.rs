//! Lookup cost against index size.
//!
//! Direct and component probes should cost the same at 100 and 10,000 entries.
//!
//! Run with: cargo bench -p svcmap-compiler

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use svcmap_compiler::{CompiledIndex, Hierarchy, ServiceMap, compile};

/// `n` exact entries plus `n` component entries spread over one three-part shape.
fn build_index(n: usize) -> CompiledIndex {
	let hierarchy = Hierarchy::new()
		.with_regions(["all"])
		.with_prefectures("all", (0..n).map(|i| format!("p{i}")));
	let mut services: ServiceMap = (0..n).map(|i| (format!("svc{i}.direct"), i as f64)).collect();
	services.insert("edge.*.gateway", 0.03);
	services.insert("app.*.env.*", 0.2);
	compile(&services, &hierarchy)
}

fn bench_lookup(c: &mut Criterion) {
	let mut group = c.benchmark_group("lookup");

	for n in [100, 10_000] {
		let index = build_index(n);
		let direct = format!("svc{}.direct", n / 2);
		let component = format!("edge.p{}.gateway", n / 2);
		let generic = "app.x.env.y";

		group.bench_with_input(BenchmarkId::new("direct", n), &direct, |b, name| {
			b.iter(|| black_box(index.get_service_time(black_box(name), 0.0)));
		});
		group.bench_with_input(BenchmarkId::new("component", n), &component, |b, name| {
			b.iter(|| black_box(index.get_service_time(black_box(name), 0.0)));
		});
		group.bench_with_input(BenchmarkId::new("generic_cached", n), &generic, |b, name| {
			b.iter(|| black_box(index.get_service_time(black_box(name), 0.0)));
		});
		group.bench_with_input(BenchmarkId::new("miss", n), &"nowhere.at.all", |b, name| {
			b.iter(|| black_box(index.get_service_time(black_box(name), 0.0)));
		});
	}

	group.finish();
}

criterion_group!(benches, bench_lookup);
criterion_main!(benches);
