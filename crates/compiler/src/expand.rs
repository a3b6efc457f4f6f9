//! Wildcard pattern expansion.
//!
//! # Role
//!
//! Instantiates one pattern against a [`Hierarchy`], producing every concrete key with the
//! source weight. The expander never fails: a wildcard it cannot map to a dimension yields an
//! empty result plus a [`Diagnostic`].
//!
//! # Dimension Rules
//!
//! | Shape | Wildcard resolves to |
//! |-------|----------------------|
//! | `<head>.*` | regions |
//! | `<head>.*.<tail>` | prefectures (flattened) |
//! | anything else | per wildcard: position binding, else the n-th dimension |
//!
//! Multi-wildcard shapes enumerate the full cross product, leftmost wildcard varying slowest.
//! No size limit is applied here.

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::hierarchy::{Hierarchy, PREFECTURE, REGION};
use crate::pattern::{Pattern, PatternShape, SEPARATOR, Segment};
use crate::service_map::ServiceMap;

/// Concrete keys produced from one or more patterns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expansion {
	pub entries: IndexMap<String, f64>,
	pub diagnostics: Vec<Diagnostic>,
}

impl Expansion {
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// One concrete instantiation, with the member chosen for each wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Instance<'h> {
	pub key: String,
	pub members: SmallVec<[&'h str; 2]>,
}

struct Axis<'h> {
	segment: usize,
	members: Vec<&'h str>,
}

/// Expands `pattern` into concrete keys carrying `value`.
pub fn expand(pattern: &str, value: f64, hierarchy: &Hierarchy) -> Expansion {
	match Pattern::parse(pattern) {
		Ok(parsed) => expand_pattern(&parsed, value, hierarchy),
		Err(kind) => Expansion {
			entries: IndexMap::new(),
			diagnostics: vec![Diagnostic::new(pattern, kind)],
		},
	}
}

/// Expands an already parsed pattern.
pub fn expand_pattern(pattern: &Pattern, value: f64, hierarchy: &Hierarchy) -> Expansion {
	match instantiate(pattern, hierarchy) {
		Ok(instances) => Expansion {
			entries: instances.into_iter().map(|i| (i.key, value)).collect(),
			diagnostics: Vec::new(),
		},
		Err(kind) => Expansion {
			entries: IndexMap::new(),
			diagnostics: vec![Diagnostic::new(pattern.as_str(), kind)],
		},
	}
}

/// Expands every entry of `services`; later entries win on concrete-key conflicts.
pub fn expand_all(services: &ServiceMap, hierarchy: &Hierarchy) -> Expansion {
	let mut out = Expansion::default();
	for (pattern, value) in services.iter() {
		let Expansion {
			entries,
			diagnostics,
		} = expand(pattern, value, hierarchy);
		for (key, value) in entries {
			out.entries.shift_remove(&key);
			out.entries.insert(key, value);
		}
		out.diagnostics.extend(diagnostics);
	}
	out
}

pub(crate) fn instantiate<'h>(
	pattern: &Pattern,
	hierarchy: &'h Hierarchy,
) -> Result<Vec<Instance<'h>>, DiagnosticKind> {
	let axes = match pattern.shape() {
		PatternShape::Exact => {
			return Ok(vec![Instance {
				key: pattern.as_str().to_owned(),
				members: SmallVec::new(),
			}]);
		}
		PatternShape::TwoPart { .. } => vec![axis(hierarchy, 1, REGION)?],
		PatternShape::ThreePart { .. } => vec![axis(hierarchy, 1, PREFECTURE)?],
		PatternShape::Generic => pattern
			.wildcard_positions()
			.enumerate()
			.map(|(ordinal, segment)| {
				let name = hierarchy
					.dimension_for(segment, ordinal)
					.ok_or(DiagnosticKind::UnknownDimension { index: segment })?;
				axis(hierarchy, segment, name)
			})
			.collect::<Result<Vec<_>, _>>()?,
	};

	let total = axes
		.iter()
		.try_fold(1usize, |acc, a| acc.checked_mul(a.members.len()));
	let mut out = Vec::with_capacity(total.unwrap_or(0).min(1 << 16));
	let mut cursor = vec![0usize; axes.len()];
	loop {
		out.push(render(pattern.segments(), &axes, &cursor));

		let mut i = axes.len();
		loop {
			if i == 0 {
				return Ok(out);
			}
			i -= 1;
			cursor[i] += 1;
			if cursor[i] < axes[i].members.len() {
				break;
			}
			cursor[i] = 0;
		}
	}
}

fn axis<'h>(hierarchy: &'h Hierarchy, segment: usize, name: &str) -> Result<Axis<'h>, DiagnosticKind> {
	let members = hierarchy
		.dimension(name)
		.ok_or(DiagnosticKind::UnknownDimension { index: segment })?;
	if members.is_empty() {
		return Err(DiagnosticKind::EmptyDimension {
			name: name.to_owned(),
		});
	}
	Ok(Axis { segment, members })
}

fn render<'h>(segments: &[Segment], axes: &[Axis<'h>], cursor: &[usize]) -> Instance<'h> {
	let mut key = String::new();
	let mut members = SmallVec::new();
	let mut next_axis = 0;
	for (i, segment) in segments.iter().enumerate() {
		if i > 0 {
			key.push(SEPARATOR);
		}
		match segment {
			Segment::Literal(lit) => key.push_str(lit),
			Segment::Wildcard => {
				let axis = &axes[next_axis];
				debug_assert_eq!(axis.segment, i);
				let member = axis.members[cursor[next_axis]];
				key.push_str(member);
				members.push(member);
				next_axis += 1;
			}
		}
	}
	Instance { key, members }
}
