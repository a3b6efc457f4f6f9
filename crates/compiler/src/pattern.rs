//! Pattern parsing and shape classification.

use std::fmt;

use smallvec::SmallVec;

use crate::diagnostic::DiagnosticKind;

/// Segment separator.
pub const SEPARATOR: char = '.';
/// Wildcard marker; must fill a whole segment.
pub const WILDCARD: &str = "*";

/// One dot-separated piece of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
	Literal(Box<str>),
	Wildcard,
}

impl Segment {
	/// Returns true if this segment accepts `candidate`.
	#[inline]
	pub fn accepts(&self, candidate: &str) -> bool {
		match self {
			Segment::Literal(lit) => lit.as_ref() == candidate,
			Segment::Wildcard => true,
		}
	}
}

/// Shape of a pattern, decided once at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternShape {
	/// No wildcards.
	Exact,
	/// `<head>.*`, resolved against regions.
	TwoPart { head: Box<str> },
	/// `<head>.*.<tail>`, resolved against prefectures.
	ThreePart { head: Box<str>, tail: Box<str> },
	/// Any other wildcard-bearing shape.
	Generic,
}

/// A parsed, classified pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
	text: Box<str>,
	segments: SmallVec<[Segment; 4]>,
	shape: PatternShape,
}

impl Pattern {
	/// Parses and classifies `text`.
	pub fn parse(text: &str) -> Result<Self, DiagnosticKind> {
		if text.is_empty() {
			return Err(DiagnosticKind::EmptyPattern);
		}

		let mut segments = SmallVec::new();
		for (index, raw) in text.split(SEPARATOR).enumerate() {
			if raw.is_empty() {
				return Err(DiagnosticKind::EmptySegment { index });
			}
			if raw == WILDCARD {
				segments.push(Segment::Wildcard);
			} else if raw.contains('*') {
				return Err(DiagnosticKind::PartialWildcard { index });
			} else {
				segments.push(Segment::Literal(raw.into()));
			}
		}

		let shape = classify(&segments);
		Ok(Self {
			text: text.into(),
			segments,
			shape,
		})
	}

	pub fn as_str(&self) -> &str {
		&self.text
	}

	pub fn segments(&self) -> &[Segment] {
		&self.segments
	}

	pub fn shape(&self) -> &PatternShape {
		&self.shape
	}

	/// Segment indices holding a wildcard, in order.
	pub fn wildcard_positions(&self) -> impl Iterator<Item = usize> + '_ {
		self.segments
			.iter()
			.enumerate()
			.filter(|(_, s)| matches!(s, Segment::Wildcard))
			.map(|(i, _)| i)
	}

	/// Anchored, segment-wise match: `*` accepts exactly one segment.
	pub fn matches<S: AsRef<str>>(&self, segments: &[S]) -> bool {
		self.segments.len() == segments.len()
			&& self
				.segments
				.iter()
				.zip(segments)
				.all(|(p, s)| p.accepts(s.as_ref()))
	}
}

impl fmt::Display for Pattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.text)
	}
}

fn classify(segments: &[Segment]) -> PatternShape {
	use Segment::{Literal, Wildcard};

	match segments {
		_ if !segments.contains(&Wildcard) => PatternShape::Exact,
		[Literal(head), Wildcard] => PatternShape::TwoPart { head: head.clone() },
		[Literal(head), Wildcard, Literal(tail)] => PatternShape::ThreePart {
			head: head.clone(),
			tail: tail.clone(),
		},
		_ => PatternShape::Generic,
	}
}

/// Splits a concrete name into the shape key and member a two- or three-part pattern would
/// have produced for it.
///
/// `"edge.tokyo.gateway"` yields `("edge.*.gateway", "tokyo")`.
pub fn component_key(name: &str) -> Option<(String, &str)> {
	let mut parts = name.split(SEPARATOR);
	let head = parts.next()?;
	let member = parts.next()?;
	let shape = match (parts.next(), parts.next()) {
		(None, _) => format!("{head}{SEPARATOR}{WILDCARD}"),
		(Some(tail), None) if !tail.is_empty() && tail != WILDCARD => {
			format!("{head}{SEPARATOR}{WILDCARD}{SEPARATOR}{tail}")
		}
		_ => return None,
	};
	if head.is_empty() || member.is_empty() || head == WILDCARD || member == WILDCARD {
		return None;
	}
	Some((shape, member))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn classifies_shapes() {
		let shape = |s: &str| Pattern::parse(s).unwrap().shape().clone();
		assert_eq!(shape("edge.tokyo.gateway"), PatternShape::Exact);
		assert_eq!(shape("standalone"), PatternShape::Exact);
		assert_eq!(
			shape("service-hub.*"),
			PatternShape::TwoPart {
				head: "service-hub".into()
			}
		);
		assert_eq!(
			shape("edge.*.gateway"),
			PatternShape::ThreePart {
				head: "edge".into(),
				tail: "gateway".into()
			}
		);
		assert_eq!(shape("app.*.env.*"), PatternShape::Generic);
		assert_eq!(shape("*.api"), PatternShape::Generic);
		assert_eq!(shape("a.b.*"), PatternShape::Generic);
		assert_eq!(shape("*"), PatternShape::Generic);
		assert_eq!(shape("a.*.*"), PatternShape::Generic);
	}

	#[test]
	fn rejects_malformed_patterns() {
		assert_eq!(Pattern::parse(""), Err(DiagnosticKind::EmptyPattern));
		assert_eq!(
			Pattern::parse("a..b"),
			Err(DiagnosticKind::EmptySegment { index: 1 })
		);
		assert_eq!(
			Pattern::parse(".a"),
			Err(DiagnosticKind::EmptySegment { index: 0 })
		);
		assert_eq!(
			Pattern::parse("a."),
			Err(DiagnosticKind::EmptySegment { index: 1 })
		);
		assert_eq!(
			Pattern::parse("edge.to*.gw"),
			Err(DiagnosticKind::PartialWildcard { index: 1 })
		);
	}

	#[test]
	fn matching_is_anchored_and_segment_wise() {
		let p = Pattern::parse("app.*.env.*").unwrap();
		assert!(p.matches(&["app", "kanto", "env", "prod"]));
		assert!(!p.matches(&["app", "kanto", "env"]));
		assert!(!p.matches(&["app", "kanto", "env", "prod", "x"]));
		assert!(!p.matches(&["xapp", "kanto", "env", "prod"]));
		assert_eq!(p.wildcard_positions().collect::<Vec<_>>(), vec![1, 3]);
	}

	#[test]
	fn component_key_decomposition() {
		assert_eq!(
			component_key("service-hub.kanto"),
			Some(("service-hub.*".to_string(), "kanto"))
		);
		assert_eq!(
			component_key("edge.tokyo.gateway"),
			Some(("edge.*.gateway".to_string(), "tokyo"))
		);
		assert_eq!(component_key("single"), None);
		assert_eq!(component_key("a.b.c.d"), None);
		assert_eq!(component_key("a..c"), None);
	}
}
