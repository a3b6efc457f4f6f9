//! Non-fatal findings recorded while expanding and compiling.
//!
//! Compilation is best-effort: a bad line is skipped and reported here, never returned as an
//! error. Callers inspect [`crate::CompiledIndex::diagnostics`] after the fact.

use std::fmt;

use serde::Serialize;

/// Why an entry was skipped or expanded to nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
	#[error("empty pattern")]
	EmptyPattern,

	#[error("empty segment at position {index}")]
	EmptySegment { index: usize },

	#[error("segment {index} mixes `*` with literal text")]
	PartialWildcard { index: usize },

	#[error("weight is not a number (found {found})")]
	NonNumericValue { found: String },

	#[error("no hierarchy dimension for wildcard at segment {index}")]
	UnknownDimension { index: usize },

	#[error("hierarchy dimension `{name}` has no members")]
	EmptyDimension { name: String },
}

impl DiagnosticKind {
	/// True for entries that were dropped before reaching any table.
	pub fn is_skip(&self) -> bool {
		matches!(
			self,
			DiagnosticKind::EmptyPattern
				| DiagnosticKind::EmptySegment { .. }
				| DiagnosticKind::PartialWildcard { .. }
				| DiagnosticKind::NonNumericValue { .. }
		)
	}
}

/// A finding tied to the source pattern that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
	pub pattern: String,
	#[serde(flatten)]
	pub kind: DiagnosticKind,
}

impl Diagnostic {
	pub fn new(pattern: impl Into<String>, kind: DiagnosticKind) -> Self {
		Self {
			pattern: pattern.into(),
			kind,
		}
	}
}

impl fmt::Display for Diagnostic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:?}: {}", self.pattern, self.kind)
	}
}
