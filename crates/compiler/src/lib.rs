//! Wildcard service map compiler.
//!
//! # Purpose
//!
//! Turns an ordered map of dotted service patterns (`edge.*.gateway`, `service-hub.*`, exact
//! names, irregular wildcard shapes) plus a [`Hierarchy`] of regions and prefectures into a
//! [`CompiledIndex`] answering "service name → weight" in constant time per table probe.
//!
//! # Mental Model
//!
//! 1. **Classify:** every pattern is parsed once into a [`PatternShape`].
//! 2. **Route:** exact keys go to the direct table; two- and three-part wildcards are expanded
//!    against the hierarchy into per-shape component buckets; anything else is kept as a generic
//!    fallback matched lazily.
//! 3. **Intern:** the direct table and every bucket go through a shared
//!    [`svcmap_intern::InternPool`], so identical buckets are one allocation.
//! 4. **Query or render:** use the index in-process, or [`codegen::render`] it as a standalone
//!    Rust module.
//!
//! # Invariants
//!
//! - Later entries win over earlier ones for the same concrete key, across tables.
//!   - Enforced in: [`Compiler::compile`].
//!   - Tested by: `compiler::tests::later_literal_overrides_wildcard`.
//! - Compilation never fails; malformed entries become [`Diagnostic`]s.
//!   - Tested by: `compiler::tests::malformed_entries_are_skipped_and_counted`.
//! - Generated modules answer like the index they were rendered from.
//!   - Tested by: `codegen::tests::generated_queries_agree_with_index`.

pub mod codegen;
pub mod compiler;
pub mod diagnostic;
pub mod expand;
pub mod fingerprint;
pub mod hierarchy;
pub mod index;
pub mod pattern;
pub mod service_map;

pub use compiler::{CompileOptions, Compiler, compile};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use expand::{Expansion, expand, expand_all, expand_pattern};
pub use fingerprint::fingerprint;
pub use hierarchy::Hierarchy;
pub use index::{CompilationStats, CompiledIndex, FoundIn, Glob, ServiceInfo, ServiceMetadata};
pub use pattern::{Pattern, PatternShape};
pub use service_map::ServiceMap;

#[cfg(test)]
use criterion as _;
