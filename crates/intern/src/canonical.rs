//! Canonical (frozen, shared) value nodes.
//!
//! # Role
//!
//! This module defines the read-only node representation stored in the pool, its content hash,
//! and the comparisons the pool relies on. It contains no pooling logic.

use std::cmp::Ordering;
use std::hash::Hasher;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHasher;

use crate::Value;

const TAG_NULL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_UINT: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_STR: u8 = 5;
const TAG_SEQ: u8 = 6;
const TAG_SET: u8 = 7;
const TAG_MAP: u8 = 8;

/// A frozen node. Children are themselves canonical.
#[derive(Debug)]
pub enum Node {
	Null,
	Bool(bool),
	Int(i64),
	/// Always above `i64::MAX`, so it sorts after every `Int`.
	UInt(u64),
	Float(f64),
	Str(Arc<str>),
	Seq(Box<[Canonical]>),
	/// Sorted by [`Canonical::total_cmp`], no duplicates.
	Set(Box<[Canonical]>),
	/// Sorted by key, no duplicate keys.
	Map(Box<[(Arc<str>, Canonical)]>),
}

impl Node {
	fn tag(&self) -> u8 {
		match self {
			Node::Null => TAG_NULL,
			Node::Bool(_) => TAG_BOOL,
			Node::Int(_) => TAG_INT,
			Node::UInt(_) => TAG_UINT,
			Node::Float(_) => TAG_FLOAT,
			Node::Str(_) => TAG_STR,
			Node::Seq(_) => TAG_SEQ,
			Node::Set(_) => TAG_SET,
			Node::Map(_) => TAG_MAP,
		}
	}

	/// Scalars the pool does not store; they are rebuilt on every intern.
	pub fn is_passthrough(&self) -> bool {
		matches!(self, Node::Null | Node::Bool(_) | Node::Int(_) | Node::UInt(_))
	}

	/// Merkle hash over the tag, scalar payload, and child hashes.
	pub(crate) fn content_hash(&self) -> u64 {
		let mut h = FxHasher::default();
		h.write_u8(self.tag());
		match self {
			Node::Null => {}
			Node::Bool(b) => h.write_u8(*b as u8),
			Node::Int(i) => h.write_i64(*i),
			Node::UInt(u) => h.write_u64(*u),
			Node::Float(f) => h.write_u64(f.to_bits()),
			Node::Str(s) => write_str(&mut h, s),
			Node::Seq(items) | Node::Set(items) => {
				h.write_usize(items.len());
				for item in items.iter() {
					h.write_u64(item.content_hash());
				}
			}
			Node::Map(entries) => {
				h.write_usize(entries.len());
				for (k, v) in entries.iter() {
					write_str(&mut h, k);
					h.write_u64(v.content_hash());
				}
			}
		}
		h.finish()
	}

	/// Compares two nodes whose children are canonical, without recursing.
	pub(crate) fn shallow_eq(&self, other: &Node) -> bool {
		match (self, other) {
			(Node::Null, Node::Null) => true,
			(Node::Bool(a), Node::Bool(b)) => a == b,
			(Node::Int(a), Node::Int(b)) => a == b,
			(Node::UInt(a), Node::UInt(b)) => a == b,
			(Node::Float(a), Node::Float(b)) => a.to_bits() == b.to_bits(),
			(Node::Str(a), Node::Str(b)) => a == b,
			(Node::Seq(a), Node::Seq(b)) | (Node::Set(a), Node::Set(b)) => {
				a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.same_child(y))
			}
			(Node::Map(a), Node::Map(b)) => {
				a.len() == b.len()
					&& a.iter()
						.zip(b.iter())
						.all(|((ka, va), (kb, vb))| ka == kb && va.same_child(vb))
			}
			_ => false,
		}
	}
}

/// Hash of a string node, computable without allocating the node.
pub(crate) fn str_hash(s: &str) -> u64 {
	let mut h = FxHasher::default();
	h.write_u8(TAG_STR);
	write_str(&mut h, s);
	h.finish()
}

fn write_str(h: &mut FxHasher, s: &str) {
	h.write_usize(s.len());
	h.write(s.as_bytes());
}

struct Entry {
	hash: u64,
	node: Node,
}

/// Shared handle to a canonical node.
///
/// Cloning is an `Arc` clone. Two handles produced by the same pool for structurally equal
/// input satisfy [`Canonical::ptr_eq`].
#[derive(Clone)]
pub struct Canonical(Arc<Entry>);

impl Canonical {
	pub(crate) fn new(node: Node) -> Self {
		let hash = node.content_hash();
		Self::with_hash(node, hash)
	}

	pub(crate) fn with_hash(node: Node, hash: u64) -> Self {
		Self(Arc::new(Entry { hash, node }))
	}

	/// Returns the frozen node.
	pub fn node(&self) -> &Node {
		&self.0.node
	}

	/// Returns the content hash used as the pool key.
	pub fn content_hash(&self) -> u64 {
		self.0.hash
	}

	/// Returns true if both handles point at the same stored instance.
	pub fn ptr_eq(a: &Canonical, b: &Canonical) -> bool {
		Arc::ptr_eq(&a.0, &b.0)
	}

	/// Identity for pooled children, value equality for passthrough scalars.
	fn same_child(&self, other: &Canonical) -> bool {
		Canonical::ptr_eq(self, other)
			|| (self.0.hash == other.0.hash
				&& self.node().is_passthrough()
				&& self.node().shallow_eq(other.node()))
	}

	pub fn as_str(&self) -> Option<&str> {
		match self.node() {
			Node::Str(s) => Some(s),
			_ => None,
		}
	}

	/// Returns numeric payloads widened to `f64`.
	pub fn as_f64(&self) -> Option<f64> {
		match *self.node() {
			Node::Float(f) => Some(f),
			Node::Int(i) => Some(i as f64),
			Node::UInt(u) => Some(u as f64),
			_ => None,
		}
	}

	/// Returns the sorted entries of a mapping node.
	pub fn map_entries(&self) -> Option<&[(Arc<str>, Canonical)]> {
		match self.node() {
			Node::Map(entries) => Some(entries),
			_ => None,
		}
	}

	/// Looks up `key` in a mapping node by binary search.
	pub fn get(&self, key: &str) -> Option<&Canonical> {
		let entries = self.map_entries()?;
		entries
			.binary_search_by(|(k, _)| k.as_ref().cmp(key))
			.ok()
			.map(|i| &entries[i].1)
	}

	/// Number of children for containers, 0 for scalars.
	pub fn len(&self) -> usize {
		match self.node() {
			Node::Seq(items) | Node::Set(items) => items.len(),
			Node::Map(entries) => entries.len(),
			_ => 0,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Total order used to sort set members: by kind, then by payload.
	pub fn total_cmp(&self, other: &Canonical) -> Ordering {
		if Canonical::ptr_eq(self, other) {
			return Ordering::Equal;
		}
		let (a, b) = (self.node(), other.node());
		a.tag().cmp(&b.tag()).then_with(|| match (a, b) {
			(Node::Bool(x), Node::Bool(y)) => x.cmp(y),
			(Node::Int(x), Node::Int(y)) => x.cmp(y),
			(Node::UInt(x), Node::UInt(y)) => x.cmp(y),
			(Node::Float(x), Node::Float(y)) => x.total_cmp(y),
			(Node::Str(x), Node::Str(y)) => x.cmp(y),
			(Node::Seq(x), Node::Seq(y)) | (Node::Set(x), Node::Set(y)) => x
				.iter()
				.zip(y.iter())
				.map(|(p, q)| p.total_cmp(q))
				.find(|o| o.is_ne())
				.unwrap_or_else(|| x.len().cmp(&y.len())),
			(Node::Map(x), Node::Map(y)) => x
				.iter()
				.zip(y.iter())
				.map(|((kp, vp), (kq, vq))| kp.cmp(kq).then_with(|| vp.total_cmp(vq)))
				.find(|o| o.is_ne())
				.unwrap_or_else(|| x.len().cmp(&y.len())),
			_ => Ordering::Equal,
		})
	}

	/// Produces a plain mutable copy of this tree.
	pub fn thaw(&self) -> Value {
		match self.node() {
			Node::Null => Value::Null,
			Node::Bool(b) => Value::Bool(*b),
			Node::Int(i) => Value::Int(*i),
			Node::UInt(u) => Value::UInt(*u),
			Node::Float(f) => Value::Float(*f),
			Node::Str(s) => Value::Str(s.to_string()),
			Node::Seq(items) => Value::Seq(items.iter().map(Canonical::thaw).collect()),
			Node::Set(items) => Value::Set(items.iter().map(Canonical::thaw).collect()),
			Node::Map(entries) => Value::Map(
				entries
					.iter()
					.map(|(k, v)| (k.to_string(), v.thaw()))
					.collect::<IndexMap<_, _>>(),
			),
		}
	}
}

/// Produces a plain mutable copy of a canonical tree.
pub fn thaw(canonical: &Canonical) -> Value {
	canonical.thaw()
}

impl PartialEq for Canonical {
	/// Structural equality; identical handles short-circuit.
	fn eq(&self, other: &Self) -> bool {
		if Canonical::ptr_eq(self, other) {
			return true;
		}
		if self.0.hash != other.0.hash {
			return false;
		}
		match (self.node(), other.node()) {
			(Node::Seq(a), Node::Seq(b)) | (Node::Set(a), Node::Set(b)) => a == b,
			(Node::Map(a), Node::Map(b)) => a == b,
			(a, b) => a.shallow_eq(b),
		}
	}
}

impl std::fmt::Debug for Canonical {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.node().fmt(f)
	}
}
