//! The hash-consing pool.
//!
//! # Role
//!
//! Maps content hashes to stored canonical instances. Owns the normalization rules (key
//! sorting, set ordering, float quantization) and the insert-if-absent discipline.
//!
//! # Concurrency
//!
//! - **Reads:** shard read lock; many interners can probe the same shard at once.
//! - **Inserts:** shard write lock with a re-check under the lock, so two threads racing on the
//!   same content store exactly one instance.
//!
//! # Lifetime
//!
//! The pool never evicts. It is an ordinary value: scope it to a compilation session, or share
//! it behind an `Arc` across sessions and drop it (or call [`InternPool::clear`]) when done.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::canonical::{Canonical, Node, str_hash};
use crate::stats::{Counters, InternStats};
use crate::Value;

const SHARD_COUNT: usize = 16;
const SHARD_SHIFT: u32 = 64 - SHARD_COUNT.trailing_zeros();

/// Canonical instances sharing one content hash. Almost always a single entry.
type Bucket = SmallVec<[Canonical; 1]>;
type Shard = FxHashMap<u64, Bucket>;

/// Content-addressed store of canonical instances.
pub struct InternPool {
	shards: Box<[RwLock<Shard>]>,
	counters: Option<Counters>,
}

impl Default for InternPool {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for InternPool {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("InternPool")
			.field("len", &self.len())
			.field("stats", &self.counters.is_some())
			.finish()
	}
}

/// Types that can be canonicalized by an [`InternPool`].
pub trait Internable {
	fn intern_into(&self, pool: &InternPool, qfloat: Option<f64>) -> Canonical;
}

impl Internable for Value {
	fn intern_into(&self, pool: &InternPool, qfloat: Option<f64>) -> Canonical {
		pool.canonicalize(self, qfloat)
	}
}

impl Internable for Canonical {
	fn intern_into(&self, pool: &InternPool, qfloat: Option<f64>) -> Canonical {
		pool.reintern(self, qfloat)
	}
}

impl Internable for serde_json::Value {
	fn intern_into(&self, pool: &InternPool, qfloat: Option<f64>) -> Canonical {
		pool.canonicalize(&Value::from(self.clone()), qfloat)
	}
}

impl Internable for str {
	fn intern_into(&self, pool: &InternPool, _qfloat: Option<f64>) -> Canonical {
		pool.string(self)
	}
}

/// Rounds `x` to the nearest multiple of `q`.
///
/// Zero, non-finite `x`, and non-positive or non-finite `q` are returned unchanged.
pub fn quantize(x: f64, q: f64) -> f64 {
	if x == 0.0 || !x.is_finite() || !(q > 0.0 && q.is_finite()) {
		return x;
	}
	let rounded = (x / q).round() * q;
	if rounded.is_finite() { rounded } else { x }
}

/// Quantizes, folds `-0.0` into `0.0`, and collapses NaN payloads.
fn normalize_float(x: f64, qfloat: Option<f64>) -> f64 {
	let x = match qfloat {
		Some(q) => quantize(x, q),
		None => x,
	};
	if x == 0.0 {
		0.0
	} else if x.is_nan() {
		f64::NAN
	} else {
		x
	}
}

/// A value about to be looked up, in whatever form avoids allocating on a hit.
enum Pending<'a> {
	Str(&'a str),
	Node(Node),
	Existing(&'a Canonical),
}

impl Pending<'_> {
	fn matches(&self, stored: &Node) -> bool {
		match self {
			Pending::Str(s) => matches!(stored, Node::Str(x) if x.as_ref() == *s),
			Pending::Node(node) => node.shallow_eq(stored),
			Pending::Existing(c) => c.node().shallow_eq(stored),
		}
	}

	fn materialize(self, hash: u64) -> Canonical {
		match self {
			Pending::Str(s) => Canonical::with_hash(Node::Str(Arc::from(s)), hash),
			Pending::Node(node) => Canonical::with_hash(node, hash),
			Pending::Existing(c) => c.clone(),
		}
	}
}

impl InternPool {
	/// Creates an empty pool without statistics.
	pub fn new() -> Self {
		Self {
			shards: (0..SHARD_COUNT).map(|_| RwLock::new(Shard::default())).collect(),
			counters: None,
		}
	}

	/// Creates an empty pool that keeps node/hit/miss counters.
	pub fn with_stats() -> Self {
		Self {
			counters: Some(Counters::default()),
			..Self::new()
		}
	}

	/// Returns the canonical instance for `value`.
	///
	/// With `qfloat = Some(q)`, every non-zero finite float is rounded to a multiple of `q`
	/// before hashing, so near-equal values collapse onto one instance.
	pub fn intern<T: Internable + ?Sized>(&self, value: &T, qfloat: Option<f64>) -> Canonical {
		value.intern_into(self, qfloat)
	}

	/// Interns a string and returns its shared allocation.
	pub fn intern_str(&self, s: &str) -> Arc<str> {
		match self.string(s).node() {
			Node::Str(shared) => shared.clone(),
			_ => unreachable!("string interned as non-string node"),
		}
	}

	/// Number of stored instances.
	pub fn len(&self) -> usize {
		self.shards
			.iter()
			.map(|s| s.read().values().map(SmallVec::len).sum::<usize>())
			.sum()
	}

	pub fn is_empty(&self) -> bool {
		self.shards.iter().all(|s| s.read().is_empty())
	}

	/// Returns the counters, or `None` if the pool was built without statistics.
	pub fn stats(&self) -> Option<InternStats> {
		self.counters
			.as_ref()
			.map(|c| c.snapshot(self.len() as u64))
	}

	/// Drops every stored instance and resets the counters.
	///
	/// Handles already given out stay valid; they just stop being shared with future interns.
	pub fn clear(&self) {
		let dropped = self.len();
		for shard in self.shards.iter() {
			shard.write().clear();
		}
		if let Some(c) = &self.counters {
			c.reset();
		}
		tracing::debug!(dropped, "cleared intern pool");
	}

	#[inline]
	fn shard(&self, hash: u64) -> &RwLock<Shard> {
		&self.shards[(hash >> SHARD_SHIFT) as usize]
	}

	#[inline]
	fn count_node(&self) {
		if let Some(c) = &self.counters {
			c.node();
		}
	}

	fn lookup_or_insert(&self, hash: u64, pending: Pending<'_>) -> Canonical {
		let shard = self.shard(hash);
		let found = shard
			.read()
			.get(&hash)
			.and_then(|b| b.iter().find(|c| pending.matches(c.node())).cloned());
		if let Some(found) = found {
			if let Some(c) = &self.counters {
				c.hit();
			}
			return found;
		}

		let mut guard = shard.write();
		let bucket = guard.entry(hash).or_default();
		if let Some(found) = bucket.iter().find(|c| pending.matches(c.node())) {
			if let Some(c) = &self.counters {
				c.hit();
			}
			return found.clone();
		}
		let canonical = pending.materialize(hash);
		bucket.push(canonical.clone());
		if let Some(c) = &self.counters {
			c.miss();
		}
		canonical
	}

	fn insert_node(&self, node: Node) -> Canonical {
		let hash = node.content_hash();
		self.lookup_or_insert(hash, Pending::Node(node))
	}

	fn adopt(&self, existing: &Canonical) -> Canonical {
		self.lookup_or_insert(existing.content_hash(), Pending::Existing(existing))
	}

	fn string(&self, s: &str) -> Canonical {
		self.count_node();
		self.lookup_or_insert(str_hash(s), Pending::Str(s))
	}

	fn float(&self, x: f64, qfloat: Option<f64>) -> Canonical {
		self.insert_node(Node::Float(normalize_float(x, qfloat)))
	}

	fn set(&self, mut items: Vec<Canonical>) -> Canonical {
		items.sort_by(Canonical::total_cmp);
		items.dedup_by(|a, b| a.total_cmp(b).is_eq());
		self.insert_node(Node::Set(items.into_boxed_slice()))
	}

	fn map(&self, mut entries: Vec<(Arc<str>, Canonical)>) -> Canonical {
		entries.sort_by(|a, b| a.0.cmp(&b.0));
		self.insert_node(Node::Map(entries.into_boxed_slice()))
	}

	fn canonicalize(&self, value: &Value, qfloat: Option<f64>) -> Canonical {
		match value {
			Value::Null => self.passthrough(Node::Null),
			Value::Bool(b) => self.passthrough(Node::Bool(*b)),
			Value::Int(i) => self.passthrough(Node::Int(*i)),
			Value::UInt(u) => self.passthrough(match i64::try_from(*u) {
				Ok(i) => Node::Int(i),
				Err(_) => Node::UInt(*u),
			}),
			Value::Float(x) => {
				self.count_node();
				self.float(*x, qfloat)
			}
			Value::Str(s) => self.string(s),
			Value::Seq(items) => {
				self.count_node();
				let children = items
					.iter()
					.map(|v| self.canonicalize(v, qfloat))
					.collect();
				self.insert_node(Node::Seq(children))
			}
			Value::Set(items) => {
				self.count_node();
				let children = items
					.iter()
					.map(|v| self.canonicalize(v, qfloat))
					.collect();
				self.set(children)
			}
			Value::Map(map) => {
				self.count_node();
				let entries = map
					.iter()
					.map(|(k, v)| (self.intern_str(k), self.canonicalize(v, qfloat)))
					.collect();
				self.map(entries)
			}
		}
	}

	fn passthrough(&self, node: Node) -> Canonical {
		self.count_node();
		Canonical::new(node)
	}

	/// Re-interns an existing canonical tree, adopting its instances where this pool has none.
	fn reintern(&self, c: &Canonical, qfloat: Option<f64>) -> Canonical {
		self.count_node();
		match c.node() {
			Node::Null | Node::Bool(_) | Node::Int(_) | Node::UInt(_) => c.clone(),
			Node::Str(_) => self.adopt(c),
			Node::Float(x) => {
				let normalized = normalize_float(*x, qfloat);
				if normalized.to_bits() == x.to_bits() {
					self.adopt(c)
				} else {
					self.insert_node(Node::Float(normalized))
				}
			}
			Node::Seq(items) => {
				let children: Vec<_> = items.iter().map(|i| self.reintern(i, qfloat)).collect();
				if same_children(items, &children) {
					self.adopt(c)
				} else {
					self.insert_node(Node::Seq(children.into_boxed_slice()))
				}
			}
			Node::Set(items) => {
				let children: Vec<_> = items.iter().map(|i| self.reintern(i, qfloat)).collect();
				if same_children(items, &children) {
					self.adopt(c)
				} else {
					self.set(children)
				}
			}
			Node::Map(entries) => {
				let rebuilt: Vec<(Arc<str>, Canonical)> = entries
					.iter()
					.map(|(k, v)| (self.intern_str(k), self.reintern(v, qfloat)))
					.collect();
				let unchanged = entries
					.iter()
					.zip(&rebuilt)
					.all(|((ka, va), (kb, vb))| Arc::ptr_eq(ka, kb) && Canonical::ptr_eq(va, vb));
				if unchanged {
					self.adopt(c)
				} else {
					self.map(rebuilt)
				}
			}
		}
	}
}

fn same_children(old: &[Canonical], new: &[Canonical]) -> bool {
	old.iter().zip(new).all(|(a, b)| Canonical::ptr_eq(a, b))
}
