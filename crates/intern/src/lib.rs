//! Hash-consing for immutable value trees.
//!
//! # Purpose
//!
//! [`InternPool`] canonicalizes scalar/mapping/sequence/set trees so that structurally equal
//! values share a single physical instance. The pool knows nothing about the domain of the
//! values it stores; callers feed it plain [`Value`] trees (or JSON documents) and get back
//! [`Canonical`] handles.
//!
//! # Mental Model
//!
//! 1. **Normalize:** Mappings are sorted by key, sets are sorted and deduplicated, floats are
//!    optionally quantized.
//! 2. **Hash:** Every node gets a Merkle hash computed from its tag, its scalar payload, and the
//!    hashes of its (already canonical) children.
//! 3. **Lookup-or-insert:** The pool returns the stored node for that hash if one is
//!    structurally equal, otherwise it stores the new node.
//!
//! # Invariants
//!
//! - Structurally equal normalized inputs intern to the same `Arc`.
//!   - Enforced in: [`pool::InternPool::intern`].
//!   - Tested by: `pool::tests::test_key_order_does_not_matter`.
//! - Re-interning a canonical value returns the same `Arc`.
//!   - Enforced in: [`pool::Internable`] for [`Canonical`].
//!   - Tested by: `pool::tests::idempotent_intern`.
//! - [`thaw`] inverts interning for unquantized input.
//!   - Tested by: `pool::tests::thaw_round_trip`.

pub mod canonical;
pub mod pool;
pub mod stats;
pub mod value;

pub use canonical::{Canonical, Node, thaw};
pub use pool::{InternPool, Internable, quantize};
pub use stats::InternStats;
pub use value::Value;
