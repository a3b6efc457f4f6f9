//! Plain, mutable value trees.

use indexmap::IndexMap;

/// An owned, mutable value tree.
///
/// This is both the input to [`crate::InternPool::intern`] and the output of [`crate::thaw`].
/// Mapping equality ignores entry order; set equality does not (thawed sets come back in
/// canonical order).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
	#[default]
	Null,
	Bool(bool),
	Int(i64),
	/// Integers above `i64::MAX`. Smaller values intern as [`Value::Int`].
	UInt(u64),
	Float(f64),
	Str(String),
	Seq(Vec<Value>),
	Set(Vec<Value>),
	Map(IndexMap<String, Value>),
}

impl Value {
	/// Returns the numeric payload widened to `f64`.
	pub fn as_f64(&self) -> Option<f64> {
		match *self {
			Value::Int(i) => Some(i as f64),
			Value::UInt(u) => Some(u as f64),
			Value::Float(f) => Some(f),
			_ => None,
		}
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Value::Str(s.to_owned())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Value::Str(s)
	}
}

impl From<f64> for Value {
	fn from(f: f64) -> Self {
		Value::Float(f)
	}
}

impl From<i64> for Value {
	fn from(i: i64) -> Self {
		Value::Int(i)
	}
}

impl From<u64> for Value {
	fn from(u: u64) -> Self {
		match i64::try_from(u) {
			Ok(i) => Value::Int(i),
			Err(_) => Value::UInt(u),
		}
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Value::Bool(b)
	}
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Value::Map(
			iter.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		)
	}
}

impl From<serde_json::Value> for Value {
	fn from(json: serde_json::Value) -> Self {
		match json {
			serde_json::Value::Null => Value::Null,
			serde_json::Value::Bool(b) => Value::Bool(b),
			serde_json::Value::Number(n) => match (n.as_i64(), n.as_u64()) {
				(Some(i), _) => Value::Int(i),
				(None, Some(u)) => Value::UInt(u),
				(None, None) => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
			},
			serde_json::Value::String(s) => Value::Str(s),
			serde_json::Value::Array(items) => {
				Value::Seq(items.into_iter().map(Value::from).collect())
			}
			serde_json::Value::Object(map) => Value::Map(
				map.into_iter()
					.map(|(k, v)| (k, Value::from(v)))
					.collect(),
			),
		}
	}
}

impl From<Value> for serde_json::Value {
	/// Converts back to JSON. Sets become arrays; non-finite floats become `null`, which is
	/// what JSON can represent.
	fn from(value: Value) -> Self {
		match value {
			Value::Null => serde_json::Value::Null,
			Value::Bool(b) => serde_json::Value::Bool(b),
			Value::Int(i) => serde_json::Value::from(i),
			Value::UInt(u) => serde_json::Value::from(u),
			Value::Float(f) => serde_json::Number::from_f64(f)
				.map(serde_json::Value::Number)
				.unwrap_or(serde_json::Value::Null),
			Value::Str(s) => serde_json::Value::String(s),
			Value::Seq(items) | Value::Set(items) => {
				serde_json::Value::Array(items.into_iter().map(Into::into).collect())
			}
			Value::Map(map) => serde_json::Value::Object(
				map.into_iter().map(|(k, v)| (k, v.into())).collect(),
			),
		}
	}
}
