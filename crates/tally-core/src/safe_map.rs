// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Null stripping for JSON objects.
//!
//! Every map that ends up inside a [`Message`](crate::Message) passes through
//! [`safe`] first, so a materialized message never carries `null` values.

use serde_json::{Map, Value};

/// Returns a copy of `original` without null entries.
///
/// Nested objects are sanitized recursively. Arrays are kept as they are.
/// A missing map yields an empty one.
pub fn safe(original: Option<&Map<String, Value>>) -> Map<String, Value> {
	let Some(original) = original else {
		return Map::new();
	};

	original
		.iter()
		.filter(|(_, value)| !value.is_null())
		.map(|(key, value)| (key.clone(), safe_value(value.clone())))
		.collect()
}

/// Sanitizes a single value: objects lose their null entries, anything else
/// is returned unchanged.
pub fn safe_value(value: Value) -> Value {
	match value {
		Value::Object(map) => Value::Object(safe(Some(&map))),
		other => other,
	}
}
