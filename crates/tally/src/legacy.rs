// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Translation of flat option maps onto builder calls.
//!
//! Older call sites pass options as a single map instead of configuring the
//! builder directly. Only these keys are understood:
//!
//! - `anonymousId`: sets the anonymous id
//! - `integrations`: map of integration name to `bool` (enable flag) or
//!   object (integration options)
//! - [`SUPPORTED_CONTEXT_OPTIONS`]: copied into the message context
//!
//! Anything else is ignored.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tally_core::JsonMap;
use tracing::trace;

use crate::builder::MessageBuilder;

/// Option keys copied verbatim into the message context.
pub const SUPPORTED_CONTEXT_OPTIONS: [&str; 4] = ["ip", "language", "userAgent", "Intercom"];

pub const ANONYMOUS_ID_OPTION: &str = "anonymousId";
pub const INTEGRATIONS_OPTION: &str = "integrations";

/// Applies a legacy option map and optional timestamp to `builder`.
pub fn apply_legacy_options<B: MessageBuilder>(
	mut builder: B,
	options: &JsonMap,
	timestamp: Option<DateTime<Utc>>,
) -> B {
	builder = builder.timestamp(timestamp);

	match options.get(ANONYMOUS_ID_OPTION) {
		Some(Value::String(id)) => builder = builder.anonymous_id(id.clone()),
		Some(Value::Null) | None => {}
		Some(other) => builder = builder.anonymous_id(other.to_string()),
	}

	if let Some(Value::Object(integrations)) = options.get(INTEGRATIONS_OPTION) {
		for (name, setting) in integrations {
			match setting {
				Value::Bool(enabled) => builder = builder.enable_integration(name.clone(), *enabled),
				Value::Object(integration_options) => {
					builder = builder.integration_options(name.clone(), integration_options.clone())
				}
				_ => trace!(integration = %name, "ignoring unsupported integration setting"),
			}
		}
	}

	for key in SUPPORTED_CONTEXT_OPTIONS {
		if let Some(value) = options.get(key) {
			builder = builder.context(key, value.clone());
		}
	}

	builder
}
