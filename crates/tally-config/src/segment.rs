// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The `[segment]` configuration section.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;

pub const DEFAULT_ENDPOINT: &str = "https://api.segment.io";
pub const DEFAULT_FLUSH_QUEUE_SIZE: usize = 250;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_PROBE_SLEEP: Duration = Duration::from_millis(10);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
/// Lower bound for intervals and timeouts set in code rather than parsed.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Placeholder printed instead of secret values.
pub const REDACTED: &str = "[REDACTED]";

/// A Segment write key. Never printed by `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
	pub fn new(key: impl Into<String>) -> Self {
		Self(key.into())
	}

	/// Returns the raw key for use in request authentication.
	pub fn expose(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Debug for ApiKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("ApiKey").field(&REDACTED).finish()
	}
}

impl std::fmt::Display for ApiKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(REDACTED)
	}
}

/// How `flush()` behaves once the send queue has been told to flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushMode {
	/// Return right after requesting the flush.
	#[default]
	Async,
	/// Also wait until the network executor has drained pending uploads.
	///
	/// Meant for short-lived processes (serverless functions, CLI runs) that
	/// would otherwise exit before delivery completes.
	Blocking,
}

impl FlushMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			FlushMode::Async => "async",
			FlushMode::Blocking => "blocking",
		}
	}
}

impl std::fmt::Display for FlushMode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for FlushMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"async" => Ok(FlushMode::Async),
			"blocking" => Ok(FlushMode::Blocking),
			_ => Err(format!("invalid flush mode: {s}")),
		}
	}
}

/// Partially specified `[segment]` section, as read from one source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SegmentConfigLayer {
	pub api_key: Option<String>,
	/// Default message options. Deprecated: prefer message transformers.
	pub options: Option<Map<String, Value>>,
	pub endpoint: Option<String>,
	pub flush_queue_size: Option<usize>,
	pub flush_interval_secs: Option<u64>,
	pub request_timeout_secs: Option<u64>,
	pub flush_mode: Option<FlushMode>,
	pub probe_sleep_ms: Option<u64>,
	pub probe_timeout_secs: Option<u64>,
}

impl SegmentConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.api_key.is_some() {
			self.api_key = other.api_key;
		}
		if other.options.is_some() {
			self.options = other.options;
		}
		if other.endpoint.is_some() {
			self.endpoint = other.endpoint;
		}
		if other.flush_queue_size.is_some() {
			self.flush_queue_size = other.flush_queue_size;
		}
		if other.flush_interval_secs.is_some() {
			self.flush_interval_secs = other.flush_interval_secs;
		}
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
		if other.flush_mode.is_some() {
			self.flush_mode = other.flush_mode;
		}
		if other.probe_sleep_ms.is_some() {
			self.probe_sleep_ms = other.probe_sleep_ms;
		}
		if other.probe_timeout_secs.is_some() {
			self.probe_timeout_secs = other.probe_timeout_secs;
		}
	}

	/// Resolves the layer. Returns `Ok(None)` when no usable API key is set,
	/// which leaves the adapter inactive.
	pub fn finalize(self) -> Result<Option<SegmentConfig>, ConfigError> {
		let Some(api_key) = self.api_key.filter(|k| !k.trim().is_empty()) else {
			return Ok(None);
		};

		let endpoint = self
			.endpoint
			.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
			.trim_end_matches('/')
			.to_string();
		if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
			return Err(ConfigError::InvalidValue {
				key: "segment.endpoint".to_string(),
				message: format!("'{endpoint}' is not an http(s) URL"),
			});
		}

		let flush_queue_size = self.flush_queue_size.unwrap_or(DEFAULT_FLUSH_QUEUE_SIZE);
		if flush_queue_size == 0 {
			return Err(ConfigError::Validation(
				"segment.flush_queue_size must be greater than zero".to_string(),
			));
		}

		let flush_interval = self
			.flush_interval_secs
			.map(Duration::from_secs)
			.unwrap_or(DEFAULT_FLUSH_INTERVAL);
		if flush_interval.is_zero() {
			return Err(ConfigError::Validation(
				"segment.flush_interval_secs must be greater than zero".to_string(),
			));
		}

		let request_timeout = self
			.request_timeout_secs
			.map(Duration::from_secs)
			.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
		if request_timeout.is_zero() {
			return Err(ConfigError::Validation(
				"segment.request_timeout_secs must be greater than zero".to_string(),
			));
		}

		let probe_timeout = self
			.probe_timeout_secs
			.map(Duration::from_secs)
			.unwrap_or(DEFAULT_PROBE_TIMEOUT);
		if probe_timeout.is_zero() {
			return Err(ConfigError::Validation(
				"segment.probe_timeout_secs must be greater than zero".to_string(),
			));
		}

		Ok(Some(SegmentConfig {
			api_key: ApiKey::new(api_key.trim()),
			options: normalize_option_keys(self.options.unwrap_or_default()),
			endpoint,
			flush_queue_size,
			flush_interval,
			request_timeout,
			flush_mode: self.flush_mode.unwrap_or_default(),
			probe_sleep: self
				.probe_sleep_ms
				.map(Duration::from_millis)
				.unwrap_or(DEFAULT_PROBE_SLEEP),
			probe_timeout,
		}))
	}
}

/// Resolved `[segment]` configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentConfig {
	pub api_key: ApiKey,
	/// Default message options applied before every call's own configuration.
	/// Deprecated: prefer message transformers.
	pub options: Map<String, Value>,
	pub endpoint: String,
	pub flush_queue_size: usize,
	pub flush_interval: Duration,
	pub request_timeout: Duration,
	pub flush_mode: FlushMode,
	/// Pause before the blocking flush probe is submitted, so a batch that
	/// was just enqueued is picked up by the looper first.
	pub probe_sleep: Duration,
	pub probe_timeout: Duration,
}

impl SegmentConfig {
	/// Creates a configuration with defaults for everything but the key.
	pub fn new(api_key: impl Into<String>) -> Self {
		Self {
			api_key: ApiKey::new(api_key),
			options: Map::new(),
			endpoint: DEFAULT_ENDPOINT.to_string(),
			flush_queue_size: DEFAULT_FLUSH_QUEUE_SIZE,
			flush_interval: DEFAULT_FLUSH_INTERVAL,
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			flush_mode: FlushMode::default(),
			probe_sleep: DEFAULT_PROBE_SLEEP,
			probe_timeout: DEFAULT_PROBE_TIMEOUT,
		}
	}

	pub fn with_options(mut self, options: Map<String, Value>) -> Self {
		self.options = normalize_option_keys(options);
		self
	}

	pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.endpoint = endpoint.into().trim_end_matches('/').to_string();
		self
	}

	pub fn with_flush_mode(mut self, mode: FlushMode) -> Self {
		self.flush_mode = mode;
		self
	}

	pub fn with_flush_queue_size(mut self, size: usize) -> Self {
		self.flush_queue_size = size.max(1);
		self
	}

	pub fn with_flush_interval(mut self, interval: Duration) -> Self {
		self.flush_interval = interval.max(MIN_INTERVAL);
		self
	}

	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout.max(MIN_INTERVAL);
		self
	}

	pub fn with_probe(mut self, sleep: Duration, timeout: Duration) -> Self {
		self.probe_sleep = sleep;
		self.probe_timeout = timeout;
		self
	}
}

/// Rewrites kebab-case option keys (`user-agent`) to camelCase (`userAgent`).
///
/// Only top-level keys are touched; nested integration option maps are
/// passed through as written.
pub fn normalize_option_keys(options: Map<String, Value>) -> Map<String, Value> {
	options
		.into_iter()
		.map(|(key, value)| (kebab_to_camel(&key), value))
		.collect()
}

fn kebab_to_camel(key: &str) -> String {
	let mut out = String::with_capacity(key.len());
	let mut upper_next = false;
	for c in key.chars() {
		if c == '-' {
			upper_next = !out.is_empty();
			continue;
		}
		if upper_next {
			out.extend(c.to_uppercase());
			upper_next = false;
		} else {
			out.push(c);
		}
	}
	out
}
