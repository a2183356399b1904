// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: TOML files and environment variables.
//!
//! Built-in defaults are not a source; they fill the gaps in
//! [`SegmentConfigLayer::finalize`].

use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::TallyConfigLayer;
use crate::segment::{FlushMode, SegmentConfigLayer};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<TallyConfigLayer, ConfigError>;
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/tally/tally.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<TallyConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(TallyConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: TallyConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: TALLY_SEGMENT_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<TallyConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(TallyConfigLayer {
			segment: Some(load_segment_from(|name| std::env::var(name).ok())?),
		})
	}
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
	lookup(name).filter(|s| !s.is_empty())
}

fn parsed<T: std::str::FromStr>(
	lookup: &impl Fn(&str) -> Option<String>,
	name: &str,
	type_name: &str,
) -> Result<Option<T>, ConfigError> {
	match non_empty(lookup, name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid {type_name} value '{v}'"),
		}),
		None => Ok(None),
	}
}

/// Reads the `[segment]` section through `lookup`, which maps a variable
/// name to its value.
pub(crate) fn load_segment_from(
	lookup: impl Fn(&str) -> Option<String>,
) -> Result<SegmentConfigLayer, ConfigError> {
	let options = match non_empty(&lookup, "TALLY_SEGMENT_OPTIONS") {
		Some(raw) => match serde_json::from_str::<Value>(&raw) {
			Ok(Value::Object(map)) => Some(map),
			_ => {
				return Err(ConfigError::InvalidValue {
					key: "TALLY_SEGMENT_OPTIONS".to_string(),
					message: "expected a JSON object".to_string(),
				})
			}
		},
		None => None,
	};

	let flush_mode = match non_empty(&lookup, "TALLY_SEGMENT_FLUSH_MODE") {
		Some(v) => Some(v.parse::<FlushMode>().map_err(|message| {
			ConfigError::InvalidValue {
				key: "TALLY_SEGMENT_FLUSH_MODE".to_string(),
				message,
			}
		})?),
		None => None,
	};

	Ok(SegmentConfigLayer {
		api_key: non_empty(&lookup, "TALLY_SEGMENT_API_KEY"),
		options,
		endpoint: non_empty(&lookup, "TALLY_SEGMENT_ENDPOINT"),
		flush_queue_size: parsed(&lookup, "TALLY_SEGMENT_FLUSH_QUEUE_SIZE", "usize")?,
		flush_interval_secs: parsed(&lookup, "TALLY_SEGMENT_FLUSH_INTERVAL_SECS", "u64")?,
		request_timeout_secs: parsed(&lookup, "TALLY_SEGMENT_REQUEST_TIMEOUT_SECS", "u64")?,
		flush_mode,
		probe_sleep_ms: parsed(&lookup, "TALLY_SEGMENT_PROBE_SLEEP_MS", "u64")?,
		probe_timeout_secs: parsed(&lookup, "TALLY_SEGMENT_PROBE_TIMEOUT_SECS", "u64")?,
	})
}
