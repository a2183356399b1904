// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Tally analytics adapter.
//!
//! This crate provides:
//! - Layered configuration from a TOML file and the environment, over built-in defaults
//! - The `[segment]` section holding the write key and default message options
//! - Consistent environment variable naming (`TALLY_SEGMENT_*`)
//!
//! A missing or blank API key is not an error: loading succeeds with no
//! [`SegmentConfig`], and callers fall back to the no-op service.
//!
//! # Usage
//!
//! ```ignore
//! use tally_config::load_config;
//!
//! match load_config()?.segment {
//!     Some(segment) => println!("sending to {}", segment.endpoint),
//!     None => println!("analytics disabled"),
//! }
//! ```

pub mod error;
pub mod layer;
pub mod segment;
pub mod sources;

pub use error::ConfigError;
pub use layer::TallyConfigLayer;
pub use segment::{
	normalize_option_keys, ApiKey, FlushMode, SegmentConfig, SegmentConfigLayer, DEFAULT_ENDPOINT,
	DEFAULT_FLUSH_INTERVAL, DEFAULT_FLUSH_QUEUE_SIZE, DEFAULT_PROBE_SLEEP, DEFAULT_PROBE_TIMEOUT,
	DEFAULT_REQUEST_TIMEOUT, MIN_INTERVAL,
};
pub use sources::{ConfigSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone, Default)]
pub struct TallyConfig {
	/// `None` when no API key is configured.
	pub segment: Option<SegmentConfig>,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`TALLY_SEGMENT_*`)
/// 2. Config file (`/etc/tally/tally.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<TallyConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<TallyConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only.
pub fn load_config_from_env() -> Result<TallyConfig, ConfigError> {
	load_from_sources(vec![Box::new(EnvSource)])
}

/// Merge the given sources in precedence order and resolve the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<TallyConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = TallyConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

fn finalize(layer: TallyConfigLayer) -> Result<TallyConfig, ConfigError> {
	let segment = match layer.segment {
		Some(segment) => segment.finalize()?,
		None => None,
	};

	info!(
		segment_configured = segment.is_some(),
		flush_mode = segment.as_ref().map(|s| s.flush_mode.as_str()),
		"Analytics configuration loaded"
	);

	Ok(TallyConfig { segment })
}
