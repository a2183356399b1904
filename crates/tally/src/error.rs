// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the analytics service.

use thiserror::Error;

/// Analytics service errors.
///
/// Event operations never return these; only client construction, the
/// blocking flush and the delivery path do.
#[derive(Debug, Error)]
pub enum AnalyticsError {
	/// API key is missing or blank.
	#[error("invalid API key: must not be blank")]
	InvalidApiKey,

	/// Endpoint is not an http(s) URL.
	#[error("invalid endpoint URL: {0}")]
	InvalidEndpoint(String),

	/// HTTP client could not be built or a request failed.
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// Server returned an error response.
	#[error("server error ({status}): {message}")]
	ServerError { status: u16, message: String },

	/// A background thread could not be started.
	#[error("failed to spawn {name} thread: {source}")]
	ThreadSpawn {
		name: &'static str,
		#[source]
		source: std::io::Error,
	},

	/// Blocking flush did not get confirmation from the network executor.
	#[error("flush failed: {0}")]
	FlushFailed(String),

	/// Client has been shut down.
	#[error("client has been shut down")]
	ClientShutdown,
}

/// Result type alias for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
