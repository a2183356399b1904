// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Service used when no API key is configured.

use tracing::info;

use crate::builder::{PropertiesMessageBuilder, SimpleMessageBuilder, TraitsMessageBuilder};
use crate::error::Result;
use crate::service::{AnalyticsService, Configure};

/// Accepts every call and does nothing. Configuration steps are not run.
#[derive(Debug)]
pub struct NoOpAnalyticsService {
	_private: (),
}

impl NoOpAnalyticsService {
	pub fn new() -> Self {
		info!("Segment API key configuration 'segment.api_key' not found, using no-op service");
		Self { _private: () }
	}
}

impl Default for NoOpAnalyticsService {
	fn default() -> Self {
		Self::new()
	}
}

impl AnalyticsService for NoOpAnalyticsService {
	fn flush(&self) -> Result<()> {
		Ok(())
	}

	fn alias(&self, _from: &str, _to: &str, _configure: Configure<'_, SimpleMessageBuilder>) {}

	fn group(
		&self,
		_user_id: &str,
		_group_id: &str,
		_configure: Configure<'_, TraitsMessageBuilder>,
	) {
	}

	fn identify(&self, _user_id: &str, _configure: Configure<'_, TraitsMessageBuilder>) {}

	fn page(&self, _user_id: &str, _name: &str, _configure: Configure<'_, PropertiesMessageBuilder>) {
	}

	fn screen(
		&self,
		_user_id: &str,
		_name: &str,
		_configure: Configure<'_, PropertiesMessageBuilder>,
	) {
	}

	fn track(
		&self,
		_user_id: &str,
		_event: &str,
		_configure: Configure<'_, PropertiesMessageBuilder>,
	) {
	}
}
