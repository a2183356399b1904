// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! [`AnalyticsService`] backed by an [`AnalyticsClient`].

use std::sync::Arc;
use std::time::Duration;

use tally_config::{FlushMode, SegmentConfig, DEFAULT_PROBE_SLEEP, DEFAULT_PROBE_TIMEOUT};
use tally_core::{JsonMap, Message};
use tracing::{debug, instrument};

use crate::builder::{
	MessageBuilder, PropertiesMessageBuilder, SimpleMessageBuilder, TraitsMessageBuilder,
};
use crate::client::AnalyticsClient;
use crate::error::{AnalyticsError, Result};
use crate::legacy::apply_legacy_options;
use crate::service::{AnalyticsService, Configure};

/// Builds messages and hands them to the client.
///
/// Every builder is seeded with the user id, then with the default options,
/// then passed to the caller's configuration step, so anything set by the
/// caller wins over the defaults.
pub struct DefaultAnalyticsService {
	client: Arc<dyn AnalyticsClient>,
	options: JsonMap,
	flush_mode: FlushMode,
	probe_sleep: Duration,
	probe_timeout: Duration,
}

impl DefaultAnalyticsService {
	pub fn new(client: Arc<dyn AnalyticsClient>) -> Self {
		Self {
			client,
			options: JsonMap::new(),
			flush_mode: FlushMode::default(),
			probe_sleep: DEFAULT_PROBE_SLEEP,
			probe_timeout: DEFAULT_PROBE_TIMEOUT,
		}
	}

	pub fn from_config(client: Arc<dyn AnalyticsClient>, config: &SegmentConfig) -> Self {
		Self::new(client)
			.with_options(config.options.clone())
			.with_flush_mode(config.flush_mode)
			.with_probe(config.probe_sleep, config.probe_timeout)
	}

	/// Default options applied to every message, in the legacy option-map format.
	pub fn with_options(mut self, options: JsonMap) -> Self {
		self.options = options;
		self
	}

	pub fn with_flush_mode(mut self, flush_mode: FlushMode) -> Self {
		self.flush_mode = flush_mode;
		self
	}

	/// Sets the pause before the flush probe and how long to wait for it.
	pub fn with_probe(mut self, sleep: Duration, timeout: Duration) -> Self {
		self.probe_sleep = sleep;
		self.probe_timeout = timeout;
		self
	}

	pub fn flush_mode(&self) -> FlushMode {
		self.flush_mode
	}

	pub fn client(&self) -> &Arc<dyn AnalyticsClient> {
		&self.client
	}

	fn prepare<B: MessageBuilder>(&self, builder: B, user_id: &str, configure: Configure<'_, B>) -> B {
		let mut builder = builder.user_id(user_id);
		if !self.options.is_empty() {
			builder = apply_legacy_options(builder, &self.options, None);
		}
		configure(builder)
	}

	fn enqueue(&self, message: impl Into<Message>) {
		let message = message.into();
		debug!(kind = %message.kind(), "enqueueing message");
		self.client.enqueue(message);
	}
}

impl AnalyticsService for DefaultAnalyticsService {
	#[instrument(skip(self), fields(flush_mode = %self.flush_mode))]
	fn flush(&self) -> Result<()> {
		self.client.flush();

		if self.flush_mode == FlushMode::Blocking {
			let executor = self.client.network_executor().ok_or_else(|| {
				AnalyticsError::FlushFailed("client has no network executor".to_string())
			})?;
			executor.probe(self.probe_sleep, self.probe_timeout)?;
			debug!("blocking flush completed");
		}

		Ok(())
	}

	fn alias(&self, from: &str, to: &str, configure: Configure<'_, SimpleMessageBuilder>) {
		let message = self
			.prepare(SimpleMessageBuilder::new(), to, configure)
			.build_alias_message(from);
		self.enqueue(message);
	}

	fn group(&self, user_id: &str, group_id: &str, configure: Configure<'_, TraitsMessageBuilder>) {
		let message = self
			.prepare(TraitsMessageBuilder::new(), user_id, configure)
			.build_group_message(group_id);
		self.enqueue(message);
	}

	fn identify(&self, user_id: &str, configure: Configure<'_, TraitsMessageBuilder>) {
		let message = self
			.prepare(TraitsMessageBuilder::new(), user_id, configure)
			.build_identify_message();
		self.enqueue(message);
	}

	fn page(&self, user_id: &str, name: &str, configure: Configure<'_, PropertiesMessageBuilder>) {
		let message = self
			.prepare(PropertiesMessageBuilder::new(), user_id, configure)
			.build_page_message(name);
		self.enqueue(message);
	}

	fn screen(&self, user_id: &str, name: &str, configure: Configure<'_, PropertiesMessageBuilder>) {
		let message = self
			.prepare(PropertiesMessageBuilder::new(), user_id, configure)
			.build_screen_message(name);
		self.enqueue(message);
	}

	fn track(&self, user_id: &str, event: &str, configure: Configure<'_, PropertiesMessageBuilder>) {
		let message = self
			.prepare(PropertiesMessageBuilder::new(), user_id, configure)
			.build_track_message(event);
		self.enqueue(message);
	}
}

impl std::fmt::Debug for DefaultAnalyticsService {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DefaultAnalyticsService")
			.field("options", &self.options)
			.field("flush_mode", &self.flush_mode)
			.field("probe_sleep", &self.probe_sleep)
			.field("probe_timeout", &self.probe_timeout)
			.finish_non_exhaustive()
	}
}
