// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wiring from configuration to a ready-to-use service.

use std::sync::Arc;

use tally_config::SegmentConfig;
use tracing::{error, info};

use crate::client::{AnalyticsClient, SegmentClient, SegmentClientBuilder};
use crate::default_service::DefaultAnalyticsService;
use crate::error::Result;
use crate::hooks::MessageHooks;
use crate::noop::NoOpAnalyticsService;
use crate::service::AnalyticsService;

/// Builds the delivery client for `config` with `hooks` registered.
pub fn build_client(config: &SegmentConfig, hooks: MessageHooks) -> Result<SegmentClient> {
	SegmentClientBuilder::from_config(config)
		.hooks(hooks)
		.build()
}

/// Picks the facade for an optional client.
///
/// Without a client the no-op service is returned. Without configuration
/// the default service runs with default settings.
pub fn service_for_client(
	client: Option<Arc<dyn AnalyticsClient>>,
	config: Option<&SegmentConfig>,
) -> Arc<dyn AnalyticsService> {
	match (client, config) {
		(Some(client), Some(config)) => Arc::new(DefaultAnalyticsService::from_config(client, config)),
		(Some(client), None) => Arc::new(DefaultAnalyticsService::new(client)),
		(None, _) => Arc::new(NoOpAnalyticsService::new()),
	}
}

/// The service handed to application code together with the client it owns.
#[derive(Clone)]
pub struct Analytics {
	service: Arc<dyn AnalyticsService>,
	client: Option<SegmentClient>,
}

impl Analytics {
	pub fn service(&self) -> Arc<dyn AnalyticsService> {
		self.service.clone()
	}

	/// Returns false when the no-op service is in use.
	pub fn is_enabled(&self) -> bool {
		self.client.is_some()
	}

	/// Uploads what is queued and stops the client's background threads.
	pub fn shutdown(&self) {
		if let Some(client) = &self.client {
			client.shutdown();
		}
	}
}

impl std::ops::Deref for Analytics {
	type Target = dyn AnalyticsService;

	fn deref(&self) -> &Self::Target {
		self.service.as_ref()
	}
}

impl std::fmt::Debug for Analytics {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Analytics")
			.field("enabled", &self.is_enabled())
			.finish()
	}
}

/// Builds the service for an optional configuration section.
///
/// Falls back to the no-op service when there is no configuration or the
/// client cannot be built.
pub fn analytics_service(config: Option<&SegmentConfig>, hooks: MessageHooks) -> Analytics {
	let client = config.and_then(|config| match build_client(config, hooks) {
		Ok(client) => Some(client),
		Err(e) => {
			error!(error = %e, "Failed to build analytics client");
			None
		}
	});

	let service = service_for_client(
		client
			.clone()
			.map(|client| Arc::new(client) as Arc<dyn AnalyticsClient>),
		config,
	);

	if client.is_some() {
		info!("Analytics enabled");
	}

	Analytics { service, client }
}
