// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Example: Send a few events using configuration from the environment.
//!
//! Run with:
//!   TALLY_SEGMENT_API_KEY=... TALLY_SEGMENT_FLUSH_MODE=blocking \
//!     cargo run --example send_events -p tally

use tally::{analytics_service, AnalyticsService, AnalyticsServiceExt, MessageBuilder, MessageHooks};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let config = tally_config::load_config()?;
	let analytics = analytics_service(config.segment.as_ref(), MessageHooks::default());

	println!("Analytics enabled: {}", analytics.is_enabled());

	analytics.identify_with("user_example_123", |b| {
		b.traits("email", "example@example.com")
			.traits("plan", "pro")
			.context("ip", "10.0.0.1")
	});

	analytics.page_in_category("user_example_123", "Dashboard", "Reports", |b| b);

	analytics.track_with("user_example_123", "Report Exported", |b| {
		b.properties("format", "csv")
			.properties("rows", 1200)
			.enable_integration("Mixpanel", false)
	});

	analytics.flush()?;
	analytics.shutdown();

	println!("Done.");
	Ok(())
}
