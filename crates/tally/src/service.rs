// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The analytics facade used by application code.
//!
//! [`AnalyticsService`] is object safe so it can be shared as
//! `Arc<dyn AnalyticsService>`. Its methods take the builder configuration
//! step as a boxed closure; [`AnalyticsServiceExt`] adds generic wrappers
//! that box for you, shorthands without configuration, and the deprecated
//! map-based forms.
//!
//! # Example
//!
//! ```
//! use tally::{AnalyticsService, AnalyticsServiceExt, MessageBuilder, NoOpAnalyticsService};
//!
//! let analytics = NoOpAnalyticsService::new();
//! analytics.track_with("user-id", "USER_LOGGED_IN", |builder| {
//!     builder.properties("category", "VIP").context("ip", "10.0.0.1")
//! });
//! analytics.flush().unwrap();
//! ```

use chrono::{DateTime, Utc};
use tally_core::JsonMap;

use crate::builder::{PropertiesMessageBuilder, SimpleMessageBuilder, TraitsMessageBuilder};
use crate::error::Result;
use crate::legacy::apply_legacy_options;

/// A builder configuration step.
pub type Configure<'a, B> = Box<dyn FnOnce(B) -> B + 'a>;

/// One operation per message kind, plus `flush`.
///
/// Event operations never fail from the caller's point of view. Delivery
/// problems are logged by the client.
pub trait AnalyticsService: Send + Sync {
	/// Asks the client to send what is queued.
	///
	/// In blocking mode this also waits until the upload has been attempted
	/// and fails with [`AnalyticsError::FlushFailed`](crate::AnalyticsError::FlushFailed)
	/// when that takes too long.
	fn flush(&self) -> Result<()>;

	/// Links the previous id `from` to the user id `to`.
	fn alias(&self, from: &str, to: &str, configure: Configure<'_, SimpleMessageBuilder>);

	fn group(&self, user_id: &str, group_id: &str, configure: Configure<'_, TraitsMessageBuilder>);

	fn identify(&self, user_id: &str, configure: Configure<'_, TraitsMessageBuilder>);

	fn page(&self, user_id: &str, name: &str, configure: Configure<'_, PropertiesMessageBuilder>);

	fn screen(&self, user_id: &str, name: &str, configure: Configure<'_, PropertiesMessageBuilder>);

	fn track(&self, user_id: &str, event: &str, configure: Configure<'_, PropertiesMessageBuilder>);
}

/// Convenience methods available on every [`AnalyticsService`].
pub trait AnalyticsServiceExt: AnalyticsService {
	fn alias_with<'a, F>(&self, from: &str, to: &str, configure: F)
	where
		F: FnOnce(SimpleMessageBuilder) -> SimpleMessageBuilder + 'a,
	{
		self.alias(from, to, Box::new(configure));
	}

	fn group_with<'a, F>(&self, user_id: &str, group_id: &str, configure: F)
	where
		F: FnOnce(TraitsMessageBuilder) -> TraitsMessageBuilder + 'a,
	{
		self.group(user_id, group_id, Box::new(configure));
	}

	fn identify_with<'a, F>(&self, user_id: &str, configure: F)
	where
		F: FnOnce(TraitsMessageBuilder) -> TraitsMessageBuilder + 'a,
	{
		self.identify(user_id, Box::new(configure));
	}

	fn page_with<'a, F>(&self, user_id: &str, name: &str, configure: F)
	where
		F: FnOnce(PropertiesMessageBuilder) -> PropertiesMessageBuilder + 'a,
	{
		self.page(user_id, name, Box::new(configure));
	}

	fn screen_with<'a, F>(&self, user_id: &str, name: &str, configure: F)
	where
		F: FnOnce(PropertiesMessageBuilder) -> PropertiesMessageBuilder + 'a,
	{
		self.screen(user_id, name, Box::new(configure));
	}

	fn track_with<'a, F>(&self, user_id: &str, event: &str, configure: F)
	where
		F: FnOnce(PropertiesMessageBuilder) -> PropertiesMessageBuilder + 'a,
	{
		self.track(user_id, event, Box::new(configure));
	}

	fn alias_user(&self, from: &str, to: &str) {
		self.alias_with(from, to, |builder| builder);
	}

	fn group_user(&self, user_id: &str, group_id: &str) {
		self.group_with(user_id, group_id, |builder| builder);
	}

	fn identify_user(&self, user_id: &str) {
		self.identify_with(user_id, |builder| builder);
	}

	fn page_view(&self, user_id: &str, name: &str) {
		self.page_with(user_id, name, |builder| builder);
	}

	fn screen_view(&self, user_id: &str, name: &str) {
		self.screen_with(user_id, name, |builder| builder);
	}

	fn track_event(&self, user_id: &str, event: &str) {
		self.track_with(user_id, event, |builder| builder);
	}

	/// Records a page view with a `category` property set before `configure` runs.
	fn page_in_category<'a, F>(&self, user_id: &str, name: &str, category: &str, configure: F)
	where
		F: FnOnce(PropertiesMessageBuilder) -> PropertiesMessageBuilder + 'a,
	{
		self.page_with(user_id, name, |builder| {
			configure(builder.properties("category", category))
		});
	}

	/// Records a screen view with a `category` property set before `configure` runs.
	fn screen_in_category<'a, F>(&self, user_id: &str, name: &str, category: &str, configure: F)
	where
		F: FnOnce(PropertiesMessageBuilder) -> PropertiesMessageBuilder + 'a,
	{
		self.screen_with(user_id, name, |builder| {
			configure(builder.properties("category", category))
		});
	}

	#[deprecated(note = "use `group_with` and configure the builder instead")]
	fn group_with_traits(
		&self,
		user_id: &str,
		group_id: &str,
		traits: &JsonMap,
		timestamp: Option<DateTime<Utc>>,
		options: &JsonMap,
	) {
		self.group_with(user_id, group_id, |builder| {
			apply_legacy_options(builder.traits_map(traits.clone()), options, timestamp)
		});
	}

	#[deprecated(note = "use `identify_with` and configure the builder instead")]
	fn identify_with_traits(
		&self,
		user_id: &str,
		traits: &JsonMap,
		timestamp: Option<DateTime<Utc>>,
		options: &JsonMap,
	) {
		self.identify_with(user_id, |builder| {
			apply_legacy_options(builder.traits_map(traits.clone()), options, timestamp)
		});
	}

	#[deprecated(note = "use `page_with` and configure the builder instead")]
	fn page_with_properties(
		&self,
		user_id: &str,
		name: &str,
		category: Option<&str>,
		properties: &JsonMap,
		timestamp: Option<DateTime<Utc>>,
		options: &JsonMap,
	) {
		self.page_with(user_id, name, |builder| {
			let builder = builder
				.properties("category", category)
				.properties_map(properties.clone());
			apply_legacy_options(builder, options, timestamp)
		});
	}

	#[deprecated(note = "use `screen_with` and configure the builder instead")]
	fn screen_with_properties(
		&self,
		user_id: &str,
		name: &str,
		category: Option<&str>,
		properties: &JsonMap,
		timestamp: Option<DateTime<Utc>>,
		options: &JsonMap,
	) {
		self.screen_with(user_id, name, |builder| {
			let builder = builder
				.properties("category", category)
				.properties_map(properties.clone());
			apply_legacy_options(builder, options, timestamp)
		});
	}

	#[deprecated(note = "use `track_with` and configure the builder instead")]
	fn track_with_properties(
		&self,
		user_id: &str,
		event: &str,
		properties: &JsonMap,
		timestamp: Option<DateTime<Utc>>,
		options: &JsonMap,
	) {
		self.track_with(user_id, event, |builder| {
			apply_legacy_options(builder.properties_map(properties.clone()), options, timestamp)
		});
	}
}

impl<T: AnalyticsService + ?Sized> AnalyticsServiceExt for T {}
