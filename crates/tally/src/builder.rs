// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fluent builders for analytics messages.
//!
//! A builder is created per call, configured through chained setters and
//! consumed once by a `build_*` method. Setters that receive a null value
//! (`Value::Null`, `None`) leave the builder untouched, so optional inputs
//! can be passed straight through without clearing earlier state.
//!
//! # Example
//!
//! ```
//! use tally::{MessageBuilder, PropertiesMessageBuilder};
//!
//! let message = PropertiesMessageBuilder::new()
//!     .user_id("user-id")
//!     .properties("category", "VIP")
//!     .properties("nullable", None::<String>)
//!     .context("ip", "10.0.0.1")
//!     .build_track_message("USER_LOGGED_IN");
//!
//! let properties = message.properties.unwrap();
//! assert_eq!(properties["category"], "VIP");
//! assert!(!properties.contains_key("nullable"));
//! ```

use chrono::{DateTime, Utc};
use serde_json::Value;
use tally_core::{
	safe, AliasMessage, GroupMessage, IdentifyMessage, JsonMap, MessageCommon, PageMessage,
	ScreenMessage, TrackMessage,
};
use uuid::Uuid;

/// State shared by every builder kind.
#[derive(Debug, Clone, Default)]
pub struct MessageFields {
	message_id: Option<String>,
	timestamp: Option<DateTime<Utc>>,
	anonymous_id: Option<String>,
	user_id: Option<String>,
	context: JsonMap,
	integrations_enabled: JsonMap,
	integration_options: JsonMap,
}

impl MessageFields {
	fn into_common(self) -> MessageCommon {
		let mut integrations = self.integrations_enabled;
		for (name, options) in self.integration_options {
			integrations.insert(name, options);
		}

		MessageCommon {
			message_id: non_blank(self.message_id),
			timestamp: self.timestamp,
			anonymous_id: non_blank(self.anonymous_id),
			user_id: non_blank(self.user_id),
			context: sanitized(&self.context),
			integrations: non_empty(integrations),
		}
	}
}

fn non_blank(value: Option<String>) -> Option<String> {
	value.filter(|v| !v.is_empty())
}

fn non_empty(map: JsonMap) -> Option<JsonMap> {
	(!map.is_empty()).then_some(map)
}

fn sanitized(map: &JsonMap) -> Option<JsonMap> {
	if map.is_empty() {
		return None;
	}
	non_empty(safe(Some(map)))
}

fn insert_non_null(map: &mut JsonMap, key: impl Into<String>, value: impl Into<Value>) {
	let value = value.into();
	if !value.is_null() {
		map.insert(key.into(), value);
	}
}

mod private {
	pub trait Sealed {
		fn fields_mut(&mut self) -> &mut super::MessageFields;
	}
}

/// Setters common to every message kind.
pub trait MessageBuilder: private::Sealed + Sized {
	/// Sets the message id. Empty ids are dropped when the message is built.
	fn message_id(mut self, message_id: impl Into<String>) -> Self {
		self.fields_mut().message_id = Some(message_id.into());
		self
	}

	fn message_uuid(self, message_id: Uuid) -> Self {
		self.message_id(message_id.to_string())
	}

	/// Sets when the event happened. `None` keeps the current value.
	fn timestamp(mut self, timestamp: impl Into<Option<DateTime<Utc>>>) -> Self {
		if let Some(timestamp) = timestamp.into() {
			self.fields_mut().timestamp = Some(timestamp);
		}
		self
	}

	/// Adds one context entry, skipping nulls.
	fn context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		insert_non_null(&mut self.fields_mut().context, key, value);
		self
	}

	/// Merges context entries, skipping nulls.
	fn context_map<I, K, V>(mut self, context: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<Value>,
	{
		for (key, value) in context {
			insert_non_null(&mut self.fields_mut().context, key, value);
		}
		self
	}

	fn anonymous_id(mut self, anonymous_id: impl Into<String>) -> Self {
		self.fields_mut().anonymous_id = Some(anonymous_id.into());
		self
	}

	fn anonymous_uuid(self, anonymous_id: Uuid) -> Self {
		self.anonymous_id(anonymous_id.to_string())
	}

	fn user_id(mut self, user_id: impl Into<String>) -> Self {
		self.fields_mut().user_id = Some(user_id.into());
		self
	}

	fn enable_integration(mut self, name: impl Into<String>, enable: bool) -> Self {
		self
			.fields_mut()
			.integrations_enabled
			.insert(name.into(), Value::Bool(enable));
		self
	}

	/// Replaces the options sent to one integration. Null entries are removed.
	fn integration_options<I, K, V>(mut self, name: impl Into<String>, options: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<Value>,
	{
		let options: JsonMap = options
			.into_iter()
			.map(|(k, v)| (k.into(), v.into()))
			.collect();
		self
			.fields_mut()
			.integration_options
			.insert(name.into(), Value::Object(safe(Some(&options))));
		self
	}

	/// Single-entry form of [`integration_options`](Self::integration_options).
	fn integration_option(
		self,
		name: impl Into<String>,
		key: impl Into<String>,
		value: impl Into<Value>,
	) -> Self {
		let entry: (String, Value) = (key.into(), value.into());
		self.integration_options(name, [entry])
	}
}

impl<T: private::Sealed> MessageBuilder for T {}

/// Builder for alias messages.
#[derive(Debug, Clone, Default)]
pub struct SimpleMessageBuilder {
	fields: MessageFields,
}

impl private::Sealed for SimpleMessageBuilder {
	fn fields_mut(&mut self) -> &mut MessageFields {
		&mut self.fields
	}
}

impl SimpleMessageBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds an alias from `previous_id` to the configured user id.
	pub fn build_alias_message(self, previous_id: impl Into<String>) -> AliasMessage {
		AliasMessage {
			common: self.fields.into_common(),
			previous_id: previous_id.into(),
		}
	}
}

/// Builder for group and identify messages.
#[derive(Debug, Clone, Default)]
pub struct TraitsMessageBuilder {
	fields: MessageFields,
	traits: JsonMap,
}

impl private::Sealed for TraitsMessageBuilder {
	fn fields_mut(&mut self) -> &mut MessageFields {
		&mut self.fields
	}
}

impl TraitsMessageBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds one trait, skipping nulls.
	pub fn traits(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		insert_non_null(&mut self.traits, key, value);
		self
	}

	/// Merges traits, skipping nulls.
	pub fn traits_map<I, K, V>(mut self, traits: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<Value>,
	{
		for (key, value) in traits {
			insert_non_null(&mut self.traits, key, value);
		}
		self
	}

	pub fn build_group_message(self, group_id: impl Into<String>) -> GroupMessage {
		GroupMessage {
			traits: sanitized(&self.traits),
			common: self.fields.into_common(),
			group_id: group_id.into(),
		}
	}

	pub fn build_identify_message(self) -> IdentifyMessage {
		IdentifyMessage {
			traits: sanitized(&self.traits),
			common: self.fields.into_common(),
		}
	}
}

/// Builder for page, screen and track messages.
#[derive(Debug, Clone, Default)]
pub struct PropertiesMessageBuilder {
	fields: MessageFields,
	properties: JsonMap,
}

impl private::Sealed for PropertiesMessageBuilder {
	fn fields_mut(&mut self) -> &mut MessageFields {
		&mut self.fields
	}
}

impl PropertiesMessageBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds one property, skipping nulls.
	pub fn properties(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		insert_non_null(&mut self.properties, key, value);
		self
	}

	/// Merges properties, skipping nulls.
	pub fn properties_map<I, K, V>(mut self, properties: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<Value>,
	{
		for (key, value) in properties {
			insert_non_null(&mut self.properties, key, value);
		}
		self
	}

	pub fn build_page_message(self, name: impl Into<String>) -> PageMessage {
		PageMessage {
			properties: sanitized(&self.properties),
			common: self.fields.into_common(),
			name: name.into(),
		}
	}

	pub fn build_screen_message(self, name: impl Into<String>) -> ScreenMessage {
		ScreenMessage {
			properties: sanitized(&self.properties),
			common: self.fields.into_common(),
			name: name.into(),
		}
	}

	pub fn build_track_message(self, event: impl Into<String>) -> TrackMessage {
		TrackMessage {
			properties: sanitized(&self.properties),
			common: self.fields.into_common(),
			event: event.into(),
		}
	}
}
