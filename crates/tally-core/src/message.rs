// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire messages for the Segment HTTP tracking API.
//!
//! Each message kind shares [`MessageCommon`] and adds its own payload.
//! Optional fields are skipped on serialization, so a message that never had
//! a timestamp or context set is sent without those keys at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::JsonMap;

/// Fields shared by every message kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageCommon {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timestamp: Option<DateTime<Utc>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub anonymous_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub context: Option<JsonMap>,
	/// Integration name to either a `bool` enablement flag or an options object.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub integrations: Option<JsonMap>,
}

/// Merges two user identities. `common.user_id` is the new id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasMessage {
	#[serde(flatten)]
	pub common: MessageCommon,
	pub previous_id: String,
}

/// Associates a user with a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessage {
	#[serde(flatten)]
	pub common: MessageCommon,
	pub group_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub traits: Option<JsonMap>,
}

/// Ties a user to their traits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyMessage {
	#[serde(flatten)]
	pub common: MessageCommon,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub traits: Option<JsonMap>,
}

/// A web page view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMessage {
	#[serde(flatten)]
	pub common: MessageCommon,
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub properties: Option<JsonMap>,
}

/// A mobile screen view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenMessage {
	#[serde(flatten)]
	pub common: MessageCommon,
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub properties: Option<JsonMap>,
}

/// An action performed by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackMessage {
	#[serde(flatten)]
	pub common: MessageCommon,
	pub event: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub properties: Option<JsonMap>,
}

/// One analytics event ready for delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
	Alias(AliasMessage),
	Group(GroupMessage),
	Identify(IdentifyMessage),
	Page(PageMessage),
	Screen(ScreenMessage),
	Track(TrackMessage),
}

/// The kind of a [`Message`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
	Alias,
	Group,
	Identify,
	Page,
	Screen,
	Track,
}

impl MessageKind {
	/// Returns the wire name used in the `type` field.
	pub fn as_str(&self) -> &'static str {
		match self {
			MessageKind::Alias => "alias",
			MessageKind::Group => "group",
			MessageKind::Identify => "identify",
			MessageKind::Page => "page",
			MessageKind::Screen => "screen",
			MessageKind::Track => "track",
		}
	}
}

impl std::fmt::Display for MessageKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl Message {
	pub fn kind(&self) -> MessageKind {
		match self {
			Message::Alias(_) => MessageKind::Alias,
			Message::Group(_) => MessageKind::Group,
			Message::Identify(_) => MessageKind::Identify,
			Message::Page(_) => MessageKind::Page,
			Message::Screen(_) => MessageKind::Screen,
			Message::Track(_) => MessageKind::Track,
		}
	}

	pub fn common(&self) -> &MessageCommon {
		match self {
			Message::Alias(m) => &m.common,
			Message::Group(m) => &m.common,
			Message::Identify(m) => &m.common,
			Message::Page(m) => &m.common,
			Message::Screen(m) => &m.common,
			Message::Track(m) => &m.common,
		}
	}

	pub fn common_mut(&mut self) -> &mut MessageCommon {
		match self {
			Message::Alias(m) => &mut m.common,
			Message::Group(m) => &mut m.common,
			Message::Identify(m) => &mut m.common,
			Message::Page(m) => &mut m.common,
			Message::Screen(m) => &mut m.common,
			Message::Track(m) => &mut m.common,
		}
	}

	pub fn message_id(&self) -> Option<&str> {
		self.common().message_id.as_deref()
	}

	pub fn user_id(&self) -> Option<&str> {
		self.common().user_id.as_deref()
	}

	pub fn anonymous_id(&self) -> Option<&str> {
		self.common().anonymous_id.as_deref()
	}

	pub fn timestamp(&self) -> Option<DateTime<Utc>> {
		self.common().timestamp
	}

	pub fn context(&self) -> Option<&JsonMap> {
		self.common().context.as_ref()
	}

	pub fn integrations(&self) -> Option<&JsonMap> {
		self.common().integrations.as_ref()
	}

	/// Traits for group and identify messages, properties for the rest.
	pub fn payload(&self) -> Option<&JsonMap> {
		match self {
			Message::Alias(_) => None,
			Message::Group(m) => m.traits.as_ref(),
			Message::Identify(m) => m.traits.as_ref(),
			Message::Page(m) => m.properties.as_ref(),
			Message::Screen(m) => m.properties.as_ref(),
			Message::Track(m) => m.properties.as_ref(),
		}
	}
}

macro_rules! impl_from_variant {
	($($variant:ident => $ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for Message {
				fn from(message: $ty) -> Self {
					Message::$variant(message)
				}
			}
		)*
	};
}

impl_from_variant! {
	Alias => AliasMessage,
	Group => GroupMessage,
	Identify => IdentifyMessage,
	Page => PageMessage,
	Screen => ScreenMessage,
	Track => TrackMessage,
}
