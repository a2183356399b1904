// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Tally analytics adapter.
//!
//! This crate holds the pieces that have no I/O:
//! - [`Message`]: the tagged union of Segment-compatible wire messages
//! - [`safe_map`]: recursive removal of null entries from JSON objects

pub mod message;
pub mod safe_map;

pub use message::{
	AliasMessage, GroupMessage, IdentifyMessage, Message, MessageCommon, MessageKind, PageMessage,
	ScreenMessage, TrackMessage,
};
pub use safe_map::{safe, safe_value};

/// JSON object type used for context, traits, properties and integrations.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
