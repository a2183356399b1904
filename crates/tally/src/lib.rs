// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Segment-compatible analytics for Rust services.
//!
//! This crate provides:
//! - Fluent builders for alias, group, identify, page, screen and track messages
//! - [`AnalyticsService`], the facade application code calls
//! - [`SegmentClient`], which batches messages on a background thread and
//!   uploads them to the Segment HTTP API
//! - A no-op service used when no API key is configured
//!
//! # Quick Start
//!
//! ```ignore
//! use tally::{analytics_service, AnalyticsServiceExt, MessageBuilder, MessageHooks};
//!
//! let config = tally_config::load_config()?;
//! let analytics = analytics_service(config.segment.as_ref(), MessageHooks::default());
//!
//! analytics.identify_with("user-id", |b| b.traits("plan", "pro"));
//! analytics.track_with("user-id", "USER_LOGGED_IN", |b| {
//!     b.properties("category", "VIP").context("ip", "10.0.0.1")
//! });
//!
//! analytics.flush()?;
//! analytics.shutdown();
//! ```
//!
//! # Null handling
//!
//! Null values never reach the wire. Builder setters ignore them, and maps are
//! passed through [`safe`] before a message is built.

pub mod batch;
pub mod builder;
pub mod client;
pub mod default_service;
pub mod error;
pub mod executor;
pub mod factory;
pub mod hooks;
pub mod legacy;
pub mod noop;
pub mod service;

pub use batch::{BatchCommand, BatchConfig, BatchSender};
pub use builder::{
	MessageBuilder, PropertiesMessageBuilder, SimpleMessageBuilder, TraitsMessageBuilder,
};
pub use client::{AnalyticsClient, HttpBatchSender, SegmentClient, SegmentClientBuilder};
pub use default_service::DefaultAnalyticsService;
pub use error::{AnalyticsError, Result};
pub use executor::NetworkExecutor;
pub use factory::{analytics_service, build_client, service_for_client, Analytics};
pub use hooks::{MessageHooks, MessageInterceptor, MessageTransformer};
pub use legacy::{apply_legacy_options, SUPPORTED_CONTEXT_OPTIONS};
pub use noop::NoOpAnalyticsService;
pub use service::{AnalyticsService, AnalyticsServiceExt, Configure};

pub use tally_config::{FlushMode, SegmentConfig};
pub use tally_core::{
	safe, safe_value, AliasMessage, GroupMessage, IdentifyMessage, JsonMap, Message, MessageCommon,
	MessageKind, PageMessage, ScreenMessage, TrackMessage,
};
