// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Facade behaviour against an in-memory client.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Value};
use tally::{
	service_for_client, AnalyticsClient, AnalyticsError, AnalyticsService, AnalyticsServiceExt,
	DefaultAnalyticsService, FlushMode, JsonMap, Message, MessageBuilder, MessageCommon,
	NetworkExecutor, SegmentConfig,
};

const PREVIOUS_ID: &str = "previous-id";
const NAME: &str = "name";
const USER_ID: &str = "user-id";
const GROUP_ID: &str = "group-id";
const ANONYMOUS_ID: &str = "anonymous-id";
const MESSAGE_ID: &str = "message-id";
const GOOGLE_ANALYTICS_ID: &str = "123.456";
const IP_ADDRESS: &str = "10.0.0.1";
const LANGUAGE: &str = "cs";
const USER_AGENT: &str = "Agorazilla";
const INTERCOM: i64 = 123456;
const CATEGORY: &str = "VIP";
const SECTION: &str = "Header";
const EVENT: &str = "USER_LOGGED_IN";
const DEFAULT_LANGUAGE: &str = "sk";
const DEFAULT_USER_AGENT: &str = "Safari";

#[derive(Default)]
struct RecordingClient {
	messages: Mutex<Vec<Message>>,
	flushes: AtomicUsize,
	executor: Option<NetworkExecutor>,
}

impl RecordingClient {
	fn with_executor(executor: NetworkExecutor) -> Self {
		Self {
			executor: Some(executor),
			..Default::default()
		}
	}

	fn single(&self) -> Message {
		let messages = self.messages.lock().unwrap();
		assert_eq!(messages.len(), 1, "expected exactly one message");
		messages[0].clone()
	}
}

impl AnalyticsClient for RecordingClient {
	fn enqueue(&self, message: Message) {
		self.messages.lock().unwrap().push(message);
	}

	fn flush(&self) {
		self.flushes.fetch_add(1, Ordering::SeqCst);
	}

	fn shutdown(&self) {}

	fn network_executor(&self) -> Option<NetworkExecutor> {
		self.executor.clone()
	}
}

fn default_options() -> JsonMap {
	let mut options = JsonMap::new();
	options.insert("language".to_string(), json!(DEFAULT_LANGUAGE));
	options.insert("userAgent".to_string(), json!(DEFAULT_USER_AGENT));
	options
}

fn setup() -> (Arc<RecordingClient>, DefaultAnalyticsService) {
	let client = Arc::new(RecordingClient::default());
	let service = DefaultAnalyticsService::new(client.clone()).with_options(default_options());
	(client, service)
}

fn assert_default_context(common: &MessageCommon) {
	let context = common.context.as_ref().expect("context");
	assert_eq!(context.len(), 2);
	assert_eq!(context["language"], DEFAULT_LANGUAGE);
	assert_eq!(context["userAgent"], DEFAULT_USER_AGENT);
}

fn assert_full_context(common: &MessageCommon) {
	assert_eq!(
		Value::Object(common.context.clone().expect("context")),
		json!({
			"language": LANGUAGE,
			"userAgent": USER_AGENT,
			"ip": IP_ADDRESS,
			"Intercom": INTERCOM,
		})
	);
}

fn assert_full_integrations(common: &MessageCommon) {
	let integrations = common.integrations.as_ref().expect("integrations");
	assert_eq!(integrations.len(), 3);
	assert_eq!(
		integrations["Google Analytics"],
		json!({"clientId": GOOGLE_ANALYTICS_ID})
	);
	assert_eq!(integrations["Something Enabled"], json!(true));
	assert_eq!(integrations["Something Disabled"], json!(false));
}

fn assert_category(payload: Option<&JsonMap>) {
	assert_eq!(
		Value::Object(payload.cloned().expect("payload")),
		json!({"category": CATEGORY})
	);
}

fn assert_category_and_section(payload: Option<&JsonMap>) {
	assert_eq!(
		Value::Object(payload.cloned().expect("payload")),
		json!({"category": CATEGORY, "section": SECTION})
	);
}

fn full<B: MessageBuilder>(builder: B, now: chrono::DateTime<Utc>) -> B {
	builder
		.timestamp(now)
		.anonymous_id(ANONYMOUS_ID)
		.message_id(MESSAGE_ID)
		.integration_option("Google Analytics", "clientId", GOOGLE_ANALYTICS_ID)
		.enable_integration("Something Enabled", true)
		.enable_integration("Something Disabled", false)
		.context("ip", IP_ADDRESS)
		.context("language", LANGUAGE)
		.context("userAgent", USER_AGENT)
		.context("Intercom", INTERCOM)
		.context("nullable", Value::Null)
}

#[test]
fn client_flushed() {
	let (client, service) = setup();
	service.flush().unwrap();
	assert_eq!(client.flushes.load(Ordering::SeqCst), 1);
}

#[test]
fn alias_user() {
	let (client, service) = setup();
	service.alias_user(PREVIOUS_ID, USER_ID);

	let Message::Alias(message) = client.single() else {
		panic!("expected alias");
	};
	assert_eq!(message.common.user_id.as_deref(), Some(USER_ID));
	assert_eq!(message.previous_id, PREVIOUS_ID);
}

#[test]
fn alias_user_with_timestamp() {
	let (client, service) = setup();
	let now = Utc::now();
	service.alias_with(PREVIOUS_ID, USER_ID, |b| b.timestamp(now));

	let Message::Alias(message) = client.single() else {
		panic!("expected alias");
	};
	assert_eq!(message.common.user_id.as_deref(), Some(USER_ID));
	assert_eq!(message.previous_id, PREVIOUS_ID);
	assert_eq!(message.common.timestamp, Some(now));
	assert_default_context(&message.common);
}

#[test]
fn identify_simple() {
	let client = Arc::new(RecordingClient::default());
	let service = DefaultAnalyticsService::new(client.clone());
	service.identify_user(USER_ID);

	let Message::Identify(message) = client.single() else {
		panic!("expected identify");
	};
	assert_eq!(message.common.user_id.as_deref(), Some(USER_ID));
	assert!(message.common.timestamp.is_none());
	assert!(message.common.anonymous_id.is_none());
	assert!(message.common.context.is_none());
	assert!(message.traits.is_none());
}

#[test]
fn identify_with_traits() {
	let (client, service) = setup();
	service.identify_with(USER_ID, |b| {
		b.traits("category", CATEGORY).traits("nullable", Value::Null)
	});

	let message = client.single();
	assert_eq!(message.user_id(), Some(USER_ID));
	assert_category(message.payload());
}

#[test]
fn identify_with_everything() {
	let (client, service) = setup();
	let now = Utc::now();
	service.identify_with(USER_ID, |b| {
		full(b.traits("category", CATEGORY).traits("nullable", Value::Null), now)
	});

	let Message::Identify(message) = client.single() else {
		panic!("expected identify");
	};
	assert_eq!(message.common.user_id.as_deref(), Some(USER_ID));
	assert_eq!(message.common.anonymous_id.as_deref(), Some(ANONYMOUS_ID));
	assert_eq!(message.common.message_id.as_deref(), Some(MESSAGE_ID));
	assert_eq!(message.common.timestamp, Some(now));
	assert_full_integrations(&message.common);
	assert_full_context(&message.common);
	assert_category(message.traits.as_ref());
}

#[test]
fn group_with_traits() {
	let (client, service) = setup();
	service.group_with(USER_ID, GROUP_ID, |b| {
		b.traits("category", CATEGORY).traits("nullable", Value::Null)
	});

	let Message::Group(message) = client.single() else {
		panic!("expected group");
	};
	assert_eq!(message.common.user_id.as_deref(), Some(USER_ID));
	assert_eq!(message.group_id, GROUP_ID);
	assert_category(message.traits.as_ref());
	assert_default_context(&message.common);
}

#[test]
fn group_simple() {
	let (client, service) = setup();
	service.group_user(USER_ID, GROUP_ID);

	let Message::Group(message) = client.single() else {
		panic!("expected group");
	};
	assert_eq!(message.group_id, GROUP_ID);
	assert!(message.traits.is_none());
}

#[test]
fn page_no_category() {
	let (client, service) = setup();
	service.page_view(USER_ID, NAME);

	let Message::Page(message) = client.single() else {
		panic!("expected page");
	};
	assert_eq!(message.common.user_id.as_deref(), Some(USER_ID));
	assert_eq!(message.name, NAME);
	assert!(message.properties.is_none());
}

#[test]
fn page_simple() {
	let (client, service) = setup();
	service.page_in_category(USER_ID, NAME, CATEGORY, |b| b);

	let Message::Page(message) = client.single() else {
		panic!("expected page");
	};
	assert_eq!(message.name, NAME);
	assert_category(message.properties.as_ref());
}

#[test]
fn page_with_everything() {
	let (client, service) = setup();
	let now = Utc::now();
	service.page_with(USER_ID, NAME, |b| {
		let b = b
			.properties("category", CATEGORY)
			.properties("section", SECTION)
			.properties("nullable", Value::Null);
		full(b, now)
	});

	let Message::Page(message) = client.single() else {
		panic!("expected page");
	};
	assert_eq!(message.name, NAME);
	assert_eq!(message.common.timestamp, Some(now));
	assert_category_and_section(message.properties.as_ref());
	assert_full_integrations(&message.common);
	assert_full_context(&message.common);
}

#[test]
fn screen_no_category() {
	let (client, service) = setup();
	service.screen_view(USER_ID, NAME);

	let Message::Screen(message) = client.single() else {
		panic!("expected screen");
	};
	assert_eq!(message.name, NAME);
	assert!(message.properties.is_none());
}

#[test]
fn screen_simple() {
	let (client, service) = setup();
	service.screen_in_category(USER_ID, NAME, CATEGORY, |b| b.properties("section", SECTION));

	let Message::Screen(message) = client.single() else {
		panic!("expected screen");
	};
	assert_category_and_section(message.properties.as_ref());
}

#[test]
fn track_simple() {
	let (client, service) = setup();
	service.track_event(USER_ID, EVENT);

	let Message::Track(message) = client.single() else {
		panic!("expected track");
	};
	assert_eq!(message.common.user_id.as_deref(), Some(USER_ID));
	assert_eq!(message.event, EVENT);
	assert!(message.properties.is_none());
	assert_default_context(&message.common);
}

#[test]
fn track_with_properties() {
	let client = Arc::new(RecordingClient::default());
	let service = DefaultAnalyticsService::new(client.clone());
	service.track_with(USER_ID, EVENT, |b| {
		b.properties("category", CATEGORY)
			.properties("nullable", None::<String>)
	});

	let Message::Track(message) = client.single() else {
		panic!("expected track");
	};
	assert_eq!(message.event, EVENT);
	assert_category(message.properties.as_ref());
	assert!(message.common.timestamp.is_none());
}

#[test]
fn track_with_everything() {
	let (client, service) = setup();
	let now = Utc::now();
	service.track_with(USER_ID, EVENT, |b| {
		full(
			b.properties("category", CATEGORY)
				.properties("section", SECTION),
			now,
		)
	});

	let Message::Track(message) = client.single() else {
		panic!("expected track");
	};
	assert_category_and_section(message.properties.as_ref());
	assert_full_integrations(&message.common);
	assert_full_context(&message.common);
}

#[test]
#[allow(deprecated)]
fn deprecated_identify_with_options() {
	let (client, service) = setup();
	let now = Utc::now();

	let mut traits = JsonMap::new();
	traits.insert("category".to_string(), json!(CATEGORY));
	traits.insert("nullable".to_string(), Value::Null);

	let Value::Object(options) = json!({
		"anonymousId": ANONYMOUS_ID,
		"integrations": {
			"Google Analytics": {"clientId": GOOGLE_ANALYTICS_ID},
			"Something Enabled": true,
			"Something Disabled": false,
		},
		"ip": IP_ADDRESS,
		"language": LANGUAGE,
		"userAgent": USER_AGENT,
		"Intercom": INTERCOM,
	}) else {
		unreachable!()
	};

	service.identify_with_traits(USER_ID, &traits, Some(now), &options);

	let Message::Identify(message) = client.single() else {
		panic!("expected identify");
	};
	assert_eq!(message.common.anonymous_id.as_deref(), Some(ANONYMOUS_ID));
	assert_eq!(message.common.timestamp, Some(now));
	assert_full_integrations(&message.common);
	assert_full_context(&message.common);
	assert_category(message.traits.as_ref());
}

#[test]
#[allow(deprecated)]
fn deprecated_page_and_screen_with_category() {
	let (client, service) = setup();
	let mut properties = JsonMap::new();
	properties.insert("section".to_string(), json!(SECTION));

	service.page_with_properties(USER_ID, NAME, Some(CATEGORY), &properties, None, &JsonMap::new());
	service.screen_with_properties(USER_ID, NAME, None, &properties, None, &JsonMap::new());

	let messages = client.messages.lock().unwrap();
	assert_eq!(messages.len(), 2);
	assert_category_and_section(messages[0].payload());
	assert_eq!(
		Value::Object(messages[1].payload().cloned().unwrap()),
		json!({"section": SECTION})
	);
}

#[test]
#[allow(deprecated)]
fn deprecated_group_and_track() {
	let (client, service) = setup();
	let mut payload = JsonMap::new();
	payload.insert("category".to_string(), json!(CATEGORY));

	service.group_with_traits(USER_ID, GROUP_ID, &payload, None, &JsonMap::new());
	service.track_with_properties(USER_ID, EVENT, &payload, None, &JsonMap::new());

	let messages = client.messages.lock().unwrap();
	assert_eq!(messages.len(), 2);
	assert!(matches!(&messages[0], Message::Group(g) if g.group_id == GROUP_ID));
	assert!(matches!(&messages[1], Message::Track(t) if t.event == EVENT));
	for message in messages.iter() {
		assert_category(message.payload());
		assert_default_context(message.common());
	}
}

#[test]
fn caller_configuration_overrides_default_options() {
	let (client, service) = setup();
	service.track_with(USER_ID, EVENT, |b| b.context("language", LANGUAGE));

	let message = client.single();
	let context = message.context().unwrap();
	assert_eq!(context["language"], LANGUAGE);
	assert_eq!(context["userAgent"], DEFAULT_USER_AGENT);
}

#[test]
fn blocking_flush_waits_for_executor() {
	let executor = NetworkExecutor::start().unwrap();
	let client = Arc::new(RecordingClient::with_executor(executor.clone()));
	let service = DefaultAnalyticsService::new(client.clone())
		.with_flush_mode(FlushMode::Blocking)
		.with_probe(Duration::from_millis(10), Duration::from_secs(5));

	let uploaded = Arc::new(AtomicUsize::new(0));
	let counter = uploaded.clone();
	executor
		.submit(Box::new(move || {
			std::thread::sleep(Duration::from_millis(50));
			counter.fetch_add(1, Ordering::SeqCst);
		}))
		.unwrap();

	service.flush().unwrap();
	assert_eq!(uploaded.load(Ordering::SeqCst), 1);
	assert_eq!(client.flushes.load(Ordering::SeqCst), 1);
	executor.shutdown();
}

#[test]
fn blocking_flush_times_out() {
	let executor = NetworkExecutor::start().unwrap();
	let client = Arc::new(RecordingClient::with_executor(executor.clone()));
	let service = DefaultAnalyticsService::new(client)
		.with_flush_mode(FlushMode::Blocking)
		.with_probe(Duration::ZERO, Duration::from_millis(100));

	executor
		.submit(Box::new(|| std::thread::sleep(Duration::from_millis(500))))
		.unwrap();

	let err = service.flush().unwrap_err();
	assert!(matches!(err, AnalyticsError::FlushFailed(_)));
	executor.shutdown();
}

#[test]
fn service_for_client_honours_config() {
	let client = Arc::new(RecordingClient::default());
	let config = SegmentConfig::new("some-api-key").with_options(default_options());
	let service = service_for_client(Some(client.clone() as Arc<dyn AnalyticsClient>), Some(&config));

	service.track_event(USER_ID, EVENT);
	assert_default_context(client.single().common());
}

#[test]
fn service_without_client_skips_configuration() {
	let config = SegmentConfig::new("some-api-key");
	let service = service_for_client(None, Some(&config));
	let configured = AtomicUsize::new(0);

	service.alias_with(PREVIOUS_ID, USER_ID, |b| {
		configured.fetch_add(1, Ordering::SeqCst);
		b
	});
	service.group_with(USER_ID, GROUP_ID, |b| {
		configured.fetch_add(1, Ordering::SeqCst);
		b
	});
	service.identify_with(USER_ID, |b| {
		configured.fetch_add(1, Ordering::SeqCst);
		b
	});
	service.page_with(USER_ID, NAME, |b| {
		configured.fetch_add(1, Ordering::SeqCst);
		b
	});
	service.screen_with(USER_ID, NAME, |b| {
		configured.fetch_add(1, Ordering::SeqCst);
		b
	});
	service.track_with(USER_ID, EVENT, |b| {
		configured.fetch_add(1, Ordering::SeqCst);
		b
	});

	assert!(service.flush().is_ok());
	assert_eq!(configured.load(Ordering::SeqCst), 0);
}
