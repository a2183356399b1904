// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end delivery against a mock Segment API.

use std::time::Duration;

use serde_json::Value;
use tally::{
	analytics_service, AnalyticsService, AnalyticsServiceExt, FlushMode, MessageBuilder,
	MessageHooks, SegmentConfig,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const API_KEY: &str = "some-api-key";
// base64("some-api-key:")
const BASIC_AUTH: &str = "Basic c29tZS1hcGkta2V5Og==";

fn config(server: &MockServer) -> SegmentConfig {
	SegmentConfig::new(API_KEY)
		.with_endpoint(server.uri())
		.with_flush_interval(Duration::from_secs(60))
		.with_flush_mode(FlushMode::Blocking)
		.with_probe(Duration::from_millis(100), Duration::from_secs(5))
}

fn batch_bodies(requests: &[Request]) -> Vec<Value> {
	requests
		.iter()
		.map(|r| serde_json::from_slice(&r.body).unwrap())
		.collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn blocking_flush_uploads_batch() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/v1/batch"))
		.and(header("authorization", BASIC_AUTH))
		.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
		.expect(1)
		.mount(&server)
		.await;

	let config = config(&server);
	tokio::task::spawn_blocking(move || {
		let analytics = analytics_service(Some(&config), MessageHooks::default());
		assert!(analytics.is_enabled());

		analytics.identify_with("user-id", |b| b.traits("category", "VIP"));
		analytics.track_with("user-id", "USER_LOGGED_IN", |b| {
			b.properties("category", "VIP").context("ip", "10.0.0.1")
		});
		analytics.flush().unwrap();
		analytics.shutdown();
	})
	.await
	.unwrap();

	let bodies = batch_bodies(&server.received_requests().await.unwrap());
	assert_eq!(bodies.len(), 1);

	let body = &bodies[0];
	assert_eq!(body["context"]["library"]["name"], "tally");
	assert!(body["sentAt"].is_string());

	let batch = body["batch"].as_array().unwrap();
	assert_eq!(batch.len(), 2);
	assert_eq!(batch[0]["type"], "identify");
	assert_eq!(batch[0]["userId"], "user-id");
	assert_eq!(batch[0]["traits"]["category"], "VIP");
	assert_eq!(batch[1]["type"], "track");
	assert_eq!(batch[1]["event"], "USER_LOGGED_IN");
	assert_eq!(batch[1]["context"]["ip"], "10.0.0.1");
	assert!(batch[1]["messageId"].is_string());
	assert!(batch[1].get("timestamp").is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn batches_split_at_queue_size() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/v1/batch"))
		.respond_with(ResponseTemplate::new(200))
		.mount(&server)
		.await;

	let config = config(&server).with_flush_queue_size(2);
	tokio::task::spawn_blocking(move || {
		let analytics = analytics_service(Some(&config), MessageHooks::default());
		for i in 0..5 {
			analytics.track_event("user-id", &format!("EVENT_{i}"));
		}
		analytics.flush().unwrap();
		analytics.shutdown();
	})
	.await
	.unwrap();

	let sizes: Vec<usize> = batch_bodies(&server.received_requests().await.unwrap())
		.iter()
		.map(|b| b["batch"].as_array().unwrap().len())
		.collect();
	assert_eq!(sizes, vec![2, 2, 1]);
}

#[tokio::test(flavor = "multi_thread")]
async fn server_errors_are_not_retried() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/v1/batch"))
		.respond_with(ResponseTemplate::new(500).set_body_string("unavailable"))
		.expect(1)
		.mount(&server)
		.await;

	let config = config(&server);
	tokio::task::spawn_blocking(move || {
		let analytics = analytics_service(Some(&config), MessageHooks::default());
		analytics.track_event("user-id", "EVENT");
		assert!(analytics.flush().is_ok());
		analytics.shutdown();
	})
	.await
	.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_uploads_pending_messages() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/v1/batch"))
		.respond_with(ResponseTemplate::new(200))
		.expect(1)
		.mount(&server)
		.await;

	let config = config(&server).with_flush_mode(FlushMode::Async);
	tokio::task::spawn_blocking(move || {
		let analytics = analytics_service(Some(&config), MessageHooks::default());
		analytics.page_view("user-id", "Home");
		analytics.shutdown();
	})
	.await
	.unwrap();
}
