// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delivery client for the Segment HTTP tracking API.
//!
//! [`SegmentClient`] owns two background threads: a looper that batches
//! queued messages and a [`NetworkExecutor`] that uploads them. Queuing never
//! blocks the caller; when the queue is full the message is dropped with a
//! warning.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam_channel::{Sender, TrySendError};
use serde::Serialize;
use tally_config::{
	ApiKey, SegmentConfig, DEFAULT_ENDPOINT, DEFAULT_REQUEST_TIMEOUT, MIN_INTERVAL,
};
use tally_core::Message;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::batch::{spawn_looper, BatchCommand, BatchConfig, BatchSender};
use crate::error::{AnalyticsError, Result};
use crate::executor::NetworkExecutor;
use crate::hooks::{MessageHooks, MessageInterceptor, MessageTransformer};

/// Library name reported in every upload.
pub const LIBRARY_NAME: &str = "tally";
/// Library version reported in every upload.
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");

const BATCH_PATH: &str = "/v1/batch";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A client that accepts built messages for asynchronous delivery.
pub trait AnalyticsClient: Send + Sync {
	/// Queues a message. Never blocks and never fails.
	fn enqueue(&self, message: Message);

	/// Asks the client to upload everything queued so far. Never blocks.
	fn flush(&self);

	/// Uploads what is queued and stops the background threads.
	fn shutdown(&self);

	/// The executor running uploads, if the client has one.
	fn network_executor(&self) -> Option<NetworkExecutor> {
		None
	}
}

/// Builder for constructing a [`SegmentClient`].
pub struct SegmentClientBuilder {
	api_key: Option<String>,
	endpoint: String,
	request_timeout: Duration,
	batch: BatchConfig,
	hooks: MessageHooks,
	batch_sender: Option<Arc<dyn BatchSender>>,
}

impl Default for SegmentClientBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl SegmentClientBuilder {
	pub fn new() -> Self {
		Self {
			api_key: None,
			endpoint: DEFAULT_ENDPOINT.to_string(),
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			batch: BatchConfig::default(),
			hooks: MessageHooks::default(),
			batch_sender: None,
		}
	}

	/// Starts from a resolved configuration section.
	pub fn from_config(config: &SegmentConfig) -> Self {
		Self::new()
			.api_key(config.api_key.expose())
			.endpoint(config.endpoint.clone())
			.request_timeout(config.request_timeout)
			.flush_queue_size(config.flush_queue_size)
			.flush_interval(config.flush_interval)
	}

	/// Sets the Segment write key.
	pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
		self.api_key = Some(api_key.into());
		self
	}

	/// Sets the API base URL.
	///
	/// Example: `https://api.segment.io`
	pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.endpoint = endpoint.into();
		self
	}

	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}

	/// Sets the number of messages that triggers an upload.
	pub fn flush_queue_size(mut self, size: usize) -> Self {
		self.batch.max_batch_size = size;
		self
	}

	pub fn flush_interval(mut self, interval: Duration) -> Self {
		self.batch.flush_interval = interval;
		self
	}

	/// Sets how many messages may wait for the looper before new ones are dropped.
	pub fn max_queue_size(mut self, size: usize) -> Self {
		self.batch.max_queue_size = size;
		self
	}

	pub fn hooks(mut self, hooks: MessageHooks) -> Self {
		self.hooks = hooks;
		self
	}

	pub fn transformer(mut self, transformer: Arc<dyn MessageTransformer>) -> Self {
		self.hooks = self.hooks.with_transformer(transformer);
		self
	}

	pub fn interceptor(mut self, interceptor: Arc<dyn MessageInterceptor>) -> Self {
		self.hooks = self.hooks.with_interceptor(interceptor);
		self
	}

	/// Replaces the HTTP uploader.
	pub fn batch_sender(mut self, sender: Arc<dyn BatchSender>) -> Self {
		self.batch_sender = Some(sender);
		self
	}

	/// Builds the client and starts its background threads.
	pub fn build(self) -> Result<SegmentClient> {
		let api_key = self
			.api_key
			.filter(|k| !k.trim().is_empty())
			.map(ApiKey::new)
			.ok_or(AnalyticsError::InvalidApiKey)?;

		if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
			return Err(AnalyticsError::InvalidEndpoint(self.endpoint));
		}
		let endpoint = self.endpoint.trim_end_matches('/').to_string();

		let request_timeout = self.request_timeout.max(MIN_INTERVAL);
		let sender: Arc<dyn BatchSender> = match self.batch_sender {
			Some(sender) => sender,
			None => Arc::new(HttpBatchSender::new(&endpoint, api_key, request_timeout)?),
		};

		let batch = BatchConfig {
			max_batch_size: self.batch.max_batch_size.max(1),
			flush_interval: self.batch.flush_interval.max(MIN_INTERVAL),
			max_queue_size: self.batch.max_queue_size.max(1),
		};

		let executor = NetworkExecutor::start()?;
		let (commands, receiver) = crossbeam_channel::bounded(batch.max_queue_size);
		let looper = match spawn_looper(batch, receiver, sender, executor.clone()) {
			Ok(handle) => handle,
			Err(e) => {
				executor.shutdown();
				return Err(e);
			}
		};

		info!(endpoint = %endpoint, "Analytics client started");

		Ok(SegmentClient {
			inner: Arc::new(Inner {
				commands,
				hooks: self.hooks,
				executor,
				looper: Mutex::new(Some(looper)),
				closed: AtomicBool::new(false),
			}),
		})
	}
}

struct Inner {
	commands: Sender<BatchCommand>,
	hooks: MessageHooks,
	executor: NetworkExecutor,
	looper: Mutex<Option<JoinHandle<()>>>,
	closed: AtomicBool,
}

/// Batching client for the Segment tracking API.
///
/// Clones share the same queue and background threads. Dropping the last
/// clone without calling [`shutdown`](AnalyticsClient::shutdown) still
/// uploads what is queued, but nothing waits for it.
#[derive(Clone)]
pub struct SegmentClient {
	inner: Arc<Inner>,
}

impl SegmentClient {
	pub fn builder() -> SegmentClientBuilder {
		SegmentClientBuilder::new()
	}

	pub fn is_shutdown(&self) -> bool {
		self.inner.closed.load(Ordering::SeqCst)
	}
}

impl AnalyticsClient for SegmentClient {
	fn enqueue(&self, message: Message) {
		if self.is_shutdown() {
			warn!(kind = %message.kind(), "Analytics client is shut down, dropping message");
			return;
		}

		let Some(mut message) = self.inner.hooks.apply(message) else {
			return;
		};

		if message.message_id().is_none() {
			message.common_mut().message_id = Some(Uuid::new_v4().to_string());
		}

		let kind = message.kind();
		match self.inner.commands.try_send(BatchCommand::Enqueue(message)) {
			Ok(()) => {}
			Err(TrySendError::Full(_)) => {
				warn!(%kind, "Analytics queue is full, dropping message")
			}
			Err(TrySendError::Disconnected(_)) => {
				warn!(%kind, "Analytics looper stopped, dropping message")
			}
		}
	}

	fn flush(&self) {
		if self.is_shutdown() {
			return;
		}
		match self.inner.commands.try_send(BatchCommand::Flush) {
			Ok(()) => {}
			Err(TrySendError::Full(_)) => warn!("Analytics queue is full, flush skipped"),
			Err(TrySendError::Disconnected(_)) => warn!("Analytics looper stopped, flush ignored"),
		}
	}

	fn shutdown(&self) {
		if self.inner.closed.swap(true, Ordering::SeqCst) {
			return;
		}

		info!("Shutting down analytics client");
		let _ = self.inner.commands.send(BatchCommand::Shutdown);

		let looper = self
			.inner
			.looper
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.take();
		if let Some(handle) = looper {
			if handle.join().is_err() {
				error!("Analytics looper panicked");
			}
		}

		self.inner.executor.shutdown();
		info!("Analytics client shut down");
	}

	fn network_executor(&self) -> Option<NetworkExecutor> {
		Some(self.inner.executor.clone())
	}
}

impl std::fmt::Debug for SegmentClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SegmentClient")
			.field("hooks", &self.inner.hooks)
			.field("shutdown", &self.is_shutdown())
			.finish()
	}
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchPayload<'a> {
	batch: &'a [Message],
	sent_at: DateTime<Utc>,
	context: PayloadContext,
}

#[derive(Serialize)]
struct PayloadContext {
	library: Library,
}

#[derive(Serialize)]
struct Library {
	name: &'static str,
	version: &'static str,
}

/// Uploads batches to `{endpoint}/v1/batch` with the write key as the basic
/// auth user name.
pub struct HttpBatchSender {
	http: reqwest::blocking::Client,
	url: String,
	api_key: ApiKey,
}

impl HttpBatchSender {
	pub fn new(endpoint: &str, api_key: ApiKey, request_timeout: Duration) -> Result<Self> {
		let http = reqwest::blocking::Client::builder()
			.user_agent(format!("{LIBRARY_NAME}/{LIBRARY_VERSION}"))
			.connect_timeout(CONNECT_TIMEOUT.min(request_timeout))
			.timeout(request_timeout)
			.build()?;

		Ok(Self {
			http,
			url: format!("{}{BATCH_PATH}", endpoint.trim_end_matches('/')),
			api_key,
		})
	}
}

impl BatchSender for HttpBatchSender {
	fn send_batch(&self, messages: Vec<Message>) -> Result<()> {
		let payload = BatchPayload {
			batch: &messages,
			sent_at: Utc::now(),
			context: PayloadContext {
				library: Library {
					name: LIBRARY_NAME,
					version: LIBRARY_VERSION,
				},
			},
		};

		let response = self
			.http
			.post(&self.url)
			.basic_auth(self.api_key.expose(), Some(""))
			.json(&payload)
			.send()?;

		let status = response.status();
		if !status.is_success() {
			let message = response.text().unwrap_or_default();
			return Err(AnalyticsError::ServerError {
				status: status.as_u16(),
				message,
			});
		}

		debug!(count = messages.len(), "Uploaded analytics batch");
		Ok(())
	}
}

impl std::fmt::Debug for HttpBatchSender {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HttpBatchSender")
			.field("url", &self.url)
			.field("api_key", &self.api_key)
			.finish()
	}
}
