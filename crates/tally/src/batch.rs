// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Message batching on a background looper thread.
//!
//! The looper collects queued messages and hands each full batch to the
//! [`NetworkExecutor`] as an upload job. A batch is cut when it reaches
//! `max_batch_size`, when `flush_interval` elapses, on an explicit flush and
//! on shutdown.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tally_core::Message;
use tracing::{debug, error, info, warn};

use crate::error::{AnalyticsError, Result};
use crate::executor::NetworkExecutor;

const THREAD_NAME: &str = "tally-looper";

/// Configuration for the message batch queue.
#[derive(Debug, Clone)]
pub struct BatchConfig {
	/// Maximum number of messages per upload.
	pub max_batch_size: usize,
	/// Interval between automatic flushes.
	pub flush_interval: Duration,
	/// Capacity of the queue in front of the looper. Messages beyond this
	/// are dropped.
	pub max_queue_size: usize,
}

impl Default for BatchConfig {
	fn default() -> Self {
		Self {
			max_batch_size: tally_config::DEFAULT_FLUSH_QUEUE_SIZE,
			flush_interval: tally_config::DEFAULT_FLUSH_INTERVAL,
			max_queue_size: 10_000,
		}
	}
}

/// Command sent to the looper.
#[derive(Debug)]
pub enum BatchCommand {
	/// Queue a message.
	Enqueue(Message),
	/// Upload whatever is queued now.
	Flush,
	/// Upload whatever is queued and stop.
	Shutdown,
}

/// Delivers one batch of messages.
pub trait BatchSender: Send + Sync {
	fn send_batch(&self, messages: Vec<Message>) -> Result<()>;
}

/// Starts the looper thread reading from `receiver`.
pub(crate) fn spawn_looper(
	config: BatchConfig,
	receiver: Receiver<BatchCommand>,
	sender: Arc<dyn BatchSender>,
	executor: NetworkExecutor,
) -> Result<JoinHandle<()>> {
	std::thread::Builder::new()
		.name(THREAD_NAME.to_string())
		.spawn(move || {
			Looper {
				config,
				sender,
				executor,
				batch: Vec::new(),
			}
			.run(receiver)
		})
		.map_err(|source| AnalyticsError::ThreadSpawn {
			name: THREAD_NAME,
			source,
		})
}

struct Looper {
	config: BatchConfig,
	sender: Arc<dyn BatchSender>,
	executor: NetworkExecutor,
	batch: Vec<Message>,
}

impl Looper {
	fn run(mut self, receiver: Receiver<BatchCommand>) {
		info!(
			flush_interval_ms = self.config.flush_interval.as_millis() as u64,
			max_batch_size = self.config.max_batch_size,
			"Starting analytics looper"
		);

		let mut deadline = Instant::now() + self.config.flush_interval;
		loop {
			let wait = deadline.saturating_duration_since(Instant::now());
			match receiver.recv_timeout(wait) {
				Ok(BatchCommand::Enqueue(message)) => {
					self.batch.push(message);
					if self.batch.len() >= self.config.max_batch_size {
						self.upload();
					}
				}
				Ok(BatchCommand::Flush) => self.upload(),
				Ok(BatchCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
					self.upload();
					break;
				}
				Err(RecvTimeoutError::Timeout) => {
					self.upload();
					deadline = Instant::now() + self.config.flush_interval;
				}
			}
		}

		info!("Analytics looper stopped");
	}

	fn upload(&mut self) {
		if self.batch.is_empty() {
			return;
		}

		let messages = std::mem::take(&mut self.batch);
		let count = messages.len();
		let sender = self.sender.clone();

		debug!(count, "Submitting message batch");
		let submitted = self.executor.submit(Box::new(move || {
			if let Err(e) = sender.send_batch(messages) {
				error!(error = %e, count, "Failed to upload analytics batch");
			}
		}));

		if submitted.is_err() {
			warn!(count, "Network executor stopped, dropping analytics batch");
		}
	}
}
