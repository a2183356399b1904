// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Single-threaded executor for network jobs.
//!
//! Jobs run one at a time in submission order on a dedicated thread. A probe
//! job submitted after some work therefore completes only once that work has
//! finished, which is what the blocking flush relies on.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, error};

use crate::error::{AnalyticsError, Result};

/// A unit of work run on the network thread.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

const THREAD_NAME: &str = "tally-network";

struct Inner {
	sender: Mutex<Option<Sender<Job>>>,
	handle: Mutex<Option<JoinHandle<()>>>,
}

/// Handle to the network thread. Clones share the same thread.
#[derive(Clone)]
pub struct NetworkExecutor {
	inner: Arc<Inner>,
}

impl NetworkExecutor {
	/// Starts the network thread.
	pub fn start() -> Result<Self> {
		let (sender, receiver) = crossbeam_channel::unbounded::<Job>();

		let handle = std::thread::Builder::new()
			.name(THREAD_NAME.to_string())
			.spawn(move || run(receiver))
			.map_err(|source| AnalyticsError::ThreadSpawn {
				name: THREAD_NAME,
				source,
			})?;

		Ok(Self {
			inner: Arc::new(Inner {
				sender: Mutex::new(Some(sender)),
				handle: Mutex::new(Some(handle)),
			}),
		})
	}

	/// Queues a job behind everything already submitted.
	pub fn submit(&self, job: Job) -> Result<()> {
		let sender = self
			.inner
			.sender
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.clone()
			.ok_or(AnalyticsError::ClientShutdown)?;

		sender.send(job).map_err(|_| AnalyticsError::ClientShutdown)
	}

	/// Waits for every previously submitted job to finish.
	///
	/// Sleeps `pre_sleep` first so work handed over by other threads just
	/// before the call has a chance to land in the queue.
	pub fn probe(&self, pre_sleep: Duration, timeout: Duration) -> Result<()> {
		if !pre_sleep.is_zero() {
			std::thread::sleep(pre_sleep);
		}

		let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(1);
		self
			.submit(Box::new(move || {
				let _ = done_tx.send(());
			}))
			.map_err(|_| AnalyticsError::FlushFailed("network executor is stopped".to_string()))?;

		match done_rx.recv_timeout(timeout) {
			Ok(()) => {
				debug!("flush probe completed");
				Ok(())
			}
			Err(RecvTimeoutError::Timeout) => Err(AnalyticsError::FlushFailed(format!(
				"probe did not complete within {}ms",
				timeout.as_millis()
			))),
			Err(RecvTimeoutError::Disconnected) => Err(AnalyticsError::FlushFailed(
				"network executor stopped before the probe ran".to_string(),
			)),
		}
	}

	/// Returns true once [`shutdown`](Self::shutdown) has been called.
	pub fn is_shutdown(&self) -> bool {
		self
			.inner
			.sender
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.is_none()
	}

	/// Stops accepting jobs, runs what is queued and joins the thread.
	pub fn shutdown(&self) {
		self
			.inner
			.sender
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.take();

		let handle = self
			.inner
			.handle
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.take();

		if let Some(handle) = handle {
			if handle.thread().id() == std::thread::current().id() {
				return;
			}
			if handle.join().is_err() {
				error!("network thread panicked");
			}
		}
	}
}

impl std::fmt::Debug for NetworkExecutor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("NetworkExecutor")
			.field("shutdown", &self.is_shutdown())
			.finish()
	}
}

fn run(receiver: Receiver<Job>) {
	debug!("network thread started");
	for job in receiver {
		if catch_unwind(AssertUnwindSafe(job)).is_err() {
			error!("network job panicked");
		}
	}
	debug!("network thread stopped");
}
