// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Hooks run on every message before it is queued for delivery.
//!
//! Transformers mutate a message in place and run first. Interceptors may
//! replace the message and run second. Either kind can drop the message:
//! a transformer by returning `false`, an interceptor by returning `None`.

use std::sync::Arc;

use tally_core::Message;
use tracing::trace;

/// Mutates a message in place. Returning `false` drops the message.
pub trait MessageTransformer: Send + Sync {
	fn transform(&self, message: &mut Message) -> bool;
}

/// Inspects a message and returns the message to send, if any.
pub trait MessageInterceptor: Send + Sync {
	fn intercept(&self, message: Message) -> Option<Message>;
}

impl<F> MessageTransformer for F
where
	F: Fn(&mut Message) -> bool + Send + Sync,
{
	fn transform(&self, message: &mut Message) -> bool {
		self(message)
	}
}

impl<F> MessageInterceptor for F
where
	F: Fn(Message) -> Option<Message> + Send + Sync,
{
	fn intercept(&self, message: Message) -> Option<Message> {
		self(message)
	}
}

/// Ordered set of transformers and interceptors registered with a client.
#[derive(Clone, Default)]
pub struct MessageHooks {
	transformers: Vec<Arc<dyn MessageTransformer>>,
	interceptors: Vec<Arc<dyn MessageInterceptor>>,
}

impl MessageHooks {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_transformer(mut self, transformer: Arc<dyn MessageTransformer>) -> Self {
		self.transformers.push(transformer);
		self
	}

	pub fn with_interceptor(mut self, interceptor: Arc<dyn MessageInterceptor>) -> Self {
		self.interceptors.push(interceptor);
		self
	}

	pub fn is_empty(&self) -> bool {
		self.transformers.is_empty() && self.interceptors.is_empty()
	}

	/// Runs every hook in registration order.
	pub fn apply(&self, mut message: Message) -> Option<Message> {
		for transformer in &self.transformers {
			if !transformer.transform(&mut message) {
				trace!(kind = %message.kind(), "message dropped by transformer");
				return None;
			}
		}

		for interceptor in &self.interceptors {
			let kind = message.kind();
			match interceptor.intercept(message) {
				Some(next) => message = next,
				None => {
					trace!(%kind, "message dropped by interceptor");
					return None;
				}
			}
		}

		Some(message)
	}
}

impl std::fmt::Debug for MessageHooks {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MessageHooks")
			.field("transformers", &self.transformers.len())
			.field("interceptors", &self.interceptors.len())
			.finish()
	}
}
