use std::collections::VecDeque;
use std::pin::pin;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::TellError;

/// What a bounded mailbox does with a message that does not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
	/// Evict the oldest queued message to make room.
	DropOldest,
	/// Refuse the new message.
	#[default]
	Reject,
}

#[derive(Debug, Clone, Default)]
pub struct MailboxConfig {
	/// `None` means unbounded.
	pub capacity: Option<usize>,
	pub overflow: Overflow,
}

impl MailboxConfig {
	pub fn unbounded() -> Self {
		Self::default()
	}

	pub fn bounded(capacity: usize, overflow: Overflow) -> Self {
		assert!(capacity > 0, "Mailbox capacity must be positive");
		Self {
			capacity: Some(capacity),
			overflow,
		}
	}
}

/// Result of a successful enqueue.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Pushed<T> {
	Queued,
	/// The message was queued after evicting this one.
	Evicted(T),
}

/// FIFO queue owned by exactly one execution unit.
///
/// Any number of senders may push concurrently; only the owning unit calls
/// [`Mailbox::recv`].
pub(crate) struct Mailbox<T> {
	queue: Mutex<VecDeque<T>>,
	config: MailboxConfig,
	readable: Notify,
	writable: Notify,
}

impl<T> Mailbox<T> {
	pub fn new(config: MailboxConfig) -> Self {
		let queue = match config.capacity {
			Some(capacity) => VecDeque::with_capacity(capacity),
			None => VecDeque::new(),
		};

		Self {
			queue: Mutex::new(queue),
			config,
			readable: Notify::new(),
			writable: Notify::new(),
		}
	}

	pub fn len(&self) -> usize {
		self.queue.lock().len()
	}

	/// Enqueue without waiting, applying the overflow policy when full.
	pub fn push(&self, msg: T) -> Result<Pushed<T>, TellError<T>> {
		let pushed = {
			let mut queue = self.queue.lock();
			match self.config.capacity {
				Some(capacity) if queue.len() >= capacity => match self.config.overflow {
					Overflow::Reject => return Err(TellError::Full(msg)),
					Overflow::DropOldest => {
						let evicted = queue.pop_front();
						queue.push_back(msg);
						match evicted {
							Some(evicted) => Pushed::Evicted(evicted),
							None => Pushed::Queued,
						}
					}
				},
				_ => {
					queue.push_back(msg);
					Pushed::Queued
				}
			}
		};

		// a stored permit covers a receiver that is about to park
		self.readable.notify_one();
		Ok(pushed)
	}

	/// Enqueue, waiting for room instead of applying the overflow policy.
	pub async fn push_wait(&self, msg: T) {
		loop {
			let mut notified = pin!(self.writable.notified());
			notified.as_mut().enable();

			{
				let mut queue = self.queue.lock();
				let full = matches!(self.config.capacity, Some(capacity) if queue.len() >= capacity);
				if !full {
					queue.push_back(msg);
					drop(queue);
					self.readable.notify_one();
					return;
				}
			}

			notified.await;
		}
	}

	/// Wait for the next message. The only suspension point of an actor.
	pub async fn recv(&self) -> T {
		loop {
			let next = self.queue.lock().pop_front();
			if let Some(msg) = next {
				if self.config.capacity.is_some() {
					self.writable.notify_one();
				}
				return msg;
			}

			self.readable.notified().await;
		}
	}
}
