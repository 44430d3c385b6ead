use std::fmt;
use std::fmt::Debug;
use std::sync::Arc;

use crate::error::TellError;
use crate::mailbox::Mailbox;
use crate::mailbox::Pushed;
use crate::message::Message;
use crate::stats::ActorStats;
use crate::stats::ActorStatus;

/// Identity of an actor within its [`System`](crate::System).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActorId {
	seq: u64,
	name: Option<Arc<str>>,
}

impl ActorId {
	pub(crate) fn new(seq: u64, name: Option<Arc<str>>) -> Self {
		Self { seq, name }
	}

	pub fn seq(&self) -> u64 {
		self.seq
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}
}

impl fmt::Display for ActorId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.name {
			Some(name) => write!(f, "{name}#{}", self.seq),
			None => write!(f, "actor#{}", self.seq),
		}
	}
}

impl Debug for ActorId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

pub(crate) struct Cell<T> {
	pub id: ActorId,
	pub mailbox: Mailbox<T>,
	pub stats: Arc<ActorStats>,
}

/// Send-only handle to an actor accepting messages of type `T`.
///
/// Addresses are cheap to clone and may be shared with any number of
/// concurrent senders. An address always refers to the same actor.
pub struct Address<T> {
	pub(crate) cell: Arc<Cell<T>>,
}

impl<T> Clone for Address<T> {
	fn clone(&self) -> Self {
		Self {
			cell: self.cell.clone(),
		}
	}
}

impl<T> PartialEq for Address<T> {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.cell, &other.cell)
	}
}

impl<T> Eq for Address<T> {}

impl<T> Debug for Address<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Address")
			.field("id", &self.cell.id)
			.field("status", &self.cell.stats.status())
			.finish()
	}
}

impl<T> Address<T> {
	pub(crate) fn new(cell: Cell<T>) -> Self {
		Self {
			cell: Arc::new(cell),
		}
	}

	pub fn id(&self) -> &ActorId {
		&self.cell.id
	}

	pub fn status(&self) -> ActorStatus {
		self.cell.stats.status()
	}

	pub fn stats(&self) -> &ActorStats {
		&self.cell.stats
	}

	/// Messages enqueued but not yet dequeued.
	pub fn mailbox_len(&self) -> usize {
		self.cell.mailbox.len()
	}
}

impl<T: Message> Address<T> {
	/// Enqueue `msg` without waiting. Never fails.
	///
	/// With an unbounded mailbox the message is always queued. A full bounded
	/// mailbox applies its overflow policy; whatever is lost is logged and
	/// counted in [`ActorStats::dropped`].
	pub fn tell(&self, msg: T) -> &Self {
		match self.cell.mailbox.push(msg) {
			Ok(Pushed::Queued) => {}
			Ok(Pushed::Evicted(old)) => {
				self.cell.stats.record_dropped();
				tracing::warn!(actor = %self.cell.id, msg = ?old, "Mailbox full, dropped oldest message");
			}
			Err(TellError::Full(msg)) => {
				self.cell.stats.record_dropped();
				tracing::warn!(actor = %self.cell.id, msg = ?msg, "Mailbox full, rejected message");
			}
		}
		self
	}

	/// Like [`Address::tell`] but hands a rejected message back.
	pub fn try_tell(&self, msg: T) -> Result<(), TellError<T>> {
		match self.cell.mailbox.push(msg)? {
			Pushed::Queued => {}
			Pushed::Evicted(old) => {
				self.cell.stats.record_dropped();
				tracing::warn!(actor = %self.cell.id, msg = ?old, "Mailbox full, dropped oldest message");
			}
		}
		Ok(())
	}

	/// Enqueue `msg`, waiting for room if the mailbox is bounded and full.
	pub async fn send(&self, msg: T) {
		self.cell.mailbox.push_wait(msg).await
	}
}
