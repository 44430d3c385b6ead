use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use dashmap::DashMap;

use crate::address::ActorId;

/// Lifecycle state of an actor's execution unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ActorStatus {
	/// Waiting for or processing messages.
	Running = 0,
	/// A behavior returned `Effect::Die`; messages are now dead letters.
	Dead = 1,
	/// A behavior failed or panicked; the execution unit is gone and
	/// messages accumulate unread.
	Halted = 2,
	/// The owning system was shut down.
	Stopped = 3,
}

impl ActorStatus {
	fn from_u8(value: u8) -> Self {
		match value {
			0 => ActorStatus::Running,
			1 => ActorStatus::Dead,
			2 => ActorStatus::Halted,
			_ => ActorStatus::Stopped,
		}
	}
}

impl fmt::Display for ActorStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			ActorStatus::Running => "running",
			ActorStatus::Dead => "dead",
			ActorStatus::Halted => "halted",
			ActorStatus::Stopped => "stopped",
		};
		f.write_str(label)
	}
}

/// Counters shared between an actor's address and its execution unit.
#[derive(Debug)]
pub struct ActorStats {
	processed: AtomicU64,
	dead_letters: AtomicU64,
	dropped: AtomicU64,
	status: AtomicU8,
}

impl Default for ActorStats {
	fn default() -> Self {
		Self {
			processed: AtomicU64::new(0),
			dead_letters: AtomicU64::new(0),
			dropped: AtomicU64::new(0),
			status: AtomicU8::new(ActorStatus::Running as u8),
		}
	}
}

impl ActorStats {
	/// Messages handed to a live behavior.
	pub fn processed(&self) -> u64 {
		self.processed.load(Ordering::Relaxed)
	}

	/// Messages received after the actor died.
	pub fn dead_letters(&self) -> u64 {
		self.dead_letters.load(Ordering::Relaxed)
	}

	/// Messages lost to a bounded mailbox's overflow policy.
	pub fn dropped(&self) -> u64 {
		self.dropped.load(Ordering::Relaxed)
	}

	pub fn status(&self) -> ActorStatus {
		ActorStatus::from_u8(self.status.load(Ordering::Acquire))
	}

	pub(crate) fn record_processed(&self) {
		self.processed.fetch_add(1, Ordering::Relaxed);
		metrics::counter!("actor_messages_processed").increment(1);
	}

	pub(crate) fn record_dead_letter(&self) {
		self.dead_letters.fetch_add(1, Ordering::Relaxed);
		metrics::counter!("actor_dead_letters").increment(1);
	}

	pub(crate) fn record_dropped(&self) {
		self.dropped.fetch_add(1, Ordering::Relaxed);
		metrics::counter!("actor_messages_dropped").increment(1);
	}

	pub(crate) fn set_status(&self, status: ActorStatus) {
		self.status.store(status as u8, Ordering::Release);
	}

	/// Move to `status` unless the actor already reached `Halted` or
	/// `Stopped`.
	pub(crate) fn transition_status(&self, status: ActorStatus) {
		let _ = self
			.status
			.fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
				match ActorStatus::from_u8(current) {
					ActorStatus::Running | ActorStatus::Dead => Some(status as u8),
					ActorStatus::Halted | ActorStatus::Stopped => None,
				}
			});
	}
}

/// Per-system table of live actor statistics.
#[derive(Debug, Default)]
pub(crate) struct Registry {
	actors: DashMap<ActorId, Arc<ActorStats>>,
}

impl Registry {
	pub fn register(&self, id: ActorId) -> Arc<ActorStats> {
		let stats = Arc::new(ActorStats::default());
		self.actors.insert(id, stats.clone());
		stats
	}

	pub fn len(&self) -> usize {
		self.actors.len()
	}

	pub fn for_each(&self, mut func: impl FnMut(&ActorId, &ActorStats)) {
		for entry in self.actors.iter() {
			func(entry.key(), entry.value());
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
	pub processed: u64,
	pub dead_letters: u64,
	pub dropped: u64,
	pub status: ActorStatus,
}

/// A snapshot of every actor's counters, sorted by actor id.
#[derive(Debug, Clone)]
pub struct Report {
	rows: BTreeMap<ActorId, ReportRow>,
}

impl Report {
	pub(crate) fn new(registry: &Registry) -> Self {
		let mut rows = BTreeMap::new();
		registry.for_each(|id, stats| {
			rows.insert(
				id.clone(),
				ReportRow {
					processed: stats.processed(),
					dead_letters: stats.dead_letters(),
					dropped: stats.dropped(),
					status: stats.status(),
				},
			);
		});
		Self { rows }
	}

	pub fn get(&self, id: &ActorId) -> Option<&ReportRow> {
		self.rows.get(id)
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn rows(&self) -> impl Iterator<Item = (&ActorId, &ReportRow)> {
		self.rows.iter()
	}
}

impl fmt::Display for Report {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name_width = self
			.rows
			.keys()
			.map(|k| k.to_string().len())
			.max()
			.unwrap_or(0)
			.max(5);

		let width = 12;

		writeln!(
			f,
			"{:<name_width$} {:>width$} {:>width$} {:>width$} {:>width$}",
			"actor", "processed", "dead", "dropped", "status"
		)?;

		for (id, row) in &self.rows {
			writeln!(
				f,
				"{:<name_width$} {:>width$} {:>width$} {:>width$} {:>width$}",
				id.to_string(),
				row.processed,
				row.dead_letters,
				row.dropped,
				row.status.to_string(),
			)?;
		}
		Ok(())
	}
}
