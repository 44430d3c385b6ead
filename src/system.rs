use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::Instrument;

use crate::address::ActorId;
use crate::address::Address;
use crate::address::Cell;
use crate::behavior::Behavior;
use crate::behavior::BoxBehavior;
use crate::error::SystemError;
use crate::mailbox::Mailbox;
use crate::mailbox::MailboxConfig;
use crate::message::Message;
use crate::stats::ActorStats;
use crate::stats::ActorStatus;
use crate::stats::Registry;
use crate::stats::Report;

#[derive(Debug, Clone)]
pub struct SystemConfig {
	/// Shows up in the system's tracing span.
	pub name: String,
	/// Mailbox used by actors that do not configure their own.
	pub mailbox: MailboxConfig,
}

impl Default for SystemConfig {
	fn default() -> Self {
		Self {
			name: "system".to_string(),
			mailbox: MailboxConfig::unbounded(),
		}
	}
}

impl SystemConfig {
	pub fn named(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Default::default()
		}
	}

	pub fn with_mailbox(mut self, mailbox: MailboxConfig) -> Self {
		self.mailbox = mailbox;
		self
	}
}

/// Per-actor settings for [`System::actor_of_with`].
#[derive(Debug, Clone, Default)]
pub struct ActorConfig {
	pub name: Option<String>,
	pub mailbox: Option<MailboxConfig>,
}

impl ActorConfig {
	pub fn named(name: impl Into<String>) -> Self {
		Self {
			name: Some(name.into()),
			mailbox: None,
		}
	}

	pub fn with_mailbox(mut self, mailbox: MailboxConfig) -> Self {
		self.mailbox = Some(mailbox);
		self
	}
}

struct SystemInner {
	config: SystemConfig,
	handle: Handle,
	next_seq: AtomicU64,
	registry: Registry,
	units: Mutex<Vec<AbortHandle>>,
	shut_down: AtomicBool,
	span: tracing::Span,
}

/// Scheduler that runs every actor as its own tokio task.
///
/// A `System` is an ordinary value: create as many as you like, clone it
/// freely, and pass it to whatever needs to spawn actors. Tasks parked on an
/// empty mailbox cost no thread, so the actor population can be far larger
/// than the runtime's worker pool.
#[derive(Clone)]
pub struct System {
	inner: Arc<SystemInner>,
}

impl std::fmt::Debug for System {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("System")
			.field("name", &self.inner.config.name)
			.field("actors", &self.inner.registry.len())
			.finish()
	}
}

impl System {
	/// Bind a new system to the tokio runtime the caller is running in.
	pub fn new(config: SystemConfig) -> Result<Self, SystemError> {
		let handle = Handle::try_current()?;
		Ok(Self::with_handle(handle, config))
	}

	pub fn with_handle(handle: Handle, config: SystemConfig) -> Self {
		let span = tracing::info_span!("system", name = %config.name);
		Self {
			inner: Arc::new(SystemInner {
				config,
				handle,
				next_seq: AtomicU64::new(0),
				registry: Registry::default(),
				units: Mutex::new(Vec::new()),
				shut_down: AtomicBool::new(false),
				span,
			}),
		}
	}

	pub fn config(&self) -> &SystemConfig {
		&self.inner.config
	}

	/// Number of actors ever spawned by this system.
	pub fn actor_count(&self) -> usize {
		self.inner.registry.len()
	}

	pub fn is_shut_down(&self) -> bool {
		self.inner.shut_down.load(Ordering::Acquire)
	}

	/// Spawn an actor whose first behavior is built by `factory`.
	///
	/// The factory receives the actor's own address and runs on the new
	/// execution unit, before the first message is dequeued.
	pub fn actor_of<T, B, F>(&self, factory: F) -> Address<T>
	where
		T: Message,
		B: Behavior<T>,
		F: FnOnce(Address<T>) -> B + Send + 'static,
	{
		self.actor_of_with(ActorConfig::default(), factory)
	}

	pub fn actor_of_with<T, B, F>(&self, config: ActorConfig, factory: F) -> Address<T>
	where
		T: Message,
		B: Behavior<T>,
		F: FnOnce(Address<T>) -> B + Send + 'static,
	{
		let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
		let id = ActorId::new(seq, config.name.map(Arc::from));
		let stats = self.inner.registry.register(id.clone());
		let mailbox = config
			.mailbox
			.unwrap_or_else(|| self.inner.config.mailbox.clone());

		let address = Address::new(Cell {
			id: id.clone(),
			mailbox: Mailbox::new(mailbox),
			stats: stats.clone(),
		});

		// hold the lock so shutdown cannot miss a unit spawned concurrently
		let mut units = self.inner.units.lock();
		if self.is_shut_down() {
			tracing::warn!(actor = %id, "System is shut down, actor will never run");
			stats.set_status(ActorStatus::Stopped);
			return address;
		}

		let span = tracing::info_span!(parent: &self.inner.span, "actor", id = %id);
		let unit = self
			.inner
			.handle
			.spawn(run(address.clone(), factory).instrument(span));
		units.push(unit.abort_handle());
		drop(units);

		self.inner.handle.spawn(monitor(id, stats, unit));

		address
	}

	/// Abort every execution unit spawned by this system.
	///
	/// Addresses stay valid and keep accepting messages, which are never
	/// processed.
	pub fn shutdown(&self) {
		let units = {
			let mut units = self.inner.units.lock();
			if self.inner.shut_down.swap(true, Ordering::AcqRel) {
				return;
			}
			std::mem::take(&mut *units)
		};

		let _span = self.inner.span.enter();
		tracing::info!(units = units.len(), "Shutting down");

		for unit in units {
			unit.abort();
		}

		self.inner
			.registry
			.for_each(|_, stats| stats.transition_status(ActorStatus::Stopped));
	}

	pub fn report(&self) -> Report {
		Report::new(&self.inner.registry)
	}
}

async fn run<T, B, F>(address: Address<T>, factory: F)
where
	T: Message,
	B: Behavior<T>,
	F: FnOnce(Address<T>) -> B,
{
	let cell = address.cell.clone();
	let mut behavior: BoxBehavior<T> = Box::new(factory(address));
	let mut dead = false;

	tracing::debug!("Actor started");

	loop {
		let msg = cell.mailbox.recv().await;

		if dead {
			cell.stats.record_dead_letter();
		} else {
			cell.stats.record_processed();
		}

		let effect = match behavior.receive(msg) {
			Ok(effect) => effect,
			Err(err) => {
				cell.stats.set_status(ActorStatus::Halted);
				metrics::counter!("actor_failures").increment(1);
				tracing::error!(error = ?err, "Behavior failed, halting actor");
				return;
			}
		};

		if effect.is_terminal() && !dead {
			dead = true;
			cell.stats.transition_status(ActorStatus::Dead);
			tracing::info!("Actor died");
		}

		behavior = effect.transition(behavior);
	}
}

async fn monitor(id: ActorId, stats: Arc<ActorStats>, unit: tokio::task::JoinHandle<()>) {
	match unit.await {
		Ok(()) => {
			tracing::debug!(actor = %id, "Execution unit finished");
		}
		Err(err) if err.is_cancelled() => {
			stats.transition_status(ActorStatus::Stopped);
			tracing::debug!(actor = %id, "Execution unit aborted");
		}
		Err(err) => {
			stats.set_status(ActorStatus::Halted);
			metrics::counter!("actor_failures").increment(1);
			tracing::error!(actor = %id, error = ?err, "Actor crashed");
		}
	}
}
