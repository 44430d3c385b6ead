use std::any::type_name;
use std::fmt::Debug;

use crate::message::Message;

/// The current message handler of an actor.
///
/// A behavior is the complete state of an actor: whatever it needs to carry
/// between messages lives in the implementing type. Every processed message
/// yields exactly one [`Effect`], which decides the behavior used for the
/// *next* message.
///
/// Behaviors run on the actor's execution unit and must not block. Returning
/// an error halts the actor (see [`ActorStatus::Halted`](crate::ActorStatus)).
///
/// Any `FnMut(T) -> Effect<T>` closure is a behavior:
///
/// ```ignore
/// let addr = system.actor_of(|_self| {
/// 	let mut seen = 0;
/// 	move |msg: u32| {
/// 		seen += msg;
/// 		Effect::Stay
/// 	}
/// });
/// ```
pub trait Behavior<T>: Send + 'static {
	fn receive(&mut self, msg: T) -> anyhow::Result<Effect<T>>;
}

pub type BoxBehavior<T> = Box<dyn Behavior<T>>;

impl<T, F> Behavior<T> for F
where
	F: FnMut(T) -> Effect<T> + Send + 'static,
{
	fn receive(&mut self, msg: T) -> anyhow::Result<Effect<T>> {
		Ok(self(msg))
	}
}

/// Behavior built from a closure that may fail.
pub struct Fallible<F> {
	func: F,
}

/// Wrap a closure returning `anyhow::Result<Effect<T>>` into a [`Behavior`].
pub fn fallible<T, F>(func: F) -> Fallible<F>
where
	F: FnMut(T) -> anyhow::Result<Effect<T>> + Send + 'static,
{
	Fallible { func }
}

impl<T, F> Behavior<T> for Fallible<F>
where
	F: FnMut(T) -> anyhow::Result<Effect<T>> + Send + 'static,
{
	fn receive(&mut self, msg: T) -> anyhow::Result<Effect<T>> {
		(self.func)(msg)
	}
}

/// Deferred state-transition instruction produced by a [`Behavior`].
///
/// The runtime, not the behavior, installs the result of
/// [`Effect::transition`].
pub enum Effect<T> {
	/// Keep the behavior that just ran.
	Stay,
	/// Install a new behavior for the following message.
	Become(BoxBehavior<T>),
	/// Install the dead-letter behavior: every later message is logged and
	/// discarded.
	Die,
}

impl<T> Debug for Effect<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Effect::Stay => f.write_str("Stay"),
			Effect::Become(_) => f.write_str("Become(..)"),
			Effect::Die => f.write_str("Die"),
		}
	}
}

impl<T: Message> Effect<T> {
	/// `Become` with the boxing done for you.
	pub fn become_to(next: impl Behavior<T>) -> Self {
		Effect::Become(Box::new(next))
	}

	pub fn is_terminal(&self) -> bool {
		matches!(self, Effect::Die)
	}

	pub fn transition(self, current: BoxBehavior<T>) -> BoxBehavior<T> {
		match self {
			Effect::Stay => current,
			Effect::Become(next) => next,
			Effect::Die => Box::new(DeadLetters),
		}
	}
}

/// Terminal behavior installed by [`Effect::Die`]. Absorbs everything.
pub(crate) struct DeadLetters;

impl<T: Message> Behavior<T> for DeadLetters {
	fn receive(&mut self, msg: T) -> anyhow::Result<Effect<T>> {
		tracing::warn!(
			msg = ?msg,
			kind = type_name::<T>(),
			"Dropping message sent to a dead actor"
		);
		Ok(Effect::Stay)
	}
}
