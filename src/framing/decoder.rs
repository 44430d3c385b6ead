use std::sync::Arc;

use bytes::Bytes;

use super::framer::LineFramer;
use super::io::ChunkSink;
use super::io::ChunkSource;
use crate::Address;
use crate::ActorConfig;
use crate::System;
use crate::behavior::Behavior;
use crate::behavior::Effect;
use crate::message::Message;

/// Messages understood by a [`LineDecoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
	/// Text injected directly, framed exactly like source text.
	Chunk(String),
	/// Outbound line; a `\n` is appended before it reaches the sink.
	WriteLine(String),
	/// Completion of the decoder's own read. Only the decoder builds these.
	Read(ReadOutcome),
}

/// What an armed read produced: a chunk, or `None` once the source is done
/// (end of stream or a failed read).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOutcome(Option<String>);

/// Behavior that splits a chunk stream into lines for a parent actor.
///
/// The decoder feeds itself: it asks the source for the next chunk and has
/// the result told back to its own address as [`Frame::Read`]. The first
/// read is armed when the decoder is built and each completed read arms the
/// next one, so at most one read is outstanding. An injected chunk only arms
/// a read when none is in flight, which restarts reading after the source
/// stopped. Each completed line goes through `mapping` and is told to
/// `parent`.
pub struct LineDecoder<P, F> {
	this: Address<Frame>,
	parent: Address<P>,
	mapping: F,
	framer: LineFramer,
	source: Arc<dyn ChunkSource>,
	sink: Arc<dyn ChunkSink>,
	reading: bool,
}

impl<P, F> LineDecoder<P, F>
where
	P: Message,
	F: Fn(String) -> P + Send + 'static,
{
	/// Build the decoder and arm the first read. Must run inside a tokio
	/// runtime, which is always the case inside an actor factory.
	pub fn new(
		this: Address<Frame>,
		parent: Address<P>,
		mapping: F,
		source: Arc<dyn ChunkSource>,
		sink: Arc<dyn ChunkSink>,
	) -> Self {
		Self::with_framer(this, parent, mapping, source, sink, LineFramer::new())
	}

	pub fn with_framer(
		this: Address<Frame>,
		parent: Address<P>,
		mapping: F,
		source: Arc<dyn ChunkSource>,
		sink: Arc<dyn ChunkSink>,
		framer: LineFramer,
	) -> Self {
		let mut decoder = Self {
			this,
			parent,
			mapping,
			framer,
			source,
			sink,
			reading: false,
		};
		decoder.arm_read();
		decoder
	}

	/// Spawn a decoder actor on `system`.
	pub fn spawn(
		system: &System,
		parent: Address<P>,
		mapping: F,
		source: Arc<dyn ChunkSource>,
		sink: Arc<dyn ChunkSink>,
	) -> Address<Frame> {
		Self::spawn_with(
			system,
			ActorConfig::named("line-decoder"),
			LineFramer::new(),
			parent,
			mapping,
			source,
			sink,
		)
	}

	pub fn spawn_with(
		system: &System,
		config: ActorConfig,
		framer: LineFramer,
		parent: Address<P>,
		mapping: F,
		source: Arc<dyn ChunkSource>,
		sink: Arc<dyn ChunkSink>,
	) -> Address<Frame> {
		system.actor_of_with(config, move |this| {
			Self::with_framer(this, parent, mapping, source, sink, framer)
		})
	}

	pub fn partial(&self) -> &str {
		self.framer.partial()
	}

	/// Whether a read is currently in flight.
	pub fn is_reading(&self) -> bool {
		self.reading
	}

	fn arm_read(&mut self) {
		if self.reading {
			return;
		}
		self.reading = true;

		let this = self.this.clone();
		let read = self.source.read();

		tokio::spawn(async move {
			let outcome = match read.await {
				Ok(Some(chunk)) => Some(chunk),
				Ok(None) => {
					tracing::debug!(actor = %this.id(), "Source reached end of stream");
					None
				}
				Err(err) => {
					tracing::error!(actor = %this.id(), error = %err, "Source read failed");
					None
				}
			};
			this.tell(Frame::Read(ReadOutcome(outcome)));
		});
	}

	fn frame(&mut self, chunk: &str) {
		let parent = &self.parent;
		let mapping = &self.mapping;
		let lines = self.framer.feed(chunk, |line| {
			parent.tell(mapping(line));
		});
		tracing::trace!(lines, pending = self.framer.partial().len(), "Chunk framed");
	}
}

impl<P, F> Behavior<Frame> for LineDecoder<P, F>
where
	P: Message,
	F: Fn(String) -> P + Send + 'static,
{
	fn receive(&mut self, msg: Frame) -> anyhow::Result<Effect<Frame>> {
		match msg {
			Frame::Chunk(chunk) => {
				self.frame(&chunk);
				self.arm_read();
				Ok(Effect::Stay)
			}
			Frame::Read(ReadOutcome(outcome)) => {
				self.reading = false;
				if let Some(chunk) = outcome {
					self.frame(&chunk);
					self.arm_read();
				}
				Ok(Effect::Stay)
			}
			Frame::WriteLine(payload) => {
				let mut bytes = payload.into_bytes();
				bytes.push(b'\n');
				self.sink.write(Bytes::from(bytes));
				Ok(Effect::Stay)
			}
		}
	}
}
