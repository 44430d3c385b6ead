use std::io;
use std::sync::Arc;

use bytes::Bytes;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Something that produces text chunks asynchronously.
pub trait ChunkSource: Send + Sync + 'static {
	/// Resolve to the next chunk, `None` at end of stream.
	fn read(&self) -> BoxFuture<'static, io::Result<Option<String>>>;
}

/// Something that accepts bytes without making the caller wait.
pub trait ChunkSink: Send + Sync + 'static {
	fn write(&self, bytes: Bytes);
}

impl ChunkSink for mpsc::UnboundedSender<Bytes> {
	fn write(&self, bytes: Bytes) {
		if self.send(bytes).is_err() {
			tracing::warn!("Sink receiver is gone, dropping bytes");
		}
	}
}

struct SourceState<R> {
	reader: R,
	pending: Vec<u8>,
}

/// [`ChunkSource`] over any tokio reader.
///
/// Bytes are decoded as UTF-8 incrementally: a character split across two
/// reads is held back until it is complete. Invalid bytes are replaced with
/// U+FFFD rather than failing the read.
pub struct StreamSource<R> {
	state: Arc<tokio::sync::Mutex<SourceState<R>>>,
	buffer_size: usize,
}

impl<R> StreamSource<R>
where
	R: AsyncRead + Unpin + Send + 'static,
{
	pub fn new(reader: R) -> Self {
		Self::with_buffer_size(reader, DEFAULT_BUFFER_SIZE)
	}

	pub fn with_buffer_size(reader: R, buffer_size: usize) -> Self {
		assert!(buffer_size > 0, "Read buffer must not be empty");
		Self {
			state: Arc::new(tokio::sync::Mutex::new(SourceState {
				reader,
				pending: Vec::new(),
			})),
			buffer_size,
		}
	}
}

impl<R> ChunkSource for StreamSource<R>
where
	R: AsyncRead + Unpin + Send + 'static,
{
	fn read(&self) -> BoxFuture<'static, io::Result<Option<String>>> {
		let state = self.state.clone();
		let buffer_size = self.buffer_size;

		async move {
			let mut guard = state.lock().await;
			let state = &mut *guard;
			let mut buf = vec![0u8; buffer_size];

			loop {
				let n = state.reader.read(&mut buf).await?;
				if n == 0 {
					if !state.pending.is_empty() {
						return Err(io::Error::new(
							io::ErrorKind::UnexpectedEof,
							"stream ended inside a UTF-8 sequence",
						));
					}
					return Ok(None);
				}

				state.pending.extend_from_slice(&buf[..n]);
				if let Some(text) = take_utf8(&mut state.pending) {
					return Ok(Some(text));
				}
			}
		}
		.boxed()
	}
}

/// Decode the complete part of `pending`, leaving an incomplete trailing
/// sequence in place. Invalid bytes become U+FFFD.
fn take_utf8(pending: &mut Vec<u8>) -> Option<String> {
	let mut text = String::new();
	let mut consumed = 0;

	loop {
		match std::str::from_utf8(&pending[consumed..]) {
			Ok(valid) => {
				text.push_str(valid);
				consumed = pending.len();
				break;
			}
			Err(err) => {
				let valid = err.valid_up_to();
				text.push_str(&String::from_utf8_lossy(&pending[consumed..consumed + valid]));
				consumed += valid;
				match err.error_len() {
					Some(invalid) => {
						text.push(char::REPLACEMENT_CHARACTER);
						consumed += invalid;
					}
					None => break,
				}
			}
		}
	}

	pending.drain(..consumed);
	if text.is_empty() { None } else { Some(text) }
}

/// [`ChunkSink`] over any tokio writer.
///
/// Writes are queued to a single writer task, so they reach the writer in
/// the order they were submitted.
#[derive(Clone)]
pub struct StreamSink {
	tx: mpsc::UnboundedSender<Bytes>,
}

impl StreamSink {
	/// Must be called inside a tokio runtime.
	pub fn new<W>(writer: W) -> Self
	where
		W: AsyncWrite + Unpin + Send + 'static,
	{
		let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();

		tokio::spawn(async move {
			let mut writer = writer;
			while let Some(bytes) = rx.recv().await {
				if let Err(err) = writer.write_all(&bytes).await {
					tracing::error!(error = %err, "Sink write failed");
					break;
				}
				if let Err(err) = writer.flush().await {
					tracing::error!(error = %err, "Sink flush failed");
					break;
				}
			}
			tracing::debug!("Sink writer finished");
		});

		Self { tx }
	}
}

impl ChunkSink for StreamSink {
	fn write(&self, bytes: Bytes) {
		ChunkSink::write(&self.tx, bytes)
	}
}
