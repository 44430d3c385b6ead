/// Incremental newline framing.
///
/// Holds the text received after the last newline and turns each new chunk
/// into the complete lines it finishes. A single trailing `\r` is removed
/// from every line, so both `\n` and `\r\n` terminators work, including a
/// `\r\n` split across two chunks.
#[derive(Debug, Clone, Default)]
pub struct LineFramer {
	partial: String,
	max_line_length: Option<usize>,
	discarding: bool,
}

impl LineFramer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Lines longer than `max` bytes are discarded instead of buffered
	/// without limit. Framing resumes after the next newline.
	pub fn with_max_line_length(max: usize) -> Self {
		Self {
			max_line_length: Some(max),
			..Default::default()
		}
	}

	/// Text received but not yet terminated by a newline.
	pub fn partial(&self) -> &str {
		&self.partial
	}

	pub fn max_line_length(&self) -> Option<usize> {
		self.max_line_length
	}

	/// Feed one chunk, calling `emit` for every line it completes, in order.
	/// Returns the number of lines emitted.
	pub fn feed(&mut self, chunk: &str, mut emit: impl FnMut(String)) -> usize {
		let mut emitted = 0;
		let mut rest = chunk;

		while let Some(eol) = rest.find('\n') {
			let head = &rest[..eol];
			rest = &rest[eol + 1..];

			if self.discarding {
				self.discarding = false;
				self.partial.clear();
				continue;
			}

			let mut line = std::mem::take(&mut self.partial);
			line.push_str(head);
			if line.ends_with('\r') {
				line.pop();
			}

			if self.too_long(line.len()) {
				tracing::warn!(length = line.len(), "Discarding oversized line");
				continue;
			}

			emit(line);
			emitted += 1;
		}

		if !self.discarding {
			self.partial.push_str(rest);
			// a trailing `\r` may still turn out to be part of the terminator
			let pending = self.partial.strip_suffix('\r').unwrap_or(&self.partial).len();
			if self.too_long(pending) {
				tracing::warn!(
					length = self.partial.len(),
					"Pending line exceeds limit, discarding until next newline"
				);
				self.partial.clear();
				self.discarding = true;
			}
		}

		emitted
	}

	/// Convenience wrapper around [`LineFramer::feed`] collecting the lines.
	pub fn push(&mut self, chunk: &str) -> Vec<String> {
		let mut lines = Vec::new();
		self.feed(chunk, |line| lines.push(line));
		lines
	}

	fn too_long(&self, len: usize) -> bool {
		match self.max_line_length {
			Some(max) => len > max,
			None => false,
		}
	}
}
