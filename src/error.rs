use std::fmt::Debug;

/// Returned by [`Address::try_tell`](crate::Address::try_tell) when the
/// message could not be enqueued. The message is handed back to the caller.
#[derive(thiserror::Error)]
pub enum TellError<T> {
	#[error("Mailbox is full")]
	Full(T),
}

impl<T> TellError<T> {
	pub fn into_inner(self) -> T {
		match self {
			TellError::Full(msg) => msg,
		}
	}
}

impl<T> Debug for TellError<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			TellError::Full(_) => f.write_str("Full(..)"),
		}
	}
}

#[derive(thiserror::Error, Debug)]
pub enum SystemError {
	#[error("System must be created inside a tokio runtime")]
	NoRuntime(#[from] tokio::runtime::TryCurrentError),
}
