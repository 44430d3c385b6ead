mod address;
mod behavior;
mod error;
mod mailbox;
mod message;
mod stats;
mod system;

pub mod framing;

pub mod prelude {
	pub use super::address::Address;
	pub use super::behavior::Behavior;
	pub use super::behavior::Effect;
	pub use super::system::System;
	pub use super::system::SystemConfig;
}

pub use address::ActorId;
pub use address::Address;
pub use behavior::Behavior;
pub use behavior::BoxBehavior;
pub use behavior::Effect;
pub use behavior::Fallible;
pub use behavior::fallible;
pub use error::SystemError;
pub use error::TellError;
pub use mailbox::MailboxConfig;
pub use mailbox::Overflow;
pub use message::Message;
pub use stats::ActorStats;
pub use stats::ActorStatus;
pub use stats::Report;
pub use stats::ReportRow;
pub use system::ActorConfig;
pub use system::System;
pub use system::SystemConfig;
