use std::fmt::Debug;

/// Anything an actor can receive.
///
/// `Debug` is required so messages reaching a dead actor can be reported.
pub trait Message: Debug + Send + 'static {}
impl<T: Debug + Send + 'static> Message for T {}
