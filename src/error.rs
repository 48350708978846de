use thiserror::Error;

/// Returned by the timed blocking wait when the deadline passes before the
/// promise completes. Recoverable: observation is abandoned but whatever was
/// going to complete the promise still runs.
#[derive(Clone,Copy,Debug,PartialEq,Eq,Error)]
#[error("timed out waiting for promise completion")]
pub struct WaitTimeout;
