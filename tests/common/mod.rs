//! Integration test common infrastructure.
//!
//! Recording doubles for both invocation surfaces and instrumented backends
//! for observing (or breaking) persistence.

pub mod backends;
pub mod senders;

#[allow(unused_imports)]
pub use backends::{CountingBackend, FailingBackend, GatedBackend};
#[allow(unused_imports)]
pub use senders::{RecordingChatUser, RecordingConsole, RecordingPlayer};
