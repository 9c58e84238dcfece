// Test Helpers Module - Shared Testing Infrastructure
//
// In-process doubles for the chat transport and the update stream, plus raw
// update builders. Used by unit tests and by the integration tests in tests/.

pub mod fixtures;
pub mod scripted_source;
pub mod transport;

pub use scripted_source::{ScriptFeed, ScriptedUpdateSource};
pub use transport::{RecordingTransport, TransportCall};
