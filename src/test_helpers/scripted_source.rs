use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::transport::{RawUpdate, TransportError, TransportResult, UpdateSource};

/// [`UpdateSource`] fed from a channel.
///
/// Each pushed batch is returned by one `poll_updates` call. With nothing
/// queued the poll waits, the way a long poll does.
#[derive(Debug)]
pub struct ScriptedUpdateSource {
    batches: Mutex<mpsc::UnboundedReceiver<TransportResult<Vec<RawUpdate>>>>,
}

/// Sending half of a [`ScriptedUpdateSource`]
#[derive(Debug, Clone)]
pub struct ScriptFeed {
    sender: mpsc::UnboundedSender<TransportResult<Vec<RawUpdate>>>,
}

impl ScriptedUpdateSource {
    pub fn new() -> (Self, ScriptFeed) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                batches: Mutex::new(receiver),
            },
            ScriptFeed { sender },
        )
    }
}

impl ScriptFeed {
    pub fn push(&self, batch: Vec<RawUpdate>) {
        // The source may already be gone at the end of a test
        let _ = self.sender.send(Ok(batch));
    }

    /// The next poll fails with a transport error
    pub fn push_error(&self, message: &str) {
        let _ = self
            .sender
            .send(Err(TransportError::http("getUpdates", message)));
    }
}

#[async_trait]
impl UpdateSource for ScriptedUpdateSource {
    async fn poll_updates(&self) -> TransportResult<Vec<RawUpdate>> {
        let next = self.batches.lock().await.recv().await;
        match next {
            Some(batch) => batch,
            // Feed dropped: behave like a poll that never returns
            None => std::future::pending().await,
        }
    }
}
