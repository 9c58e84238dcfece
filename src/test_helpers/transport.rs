use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use crate::models::{
    AnswerCallbackParams, EditMessageCaptionParams, EditMessageTextParams, SendMessageParams,
    SendPhotoParams,
};
use crate::transport::{ChatTransport, TransportError, TransportResult};

/// First message id handed out; keeps ids distinct from update ids in fixtures
const FIRST_MESSAGE_ID: i64 = 1000;

/// One successful outbound call
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    SendMessage(SendMessageParams),
    SendPhoto(SendPhotoParams),
    EditMessageText(EditMessageTextParams),
    EditMessageCaption(EditMessageCaptionParams),
    AnswerCallback(AnswerCallbackParams),
}

/// [`ChatTransport`] that records calls instead of sending them.
///
/// Sends return increasing message ids. Failures can be switched on for every
/// method or for named ones (`"sendPhoto"`, `"sendMessage"`, ...); failed
/// calls are not recorded. A latency can be set to keep handlers busy inside
/// a call.
#[derive(Debug)]
pub struct RecordingTransport {
    calls: Mutex<Vec<TransportCall>>,
    next_message_id: AtomicI64,
    fail_all: AtomicBool,
    failing_methods: Mutex<HashSet<String>>,
    latency: Mutex<Duration>,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_message_id: AtomicI64::new(FIRST_MESSAGE_ID),
            fail_all: AtomicBool::new(false),
            failing_methods: Mutex::new(HashSet::new()),
            latency: Mutex::new(Duration::ZERO),
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Delay every subsequent call by `latency`
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    pub fn fail_method(&self, method: &str) {
        self.failing_methods.lock().insert(method.to_string());
    }

    pub fn restore_method(&self, method: &str) {
        self.failing_methods.lock().remove(method);
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    pub fn sent_messages(&self) -> Vec<SendMessageParams> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                TransportCall::SendMessage(params) => Some(params.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn sent_photos(&self) -> Vec<SendPhotoParams> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                TransportCall::SendPhoto(params) => Some(params.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn edited_texts(&self) -> Vec<EditMessageTextParams> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                TransportCall::EditMessageText(params) => Some(params.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn edited_captions(&self) -> Vec<EditMessageCaptionParams> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                TransportCall::EditMessageCaption(params) => Some(params.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn answered_callbacks(&self) -> Vec<AnswerCallbackParams> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                TransportCall::AnswerCallback(params) => Some(params.clone()),
                _ => None,
            })
            .collect()
    }

    /// Text of the most recent `sendMessage`
    pub fn last_message_text(&self) -> Option<String> {
        self.sent_messages().last().map(|params| params.text.clone())
    }

    async fn pace(&self) {
        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn check(&self, method: &str) -> TransportResult<()> {
        if self.fail_all.load(Ordering::SeqCst) || self.failing_methods.lock().contains(method) {
            return Err(TransportError::api(method, "simulated failure"));
        }
        Ok(())
    }

    fn record(&self, call: TransportCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_message(&self, params: SendMessageParams) -> TransportResult<i64> {
        self.pace().await;
        self.check("sendMessage")?;
        self.record(TransportCall::SendMessage(params));
        Ok(self.next_message_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn send_photo(&self, params: SendPhotoParams) -> TransportResult<i64> {
        self.pace().await;
        self.check("sendPhoto")?;
        self.record(TransportCall::SendPhoto(params));
        Ok(self.next_message_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn edit_message_text(&self, params: EditMessageTextParams) -> TransportResult<()> {
        self.pace().await;
        self.check("editMessageText")?;
        self.record(TransportCall::EditMessageText(params));
        Ok(())
    }

    async fn edit_message_caption(&self, params: EditMessageCaptionParams) -> TransportResult<()> {
        self.pace().await;
        self.check("editMessageCaption")?;
        self.record(TransportCall::EditMessageCaption(params));
        Ok(())
    }

    async fn answer_callback_query(&self, params: AnswerCallbackParams) -> TransportResult<()> {
        self.pace().await;
        self.check("answerCallbackQuery")?;
        self.record(TransportCall::AnswerCallback(params));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageBuilder;

    #[tokio::test]
    async fn test_ids_increase_and_failures_are_not_recorded() {
        let transport = RecordingTransport::new();

        let first = transport
            .send_message(MessageBuilder::new(1).text("a").build())
            .await
            .unwrap();
        transport.fail_method("sendMessage");
        let failed = transport
            .send_message(MessageBuilder::new(1).text("b").build())
            .await;
        transport.restore_method("sendMessage");
        let second = transport
            .send_message(MessageBuilder::new(1).text("c").build())
            .await
            .unwrap();

        assert!(second > first);
        assert!(failed.is_err());
        assert_eq!(transport.sent_messages().len(), 2);
        assert_eq!(transport.last_message_text().as_deref(), Some("c"));
    }
}
