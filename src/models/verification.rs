use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A verification artifact travelling from the applicant pool to reviewers.
///
/// Built by the registration workflow when the identity document arrives,
/// sent through the verification queue and rebuilt on the reviewer side from
/// the relayed post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationEvent {
    pub actor_id: Uuid,
    /// Transport file handle of the artifact (valid for the bot that sees it)
    pub artifact_ref: String,
    /// Plain-text profile snapshot; carries the `UserID: <uuid>` line
    pub caption: String,
}

impl VerificationEvent {
    pub fn new(actor_id: Uuid, artifact_ref: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            actor_id,
            artifact_ref: artifact_ref.into(),
            caption: caption.into(),
        }
    }
}
