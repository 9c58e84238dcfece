//! # System Constants
//!
//! Bus topics, command names and callback prefixes shared between the two
//! actor pools. Anything that crosses a module boundary as a string lives here.

/// Event bus topics
pub mod topics {
    /// Raw channel posts seen by the reviewer bot (relay channel traffic)
    pub const REVIEWER_CHANNEL_POST: &str = "relay:reviewer:channel_post";
    /// Raw private messages sent to the reviewer bot
    pub const REVIEWER_MESSAGE: &str = "relay:reviewer:message";
    /// Raw button presses on reviewer-facing messages
    pub const REVIEWER_CALLBACK_QUERY: &str = "relay:reviewer:callback_query";

    pub const ACTOR_APPROVED: &str = "actor:approved";
    pub const ACTOR_REJECTED: &str = "actor:rejected";
}

/// Command names, without the leading slash
pub mod commands {
    pub const START: &str = "start";

    /// Menu entries registered with the applicant bot
    pub const APPLICANT_MENU: &[(&str, &str)] = &[(START, "Start or resume registration")];
}

/// Callback payload prefixes and full payloads
pub mod callbacks {
    pub const POLICY_PREFIX: &str = "policy_";
    pub const POLICY_ACCEPT: &str = "policy_accept";
    pub const POLICY_DECLINE: &str = "policy_decline";

    pub const APPROVAL_PREFIX: &str = "approval_";
    pub const APPROVAL_ACCEPT: &str = "accept";
    pub const APPROVAL_REJECT: &str = "reject";

    /// `approval_<action>_<uuid>`
    pub fn approval_payload(action: &str, actor_id: &uuid::Uuid) -> String {
        format!("{APPROVAL_PREFIX}{action}_{actor_id}")
    }
}

/// Relay caption wire format
pub mod caption {
    pub const HEADER: &str = "New User Verification";
    /// The only structured line parsed back out of a relayed caption
    pub const ACTOR_ID_LINE_PREFIX: &str = "UserID: ";
}

/// Pool labels used in logs and metrics fields
pub mod pools {
    pub const APPLICANT: &str = "applicant";
    pub const REVIEWER: &str = "reviewer";
}
