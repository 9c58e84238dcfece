//! User-facing texts and the messages built from them.
//!
//! MarkdownV2 texts are pre-escaped; anything interpolated into them goes
//! through [`escape_markdown`] first. Plain-text replies carry no parse mode.

use crate::constants::callbacks;
use crate::models::{escape_markdown, Button, MessageBuilder, SendMessageParams};
use crate::state_machine::{ConversationState, NameField};

pub const SHARE_PHONE_BUTTON: &str = "Share My Phone Number";
pub const ACCEPT_BUTTON: &str = "✅ I Accept";
pub const DECLINE_BUTTON: &str = "❌ I Decline";
pub const APPROVE_BUTTON: &str = "✅ Approve";
pub const REJECT_BUTTON: &str = "❌ Reject";
/// Country buttons per keyboard row
pub const COUNTRY_COLUMNS: usize = 2;

pub const WELCOME: &str = "👋 Welcome\\!\n\nTo use our service, you must first register an account\\.\n\nPlease reply with your *legal First Name* as it appears on your ID\\.";
pub const ASK_FIRST_NAME: &str = "Please reply with your *legal First Name* as it appears on your ID\\.";
pub const ASK_LAST_NAME: &str = "Please reply with your *legal Last Name* as it appears on your ID\\.";
pub const ASK_PHONE: &str = "Please share your *Phone Number* by pressing the button below\\.";
pub const ASK_GOV_ID: &str = "Please reply with your *Government ID / National ID Number*\\.";
pub const ASK_LOCATION: &str = "Please select your *Country of Residence* from the list\\.";
pub const ASK_DOCUMENT: &str = "Please upload a *single, clear photo* of your Government ID or Passport\\.";
pub const ASK_POLICY_DECISION: &str = "Please review our terms of service and *accept or decline* the policy\\.";
pub const PENDING_ANONYMOUS: &str = "Your account is still *pending verification*\\. Please wait\\.";
pub const REGISTRATION_RESTARTED: &str = "Your previous registration was rejected\\.\n\nYou may try again\\. Please reply with your *legal First Name*\\.";

pub const AFTER_FIRST_NAME: &str = "Thank you\\. Now, please reply with your *legal Last Name*\\.";
pub const AFTER_LAST_NAME: &str = "Thank you\\. Now, please share your *Phone Number* by pressing the button below\\.";
pub const AFTER_PHONE: &str = "Thank you\\. Finally, please reply with your *Government ID / National ID Number*\\.";
pub const AFTER_LOCATION: &str = "Thank you\\. As the next step, please upload a *single, clear photo* of your Government ID or Passport\\.\n\nThis photo will be reviewed by an admin to verify your identity\\.";

pub const PRESS_PHONE_BUTTON: &str = "Please press the *Share My Phone Number* button to continue\\.";
pub const FOREIGN_CONTACT: &str = "You must share your *own* contact\\. Please press the button again\\.";
pub const MALFORMED_PHONE: &str = "The phone number you shared has an invalid format. Please contact support.";
pub const GOV_ID_AS_TEXT: &str = "Please reply with your Government ID as text.";
pub const INVALID_GOV_ID: &str = "Invalid ID format\\. Please reply with your *Government ID / National ID Number*\\.";
pub const DOCUMENT_NOT_PHOTO: &str = "Please upload a *photo* of your ID, not text\\.";

pub const POLICY_ACCEPTED_EDIT: &str = "You have accepted the terms of service.";
pub const POLICY_DECLINED_EDIT: &str = "You have declined the terms of service.";
pub const POLICY_DECLINED: &str = "You have declined the terms\\. To use this bot, you must accept the terms\\.\n\nThe registration process will now restart\\. Please reply with your *legal First Name*\\.";
pub const POLICY_NOT_PENDING: &str = "This decision is no longer pending.";

pub const APPROVED_NOTICE: &str = "🎉 Your account has been *approved*\\! You can now start using the exchange\\. Type /start to see your options\\.";
pub const REJECTED_NOTICE: &str = "Your identity verification was *rejected*\\. Please type /start to try the registration process again\\.";

pub const INTERNAL_ERROR: &str = "An internal error occurred.";
pub const INTERNAL_ERROR_RETRY: &str = "An internal error occurred. Please try again later.";
pub const SUBMISSION_FAILED: &str = "An error occurred while submitting your ID.";

pub const CAPTION_ACTOR_MISSING: &str = "Error: Could not find user.";
pub const CAPTION_UPDATE_FAILED: &str = "Error: Could not update user.";
pub const CAPTION_REJECTED: &str = "❌ User Rejected";

pub fn plain(chat_id: i64, text: &str) -> SendMessageParams {
    MessageBuilder::new(chat_id).text(text).plain().build()
}

pub fn markdown(chat_id: i64, text: impl Into<String>) -> SendMessageParams {
    MessageBuilder::new(chat_id).text(text).build()
}

pub fn welcome(chat_id: i64) -> SendMessageParams {
    MessageBuilder::new(chat_id)
        .text(WELCOME)
        .remove_keyboard()
        .build()
}

pub fn welcome_back(chat_id: i64, first_name: &str) -> SendMessageParams {
    MessageBuilder::new(chat_id)
        .text(format!(
            "👋 Welcome back, {}\\! Use the menu to get started\\.",
            escape_markdown(first_name)
        ))
        .remove_keyboard()
        .build()
}

pub fn pending_verification(chat_id: i64, first_name: Option<&str>) -> SendMessageParams {
    let text = match first_name {
        Some(name) => format!(
            "Hello, {}\\. Your account is still *pending verification*\\. Please wait for an admin to approve your identity\\.",
            escape_markdown(name)
        ),
        None => PENDING_ANONYMOUS.to_string(),
    };
    markdown(chat_id, text)
}

/// Re-prompt for the step the actor is on; `None` outside registration
pub fn state_prompt(
    chat_id: i64,
    state: ConversationState,
    country_titles: &[String],
) -> Option<SendMessageParams> {
    let builder = MessageBuilder::new(chat_id);
    let params = match state {
        ConversationState::None => return None,
        ConversationState::AwaitingFirstName => builder.text(ASK_FIRST_NAME).remove_keyboard(),
        ConversationState::AwaitingLastName => builder.text(ASK_LAST_NAME).remove_keyboard(),
        ConversationState::AwaitingPhone => builder.text(ASK_PHONE).contact_button(SHARE_PHONE_BUTTON),
        ConversationState::AwaitingGovId => builder.text(ASK_GOV_ID).remove_keyboard(),
        ConversationState::AwaitingLocation => builder
            .text(ASK_LOCATION)
            .reply_buttons(country_titles.iter().cloned(), COUNTRY_COLUMNS),
        ConversationState::AwaitingIdentityDocument => builder.text(ASK_DOCUMENT).remove_keyboard(),
        ConversationState::AwaitingPolicyApproval => builder.text(ASK_POLICY_DECISION),
    };
    Some(params.build())
}

pub fn wrong_name_input(chat_id: i64, field: NameField) -> SendMessageParams {
    let text = match field {
        NameField::First => "Please reply with your First Name as text.",
        NameField::Last => "Please reply with your Last Name as text.",
    };
    plain(chat_id, text)
}

pub fn invalid_name(chat_id: i64, field: NameField) -> SendMessageParams {
    let label = match field {
        NameField::First => "first",
        NameField::Last => "last",
    };
    plain(
        chat_id,
        &format!("Invalid {label} name. Please enter a name between 2 and 50 characters."),
    )
}

pub fn contact_request(chat_id: i64, text: &str) -> SendMessageParams {
    MessageBuilder::new(chat_id)
        .text(text)
        .contact_button(SHARE_PHONE_BUTTON)
        .build()
}

pub fn country_request(chat_id: i64, text: impl Into<String>, country_titles: &[String]) -> SendMessageParams {
    MessageBuilder::new(chat_id)
        .text(text)
        .reply_buttons(country_titles.iter().cloned(), COUNTRY_COLUMNS)
        .build()
}

pub fn after_gov_id(chat_id: i64, first_name: &str, country_titles: &[String]) -> SendMessageParams {
    country_request(
        chat_id,
        format!(
            "Thank you, {}\\.\n\nYour registration is almost complete\\. Please select your *Country of Residence* from the list below\\.",
            escape_markdown(first_name)
        ),
        country_titles,
    )
}

pub fn unsupported_country(chat_id: i64, choice: &str, country_titles: &[String]) -> SendMessageParams {
    country_request(
        chat_id,
        format!(
            "`{}` is not a supported country\\. Please select one from the list\\.",
            escape_code(choice)
        ),
        country_titles,
    )
}

fn policy_buttons() -> Vec<Vec<Button>> {
    vec![vec![
        Button::callback(ACCEPT_BUTTON, callbacks::POLICY_ACCEPT),
        Button::callback(DECLINE_BUTTON, callbacks::POLICY_DECLINE),
    ]]
}

/// First presentation of the terms, after the document was submitted
pub fn policy_prompt(chat_id: i64, policy_url: &str) -> SendMessageParams {
    MessageBuilder::new(chat_id)
        .text(format!(
            "Please review our terms of service and privacy policy\\.\n\n[Link to Policy]({})\n\nDo you accept these terms\\?",
            escape_link_url(policy_url)
        ))
        .inline_buttons(policy_buttons())
        .build()
}

/// Sent when the actor types instead of pressing a policy button
pub fn policy_reminder(chat_id: i64, policy_url: &str) -> SendMessageParams {
    MessageBuilder::new(chat_id)
        .text(format!(
            "Please accept or decline the policy by pressing the buttons below\\.\n\n[Link to Policy]({})\n\nDo you accept these terms\\?",
            escape_link_url(policy_url)
        ))
        .inline_buttons(policy_buttons())
        .build()
}

pub fn registration_complete(chat_id: i64, first_name: &str) -> SendMessageParams {
    markdown(
        chat_id,
        format!(
            "✅ *Registration Complete\\!*\n\nThank you, {}\\. Your account is now submitted and *pending admin verification*\\.\n\nWe will notify you as soon as you are approved to make transactions\\.",
            escape_markdown(first_name)
        ),
    )
}

pub fn approved_caption(display_name: &str) -> String {
    format!("✅ User Approved: {display_name}")
}

/// Inside a MarkdownV2 link target only `)` and `\` are reserved
pub fn escape_link_url(url: &str) -> String {
    url.replace('\\', "\\\\").replace(')', "\\)")
}

/// Inside inline code only `` ` `` and `\` are reserved
pub fn escape_code(text: &str) -> String {
    text.replace('\\', "\\\\").replace('`', "\\`")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParseMode, ReplyMarkup};

    #[test]
    fn test_every_registering_state_has_a_prompt() {
        let titles = vec!["Germany".to_string(), "France".to_string()];
        for state in [
            ConversationState::AwaitingFirstName,
            ConversationState::AwaitingLastName,
            ConversationState::AwaitingPhone,
            ConversationState::AwaitingGovId,
            ConversationState::AwaitingLocation,
            ConversationState::AwaitingIdentityDocument,
            ConversationState::AwaitingPolicyApproval,
        ] {
            let prompt = state_prompt(1, state, &titles).unwrap();
            assert_eq!(prompt.parse_mode, Some(ParseMode::MarkdownV2));
            assert!(!prompt.text.is_empty());
        }
        assert!(state_prompt(1, ConversationState::None, &titles).is_none());
    }

    #[test]
    fn test_phone_prompt_requests_contact() {
        let prompt = state_prompt(1, ConversationState::AwaitingPhone, &[]).unwrap();
        let Some(ReplyMarkup::Reply(rows)) = prompt.reply_markup else {
            panic!("expected reply keyboard");
        };
        assert!(rows[0][0].request_contact);
        assert_eq!(rows[0][0].text, SHARE_PHONE_BUTTON);
    }

    #[test]
    fn test_policy_prompt_embeds_url_and_buttons() {
        let prompt = policy_prompt(3, "https://example.com/terms_(v2)");
        assert!(prompt
            .text
            .contains("[Link to Policy](https://example.com/terms_(v2\\))"));
        let Some(ReplyMarkup::Inline(rows)) = prompt.reply_markup else {
            panic!("expected inline keyboard");
        };
        assert_eq!(
            rows[0][0].callback_data.as_deref(),
            Some(callbacks::POLICY_ACCEPT)
        );
        assert_eq!(
            rows[0][1].callback_data.as_deref(),
            Some(callbacks::POLICY_DECLINE)
        );
    }

    #[test]
    fn test_interpolated_names_are_escaped() {
        let prompt = welcome_back(1, "Anne-Marie");
        assert!(prompt.text.contains("Anne\\-Marie"));
        let plain_reply = plain(1, INTERNAL_ERROR);
        assert_eq!(plain_reply.parse_mode, None);
    }
}
