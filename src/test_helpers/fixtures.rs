//! Raw update builders shaped like Bot API payloads.
//!
//! Private-chat builders use the sender's handle as the chat id.

use crate::transport::types::{
    CallbackQuery, Chat, Contact, Message, MessageEntity, PhotoSize, RawUpdate, User,
};

/// Message id of the keyboard message carried by callback fixtures
pub const CALLBACK_MESSAGE_ID: i64 = 500;

pub fn user(handle: i64) -> User {
    User {
        id: handle,
        is_bot: false,
        first_name: format!("user{handle}"),
        username: None,
    }
}

fn chat(id: i64, kind: &str) -> Chat {
    Chat {
        id,
        kind: kind.to_string(),
    }
}

fn private_message(update_id: i64, handle: i64) -> Message {
    Message {
        message_id: update_id,
        from: Some(user(handle)),
        chat: chat(handle, "private"),
        text: None,
        caption: None,
        contact: None,
        photo: None,
        entities: None,
    }
}

fn wrap_message(update_id: i64, message: Message) -> RawUpdate {
    RawUpdate {
        update_id,
        message: Some(message),
        callback_query: None,
        channel_post: None,
    }
}

/// Plain text; a leading `/word` is marked as a bot command
pub fn text_update(update_id: i64, handle: i64, text: &str) -> RawUpdate {
    let mut message = private_message(update_id, handle);
    if text.starts_with('/') {
        let length = text.split_whitespace().next().unwrap_or(text).len();
        message.entities = Some(vec![MessageEntity {
            kind: "bot_command".to_string(),
            offset: 0,
            length: length as i64,
        }]);
    }
    message.text = Some(text.to_string());
    wrap_message(update_id, message)
}

/// A shared contact card; `owner` is the handle the card belongs to
pub fn contact_update(update_id: i64, handle: i64, phone: &str, owner: Option<i64>) -> RawUpdate {
    let mut message = private_message(update_id, handle);
    message.contact = Some(Contact {
        phone_number: phone.to_string(),
        first_name: format!("user{handle}"),
        user_id: owner,
    });
    wrap_message(update_id, message)
}

/// A photo in two sizes; `file_id` is the largest
pub fn photo_update(update_id: i64, handle: i64, file_id: &str) -> RawUpdate {
    let mut message = private_message(update_id, handle);
    message.photo = Some(photo_sizes(file_id));
    wrap_message(update_id, message)
}

/// Button press on a message the bot sent to the sender's private chat
pub fn callback_update(update_id: i64, handle: i64, data: &str) -> RawUpdate {
    callback_on_message(update_id, handle, handle, CALLBACK_MESSAGE_ID, data)
}

/// Button press on a specific message, e.g. a post in the review channel
pub fn callback_on_message(
    update_id: i64,
    handle: i64,
    chat_id: i64,
    message_id: i64,
    data: &str,
) -> RawUpdate {
    let message = Message {
        message_id,
        from: None,
        chat: chat(chat_id, if chat_id < 0 { "channel" } else { "private" }),
        text: None,
        caption: None,
        contact: None,
        photo: None,
        entities: None,
    };
    RawUpdate {
        update_id,
        message: None,
        callback_query: Some(CallbackQuery {
            id: format!("cb-{update_id}"),
            from: user(handle),
            message: Some(message),
            data: Some(data.to_string()),
        }),
        channel_post: None,
    }
}

pub fn channel_photo_post(update_id: i64, chat_id: i64, file_id: &str, caption: &str) -> RawUpdate {
    let post = Message {
        message_id: update_id,
        from: None,
        chat: chat(chat_id, "channel"),
        text: None,
        caption: Some(caption.to_string()),
        contact: None,
        photo: Some(photo_sizes(file_id)),
        entities: None,
    };
    wrap_channel_post(update_id, post)
}

pub fn channel_text_post(update_id: i64, chat_id: i64, text: &str) -> RawUpdate {
    let post = Message {
        message_id: update_id,
        from: None,
        chat: chat(chat_id, "channel"),
        text: Some(text.to_string()),
        caption: None,
        contact: None,
        photo: None,
        entities: None,
    };
    wrap_channel_post(update_id, post)
}

fn wrap_channel_post(update_id: i64, post: Message) -> RawUpdate {
    RawUpdate {
        update_id,
        message: None,
        callback_query: None,
        channel_post: Some(post),
    }
}

fn photo_sizes(file_id: &str) -> Vec<PhotoSize> {
    vec![
        PhotoSize {
            file_id: format!("{file_id}-thumb"),
            file_unique_id: format!("{file_id}-u1"),
            width: 90,
            height: 90,
            file_size: Some(1_024),
        },
        PhotoSize {
            file_id: file_id.to_string(),
            file_unique_id: format!("{file_id}-u2"),
            width: 1280,
            height: 960,
            file_size: Some(204_800),
        },
    ]
}
