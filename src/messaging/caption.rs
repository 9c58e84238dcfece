//! Relay caption wire format.
//!
//! Captions are plain-text lines. Exactly one line carries structure,
//! `UserID: <uuid>`; every other line is for human readers of the channel.

use std::fmt::Write as _;
use uuid::Uuid;

use super::errors::{QueueError, QueueResult};
use crate::constants::caption::{ACTOR_ID_LINE_PREFIX, HEADER};
use crate::models::Actor;

/// Render the plain-text caption posted alongside an identity document
pub fn build_relay_caption(actor: &Actor) -> String {
    let mut caption = String::new();
    let _ = writeln!(caption, "{HEADER}");
    let _ = writeln!(caption, "{ACTOR_ID_LINE_PREFIX}{}", actor.id);

    let lines = [
        ("First Name", &actor.first_name),
        ("Last Name", &actor.last_name),
        ("Phone", &actor.phone_number),
        ("Gov ID", &actor.government_id),
        ("Country", &actor.location_country),
        ("Strategy", &actor.verification_strategy),
    ];
    for (label, value) in lines {
        if let Some(value) = value {
            let _ = writeln!(caption, "{label}: {value}");
        }
    }
    caption
}

/// Recover the actor id from a relayed caption
pub fn parse_actor_id(caption: &str) -> QueueResult<Uuid> {
    let value = caption
        .lines()
        .find_map(|line| line.trim().strip_prefix(ACTOR_ID_LINE_PREFIX))
        .ok_or_else(|| QueueError::caption_parse("no UserID line"))?;

    Uuid::parse_str(value.trim())
        .map_err(|e| QueueError::caption_parse(format!("invalid UserID '{}': {e}", value.trim())))
}
