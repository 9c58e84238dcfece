//! Input validation applied before a registration step may advance.
//!
//! A failed check is a [`Rejection`]: the actor gets a corrective re-prompt and
//! nothing is persisted. Rejections are answers, not errors.

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

use super::errors::{StateMachineError, StateMachineResult};
use super::states::ConversationState;
use crate::config::CountryStrategy;
use crate::models::SharedContact;

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 50;
pub const GOV_ID_MIN_CHARS: usize = 5;
pub const GOV_ID_MAX_CHARS: usize = 50;
/// Optional leading `+`, then 9 to 15 digits
pub const PHONE_PATTERN: &str = r"^\+?[0-9]{9,15}$";

/// Shape of a free-form message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Contact,
    Photo,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Contact => write!(f, "contact"),
            Self::Photo => write!(f, "photo"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameField {
    First,
    Last,
}

/// Why an input did not advance the workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Right step, wrong kind of message
    UnexpectedInput {
        state: ConversationState,
        expected: InputKind,
        received: InputKind,
    },
    NameLength { field: NameField, length: usize },
    /// The shared contact card belongs to someone else
    ForeignContact { owner_handle: Option<i64> },
    MalformedPhone { phone_number: String },
    GovernmentIdLength { length: usize },
    UnsupportedCountry { choice: String },
    /// Only the accept/decline buttons answer the policy step
    AwaitingPolicyDecision,
    /// The actor is not in a registration step
    NotRegistering,
}

/// Validators for every field-collecting step
#[derive(Debug, Clone)]
pub struct RegistrationGuards {
    phone_pattern: Regex,
    countries: BTreeMap<String, CountryStrategy>,
}

impl RegistrationGuards {
    /// Build the guards for the configured country allow-list
    pub fn new(countries: BTreeMap<String, CountryStrategy>) -> StateMachineResult<Self> {
        let phone_pattern =
            Regex::new(PHONE_PATTERN).map_err(|e| StateMachineError::GuardConstruction {
                reason: format!("phone pattern: {e}"),
            })?;

        if countries.is_empty() {
            return Err(StateMachineError::GuardConstruction {
                reason: "country allow-list is empty".to_string(),
            });
        }

        Ok(Self {
            phone_pattern,
            countries,
        })
    }

    /// Name between 2 and 50 characters after trimming
    pub fn check_name(&self, field: NameField, value: &str) -> Result<String, Rejection> {
        let trimmed = value.trim();
        let length = trimmed.chars().count();
        if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&length) {
            return Err(Rejection::NameLength { field, length });
        }
        Ok(trimmed.to_string())
    }

    /// The contact must be the sender's own and carry a well-formed number
    pub fn check_phone(
        &self,
        contact: &SharedContact,
        sender_handle: i64,
    ) -> Result<String, Rejection> {
        if contact.owner_handle != Some(sender_handle) {
            return Err(Rejection::ForeignContact {
                owner_handle: contact.owner_handle,
            });
        }

        let phone_number = contact.phone_number.trim();
        if !self.phone_pattern.is_match(phone_number) {
            return Err(Rejection::MalformedPhone {
                phone_number: phone_number.to_string(),
            });
        }
        Ok(phone_number.to_string())
    }

    pub fn check_government_id(&self, value: &str) -> Result<String, Rejection> {
        let trimmed = value.trim();
        let length = trimmed.chars().count();
        if !(GOV_ID_MIN_CHARS..=GOV_ID_MAX_CHARS).contains(&length) {
            return Err(Rejection::GovernmentIdLength { length });
        }
        Ok(trimmed.to_string())
    }

    /// Match a country button title, returning `(iso_code, strategy)`
    pub fn resolve_country(&self, choice: &str) -> Result<(String, String), Rejection> {
        let choice = choice.trim();
        self.countries
            .iter()
            .find(|(_, country)| country.title == choice)
            .map(|(code, country)| (code.clone(), country.strategy.clone()))
            .ok_or_else(|| Rejection::UnsupportedCountry {
                choice: choice.to_string(),
            })
    }

    /// Button titles in ISO-code order
    pub fn country_titles(&self) -> Vec<String> {
        self.countries.values().map(|c| c.title.clone()).collect()
    }

    pub fn country_title(&self, code: &str) -> Option<&str> {
        self.countries.get(code).map(|c| c.title.as_str())
    }
}
