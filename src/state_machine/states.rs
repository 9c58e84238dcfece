use serde::{Deserialize, Serialize};
use std::fmt;

/// Review outcome of an actor's submitted identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Registration in progress or awaiting a reviewer decision
    #[default]
    Pending,
    /// A reviewer accepted the submitted identity
    Approved,
    /// A reviewer rejected the submitted identity
    Rejected,
}

impl VerificationStatus {
    /// Only pending actors may be reviewed
    pub fn is_reviewable(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("Invalid verification status: {s}")),
        }
    }
}

/// Registration workflow position, persisted on the actor record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    /// Not collecting anything
    #[default]
    None,
    AwaitingFirstName,
    AwaitingLastName,
    AwaitingPhone,
    AwaitingGovId,
    AwaitingLocation,
    AwaitingIdentityDocument,
    AwaitingPolicyApproval,
}

impl ConversationState {
    /// Workflow order, first to last
    pub const WORKFLOW: [ConversationState; 7] = [
        Self::AwaitingFirstName,
        Self::AwaitingLastName,
        Self::AwaitingPhone,
        Self::AwaitingGovId,
        Self::AwaitingLocation,
        Self::AwaitingIdentityDocument,
        Self::AwaitingPolicyApproval,
    ];

    /// The state that follows this one in the registration workflow
    pub fn next(&self) -> Self {
        match self {
            Self::AwaitingFirstName => Self::AwaitingLastName,
            Self::AwaitingLastName => Self::AwaitingPhone,
            Self::AwaitingPhone => Self::AwaitingGovId,
            Self::AwaitingGovId => Self::AwaitingLocation,
            Self::AwaitingLocation => Self::AwaitingIdentityDocument,
            Self::AwaitingIdentityDocument => Self::AwaitingPolicyApproval,
            Self::AwaitingPolicyApproval | Self::None => Self::None,
        }
    }

    /// States answered with a profile field typed or shared by the actor
    pub fn collects_field(&self) -> bool {
        matches!(
            self,
            Self::AwaitingFirstName
                | Self::AwaitingLastName
                | Self::AwaitingPhone
                | Self::AwaitingGovId
                | Self::AwaitingLocation
        )
    }

    /// Any state inside the registration workflow
    pub fn is_registering(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::AwaitingFirstName => write!(f, "awaiting_first_name"),
            Self::AwaitingLastName => write!(f, "awaiting_last_name"),
            Self::AwaitingPhone => write!(f, "awaiting_phone"),
            Self::AwaitingGovId => write!(f, "awaiting_gov_id"),
            Self::AwaitingLocation => write!(f, "awaiting_location"),
            Self::AwaitingIdentityDocument => write!(f, "awaiting_identity_document"),
            Self::AwaitingPolicyApproval => write!(f, "awaiting_policy_approval"),
        }
    }
}

impl std::str::FromStr for ConversationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "awaiting_first_name" => Ok(Self::AwaitingFirstName),
            "awaiting_last_name" => Ok(Self::AwaitingLastName),
            "awaiting_phone" => Ok(Self::AwaitingPhone),
            "awaiting_gov_id" => Ok(Self::AwaitingGovId),
            "awaiting_location" => Ok(Self::AwaitingLocation),
            "awaiting_identity_document" => Ok(Self::AwaitingIdentityDocument),
            "awaiting_policy_approval" => Ok(Self::AwaitingPolicyApproval),
            _ => Err(format!("Invalid conversation state: {s}")),
        }
    }
}
