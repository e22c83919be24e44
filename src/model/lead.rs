//! The lead record and its classification enums.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LeadError;

/// A sales/contact lead extracted from one inbound message.
///
/// Serialized field names follow the admin API shape (`assignedTo`,
/// `receivedAt`, ...), and optional fields are omitted when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    /// `"email-" + uid`; the upsert key.
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    /// Trimmed body text.
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub source: LeadSource,
    pub status: LeadStatus,
    pub priority: LeadPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub received_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Id prefix shared by every lead that came from a mailbox message.
    pub const ID_PREFIX: &'static str = "email-";

    /// Build the lead id for a message uid.
    pub fn id_for_uid(uid: &str) -> String {
        format!("{}{uid}", Self::ID_PREFIX)
    }

    /// Tags as a slice (empty when none were derived).
    pub fn tag_list(&self) -> &[String] {
        self.tags.as_deref().unwrap_or(&[])
    }
}

/// How the lead reached us. Inferred from wording, never asserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadSource {
    Website,
    Direct,
    Referral,
}

/// Sales pipeline state. The classifier only ever produces `New`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Converted,
    Closed,
}

/// Urgency tier. Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadPriority {
    Low,
    Medium,
    High,
}

impl LeadSource {
    pub const ALL: [LeadSource; 3] = [Self::Website, Self::Direct, Self::Referral];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Website => "website",
            Self::Direct => "direct",
            Self::Referral => "referral",
        }
    }
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 5] = [
        Self::New,
        Self::Contacted,
        Self::Qualified,
        Self::Converted,
        Self::Closed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Qualified => "qualified",
            Self::Converted => "converted",
            Self::Closed => "closed",
        }
    }
}

impl LeadPriority {
    pub const ALL: [LeadPriority; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

macro_rules! str_enum_impls {
    ($ty:ty, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = LeadError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                <$ty>::ALL
                    .into_iter()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| LeadError::invalid($kind, s))
            }
        }
    };
}

str_enum_impls!(LeadSource, "source");
str_enum_impls!(LeadStatus, "status");
str_enum_impls!(LeadPriority, "priority");
