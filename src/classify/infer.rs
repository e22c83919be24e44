//! Keyword-driven inference: system senders, source channel, priority, tags.
//!
//! Every function takes text that is already lower-cased.

use crate::model::lead::{LeadPriority, LeadSource};

use super::rules::{
    contains_any, HIGH_PRIORITY_KEYWORDS, MEDIUM_PRIORITY_KEYWORDS, REFERRAL_KEYWORDS,
    SYSTEM_SENDER_MARKERS, TAG_TAXONOMY, WEBSITE_BODY_KEYWORDS, WEBSITE_SUBJECT_KEYWORDS,
};

/// True if the address looks like bounce / notification / no-reply traffic.
pub fn is_system_sender(address: &str) -> bool {
    contains_any(&address.to_lowercase(), SYSTEM_SENDER_MARKERS)
}

/// Website beats referral; `Direct` is the fallback, not a positive signal.
pub fn infer_source(body: &str, subject: &str) -> LeadSource {
    if contains_any(body, WEBSITE_BODY_KEYWORDS) || contains_any(subject, WEBSITE_SUBJECT_KEYWORDS)
    {
        LeadSource::Website
    } else if contains_any(body, REFERRAL_KEYWORDS) {
        LeadSource::Referral
    } else {
        LeadSource::Direct
    }
}

/// High keywords are checked before medium ones, so a message matching both is high.
pub fn infer_priority(body: &str, subject: &str) -> LeadPriority {
    let hit = |keywords: &[&str]| contains_any(body, keywords) || contains_any(subject, keywords);

    if hit(HIGH_PRIORITY_KEYWORDS) {
        LeadPriority::High
    } else if hit(MEDIUM_PRIORITY_KEYWORDS) {
        LeadPriority::Medium
    } else {
        LeadPriority::Low
    }
}

/// Every taxonomy tag with at least one keyword in body or subject, in taxonomy order.
pub fn derive_tags(body: &str, subject: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for (tag, keywords) in TAG_TAXONOMY {
        let matched = contains_any(body, keywords) || contains_any(subject, keywords);
        if matched && !tags.iter().any(|t| t == tag) {
            tags.push((*tag).to_string());
        }
    }
    tags
}
