//! Email-to-lead classification.
//!
//! [`classify`] turns one [`ParsedEmailMessage`] into a [`Lead`], or `None`
//! when the message is not a lead (no usable sender, or an automated sender).
//! It does no I/O and keeps no state, so messages can be classified in any
//! order or in parallel.

pub mod extract;
pub mod infer;
pub mod rules;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::model::lead::{Lead, LeadStatus};
use crate::model::message::ParsedEmailMessage;

/// Classify a message using the current time for `updated_at`.
pub fn classify(message: &ParsedEmailMessage) -> Option<Lead> {
    classify_at(message, Utc::now())
}

/// Classify a message with an explicit clock.
///
/// `now` becomes `updated_at`, and `received_at` when the message has no date.
/// The output depends only on `message` and `now`.
pub fn classify_at(message: &ParsedEmailMessage, now: DateTime<Utc>) -> Option<Lead> {
    let sender = message.sender()?;
    if sender.address.trim().is_empty() {
        debug!(uid = %message.uid, "Skipping message without sender address");
        return None;
    }

    if infer::is_system_sender(&sender.address) {
        debug!(uid = %message.uid, sender = %sender.address, "Skipping system sender");
        return None;
    }

    let subject = message
        .subject
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| rules::DEFAULT_SUBJECT.to_string());
    let body = extract::body_text(message.text.as_deref(), message.html.as_deref());

    let body_lower = body.to_lowercase();
    let subject_lower = subject.to_lowercase();

    let tags = infer::derive_tags(&body_lower, &subject_lower);

    Some(Lead {
        id: Lead::id_for_uid(&message.uid),
        name: sender.display_name().to_string(),
        email: sender.address.clone(),
        message: body.trim().to_string(),
        company: extract::extract_company(&body),
        phone: extract::extract_phone(&body),
        source: infer::infer_source(&body_lower, &subject_lower),
        status: LeadStatus::New,
        priority: infer::infer_priority(&body_lower, &subject_lower),
        assigned_to: None,
        tags: (!tags.is_empty()).then_some(tags),
        notes: None,
        received_at: message.date.unwrap_or(now),
        updated_at: now,
        subject,
    })
}
