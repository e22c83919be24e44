//! Parsed inbound message, the classifier's input.

use chrono::{DateTime, Utc};

use super::address::EmailAddress;

/// Undecoded message bytes tagged with their identifier.
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// Mailbox UID, or a content-derived id for local files.
    pub uid: String,
    /// Full RFC 5322 message (headers + body), possibly with a leading MBOX `From ` line.
    pub bytes: Vec<u8>,
}

impl RawMessage {
    pub fn new(uid: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            uid: uid.into(),
            bytes,
        }
    }
}

/// An inbound email after MIME decoding.
///
/// Produced by [`crate::parser::message::parse_message`] from raw bytes, or
/// built directly by callers that already have decoded fields.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParsedEmailMessage {
    /// Mailbox UID (or a content-derived id for local files).
    pub uid: String,

    /// Addresses from the `From:` header, in header order.
    pub from: Vec<EmailAddress>,

    /// Decoded subject line.
    pub subject: Option<String>,

    /// First `text/plain` body part.
    pub text: Option<String>,

    /// First `text/html` body part.
    pub html: Option<String>,

    /// Parsed `Date:` header.
    pub date: Option<DateTime<Utc>>,

    /// `Message-ID` header without angle brackets.
    pub message_id: Option<String>,
}

impl ParsedEmailMessage {
    /// Start a message with the given uid and sender header value.
    pub fn new(uid: impl Into<String>, from: &str) -> Self {
        Self {
            uid: uid.into(),
            from: vec![EmailAddress::parse(from)],
            ..Default::default()
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// The first sender, if any.
    pub fn sender(&self) -> Option<&EmailAddress> {
        self.from.first()
    }
}
