//! Message sources and batch classification.
//!
//! - `imap`: recent messages from a live mailbox
//! - `local`: `.eml` files and MBOX archives on disk
//!
//! Both feed a [`BatchClassifier`], which never aborts on a single bad message.

pub mod imap;
pub mod local;

use tracing::warn;

use crate::classify::classify;
use crate::error::Result;
use crate::model::lead::Lead;
use crate::model::message::{ParsedEmailMessage, RawMessage};
use crate::parser::message::parse_raw;

/// Outcome of classifying a batch of messages.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Leads, newest `received_at` first.
    pub leads: Vec<Lead>,
    /// Messages seen.
    pub total: usize,
    /// Messages decoded but not leads (automated or sender-less).
    pub filtered: usize,
    /// Messages that could not be decoded.
    pub failed: usize,
}

/// Accumulates classification results one message at a time.
#[derive(Debug, Default)]
pub struct BatchClassifier {
    report: BatchReport,
}

impl BatchClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode and classify one raw message.
    pub fn push_raw(&mut self, raw: &RawMessage) {
        self.push_parsed(&raw.uid, parse_raw(raw));
    }

    /// Record the result of decoding one message. `origin` identifies it in logs.
    pub fn push_parsed(&mut self, origin: &str, parsed: Result<ParsedEmailMessage>) {
        self.report.total += 1;
        match parsed {
            Ok(message) => match classify(&message) {
                Some(lead) => self.report.leads.push(lead),
                None => self.report.filtered += 1,
            },
            Err(e) => {
                warn!(message = %origin, error = %e, "Skipping undecodable message");
                self.report.failed += 1;
            }
        }
    }

    pub fn finish(mut self) -> BatchReport {
        self.report
            .leads
            .sort_by(|a, b| b.received_at.cmp(&a.received_at));
        self.report
    }
}

/// Classify every raw message in `items`.
pub fn classify_batch(items: impl IntoIterator<Item = RawMessage>) -> BatchReport {
    let mut batch = BatchClassifier::new();
    for raw in items {
        batch.push_raw(&raw);
    }
    batch.finish()
}
