//! `leadsift` turns an inbound company mailbox into sales leads.
//!
//! Messages come from IMAP or from local MBOX/EML archives, are decoded with
//! `mail-parser`, classified by keyword heuristics, and kept in a JSON lead
//! store that can be queried and exported.

pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod inbox;
pub mod model;
pub mod parser;
pub mod store;
