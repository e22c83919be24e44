//! Core data model: sender addresses, parsed inbound messages, and leads.

pub mod address;
pub mod lead;
pub mod message;
