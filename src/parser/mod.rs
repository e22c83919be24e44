//! Message parsing: MIME decoding, MBOX splitting, and EML loading.

pub mod eml;
pub mod mbox;
pub mod message;
