//! Persistent lead storage and queries.

pub mod leads;
pub mod query;

pub use leads::{LeadStore, SyncReport, Upsert};
pub use query::{LeadQuery, LeadStats, SortKey, SortOrder};

impl LeadStore {
    /// Run a query over the whole store.
    pub fn query(&self, query: &LeadQuery) -> Vec<&crate::model::lead::Lead> {
        query.apply(self.iter())
    }

    pub fn stats(&self) -> LeadStats {
        LeadStats::compute(self.iter())
    }
}
