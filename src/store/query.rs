//! Filtering, sorting and counting stored leads.
//!
//! Filters are checked cheapest first (enum equality), then the text search.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;

use crate::error::LeadError;
use crate::model::lead::{Lead, LeadPriority, LeadSource, LeadStatus};

/// Field to sort by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// `received_at`.
    #[default]
    Date,
    Name,
    Priority,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortKey {
    type Err = LeadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" | "received" => Ok(Self::Date),
            "name" => Ok(Self::Name),
            "priority" => Ok(Self::Priority),
            _ => Err(LeadError::invalid("sort key", s)),
        }
    }
}

impl FromStr for SortOrder {
    type Err = LeadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(LeadError::invalid("sort order", s)),
        }
    }
}

/// Lead filter and ordering. The default matches everything, newest first.
#[derive(Debug, Clone, Default)]
pub struct LeadQuery {
    /// Case-insensitive substring over name, email, company and subject.
    pub search: Option<String>,
    pub status: Option<LeadStatus>,
    pub priority: Option<LeadPriority>,
    pub source: Option<LeadSource>,
    pub sort: SortKey,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl LeadQuery {
    pub fn matches(&self, lead: &Lead) -> bool {
        if self.status.is_some_and(|s| s != lead.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != lead.priority) {
            return false;
        }
        if self.source.is_some_and(|s| s != lead.source) {
            return false;
        }

        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                [
                    Some(lead.name.as_str()),
                    Some(lead.email.as_str()),
                    lead.company.as_deref(),
                    Some(lead.subject.as_str()),
                ]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }

    /// Filter, sort and truncate.
    pub fn apply<'a>(&self, leads: impl IntoIterator<Item = &'a Lead>) -> Vec<&'a Lead> {
        let mut out: Vec<&Lead> = leads.into_iter().filter(|l| self.matches(l)).collect();

        out.sort_by(|a, b| {
            let ord = match self.sort {
                SortKey::Date => a.received_at.cmp(&b.received_at),
                SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                SortKey::Priority => a
                    .priority
                    .cmp(&b.priority)
                    .then_with(|| a.received_at.cmp(&b.received_at)),
            };
            let ord = ord.then_with(|| a.id.cmp(&b.id));
            match self.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        if let Some(n) = self.limit {
            out.truncate(n);
        }
        out
    }
}

/// Counts over a set of leads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LeadStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<String, usize>,
    pub by_source: BTreeMap<String, usize>,
    pub by_tag: BTreeMap<String, usize>,
}

impl LeadStats {
    pub fn compute<'a>(leads: impl IntoIterator<Item = &'a Lead>) -> Self {
        let mut stats = Self::default();
        for status in LeadStatus::ALL {
            stats.by_status.insert(status.to_string(), 0);
        }
        for priority in LeadPriority::ALL {
            stats.by_priority.insert(priority.to_string(), 0);
        }
        for source in LeadSource::ALL {
            stats.by_source.insert(source.to_string(), 0);
        }

        for lead in leads {
            stats.total += 1;
            *stats.by_status.entry(lead.status.to_string()).or_default() += 1;
            *stats.by_priority.entry(lead.priority.to_string()).or_default() += 1;
            *stats.by_source.entry(lead.source.to_string()).or_default() += 1;
            for tag in lead.tag_list() {
                *stats.by_tag.entry(tag.clone()).or_default() += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn lead(id: &str, name: &str, priority: LeadPriority, day: u32) -> Lead {
        let at: DateTime<Utc> = format!("2024-01-{day:02}T10:00:00Z").parse().unwrap();
        Lead {
            id: id.into(),
            name: name.into(),
            email: format!("{}@client.com", name.to_lowercase()),
            subject: "Hello".into(),
            message: String::new(),
            company: (name == "Karim").then(|| "Acme Construction".to_string()),
            phone: None,
            source: LeadSource::Direct,
            status: LeadStatus::New,
            priority,
            assigned_to: None,
            tags: (priority == LeadPriority::High).then(|| vec!["support".to_string()]),
            notes: None,
            received_at: at,
            updated_at: at,
        }
    }

    fn sample() -> Vec<Lead> {
        vec![
            lead("a", "Jane", LeadPriority::Medium, 1),
            lead("b", "Karim", LeadPriority::High, 3),
            lead("c", "ana", LeadPriority::Low, 2),
        ]
    }

    fn ids(leads: Vec<&Lead>) -> Vec<&str> {
        leads.into_iter().map(|l| l.id.as_str()).collect()
    }

    #[test]
    fn test_default_is_date_desc() {
        let leads = sample();
        assert_eq!(ids(LeadQuery::default().apply(&leads)), ["b", "c", "a"]);
    }

    #[test]
    fn test_search_is_case_insensitive_over_company() {
        let leads = sample();
        let q = LeadQuery {
            search: Some("ACME".into()),
            ..Default::default()
        };
        assert_eq!(ids(q.apply(&leads)), ["b"]);
    }

    #[test]
    fn test_sort_by_name_and_priority() {
        let leads = sample();
        let by_name = LeadQuery {
            sort: SortKey::Name,
            order: SortOrder::Asc,
            ..Default::default()
        };
        assert_eq!(ids(by_name.apply(&leads)), ["c", "a", "b"]);

        let by_priority = LeadQuery {
            sort: SortKey::Priority,
            limit: Some(2),
            ..Default::default()
        };
        assert_eq!(ids(by_priority.apply(&leads)), ["b", "a"]);
    }

    #[test]
    fn test_enum_filters() {
        let leads = sample();
        let q = LeadQuery {
            priority: Some(LeadPriority::Low),
            ..Default::default()
        };
        assert_eq!(ids(q.apply(&leads)), ["c"]);
        let none = LeadQuery {
            status: Some(LeadStatus::Closed),
            ..Default::default()
        };
        assert!(none.apply(&leads).is_empty());
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!("Priority".parse::<SortKey>().unwrap(), SortKey::Priority);
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert!("size".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_stats() {
        let leads = sample();
        let stats = LeadStats::compute(&leads);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_status["new"], 3);
        assert_eq!(stats.by_status["closed"], 0);
        assert_eq!(stats.by_priority["high"], 1);
        assert_eq!(stats.by_source["direct"], 3);
        assert_eq!(stats.by_tag["support"], 1);
    }
}
