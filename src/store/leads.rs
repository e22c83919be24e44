//! JSON-file lead store.
//!
//! The whole store is loaded into memory; every mutation is followed by an
//! explicit [`LeadStore::save`], which writes a temp file next to the target
//! and renames it into place.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{LeadError, Result};
use crate::model::lead::{Lead, LeadPriority, LeadStatus};

/// On-disk format version.
const STORE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    leads: Vec<Lead>,
}

/// Counts from a [`LeadStore::sync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub inserted: usize,
    pub updated: usize,
}

/// Result of upserting one lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

/// Leads keyed by id, persisted as one JSON document.
#[derive(Debug)]
pub struct LeadStore {
    path: PathBuf,
    leads: HashMap<String, Lead>,
}

impl LeadStore {
    /// Load the store at `path`. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No lead store yet, starting empty");
                return Ok(Self {
                    path,
                    leads: HashMap::new(),
                });
            }
            Err(e) => return Err(LeadError::io(&path, e)),
        };

        let file: StoreFile = serde_json::from_str(&contents).map_err(|e| LeadError::Store {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        if file.version != STORE_VERSION {
            return Err(LeadError::Store {
                path,
                reason: format!("unsupported store version {}", file.version),
            });
        }

        let leads = file
            .leads
            .into_iter()
            .map(|lead| (lead.id.clone(), lead))
            .collect::<HashMap<_, _>>();
        info!(path = %path.display(), leads = leads.len(), "Opened lead store");
        Ok(Self { path, leads })
    }

    pub fn len(&self) -> usize {
        self.leads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }

    /// Insert a new lead, or refresh the message-derived fields of an existing one.
    ///
    /// Triage fields set by people (status, priority, assignee, notes) survive
    /// a refresh.
    pub fn upsert(&mut self, lead: Lead) -> Upsert {
        self.upsert_at(lead, Utc::now())
    }

    fn upsert_at(&mut self, lead: Lead, now: DateTime<Utc>) -> Upsert {
        match self.leads.get_mut(&lead.id) {
            Some(existing) => {
                existing.name = lead.name;
                existing.email = lead.email;
                existing.subject = lead.subject;
                existing.message = lead.message;
                existing.company = lead.company;
                existing.phone = lead.phone;
                existing.tags = lead.tags;
                existing.received_at = lead.received_at;
                existing.updated_at = now;
                Upsert::Updated
            }
            None => {
                self.leads.insert(lead.id.clone(), lead);
                Upsert::Inserted
            }
        }
    }

    /// Upsert a batch of leads.
    pub fn sync(&mut self, leads: impl IntoIterator<Item = Lead>) -> SyncReport {
        let mut report = SyncReport::default();
        for lead in leads {
            match self.upsert(lead) {
                Upsert::Inserted => report.inserted += 1,
                Upsert::Updated => report.updated += 1,
            }
        }
        report
    }

    pub fn get(&self, id: &str) -> Option<&Lead> {
        self.leads.get(id)
    }

    /// All leads, or the newest `limit`, by `received_at` descending.
    pub fn list(&self, limit: Option<usize>) -> Vec<&Lead> {
        let mut all: Vec<&Lead> = self.leads.values().collect();
        all.sort_by(|a, b| {
            b.received_at
                .cmp(&a.received_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        if let Some(n) = limit {
            all.truncate(n);
        }
        all
    }

    /// Map user input to a lead id. Accepts a full id or a bare message uid.
    ///
    /// Input that already carries the id prefix is never prefixed again.
    pub fn resolve_id(&self, input: &str) -> String {
        if self.leads.contains_key(input) || input.starts_with(Lead::ID_PREFIX) {
            input.to_string()
        } else {
            Lead::id_for_uid(input)
        }
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Lead> {
        self.leads
            .get_mut(id)
            .ok_or_else(|| LeadError::LeadNotFound(id.to_string()))
    }

    pub fn update_status(&mut self, id: &str, status: LeadStatus) -> Result<&Lead> {
        let lead = self.get_mut(id)?;
        lead.status = status;
        lead.updated_at = Utc::now();
        Ok(lead)
    }

    pub fn update_priority(&mut self, id: &str, priority: LeadPriority) -> Result<&Lead> {
        let lead = self.get_mut(id)?;
        lead.priority = priority;
        lead.updated_at = Utc::now();
        Ok(lead)
    }

    /// Assign a lead to someone, or clear the assignment with `None`.
    pub fn assign(&mut self, id: &str, assignee: Option<&str>) -> Result<&Lead> {
        let lead = self.get_mut(id)?;
        lead.assigned_to = assignee
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);
        lead.updated_at = Utc::now();
        Ok(lead)
    }

    /// Append a timestamped line to the lead's notes.
    pub fn add_note(&mut self, id: &str, note: &str) -> Result<&Lead> {
        let now = Utc::now();
        let lead = self.get_mut(id)?;
        let line = format!("[{}] {}", now.to_rfc3339(), note.trim());
        lead.notes = Some(match lead.notes.take() {
            Some(existing) if !existing.is_empty() => format!("{existing}\n{line}"),
            _ => line,
        });
        lead.updated_at = now;
        Ok(lead)
    }

    pub fn remove(&mut self, id: &str) -> Result<Lead> {
        self.leads
            .remove(id)
            .ok_or_else(|| LeadError::LeadNotFound(id.to_string()))
    }

    /// Write the store to disk atomically.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| LeadError::io(parent, e))?;
        }

        let file = StoreFile {
            version: STORE_VERSION,
            leads: self.list(None).into_iter().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, json).map_err(|e| LeadError::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| LeadError::io(&self.path, e))?;

        debug!(path = %self.path.display(), leads = file.leads.len(), "Saved lead store");
        Ok(())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Lead> {
        self.leads.values()
    }
}
