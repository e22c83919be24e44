//! Pull recent messages from an IMAP mailbox.
//!
//! The folder is opened with `EXAMINE` and bodies are fetched with
//! `BODY.PEEK[]`, so nothing in the mailbox is modified or marked as seen.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use async_imap::Session;
use async_native_tls::TlsConnector;
use chrono::Utc;
use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use super::{classify_batch, BatchReport};
use crate::config::MailboxConfig;
use crate::error::{LeadError, Result};
use crate::model::message::RawMessage;

type AsyncTcpStream = async_io::Async<TcpStream>;
type TlsStream = async_native_tls::TlsStream<AsyncTcpStream>;

/// Resolved connection settings. The password never appears in `Debug` output.
#[derive(Debug)]
pub struct MailboxSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    pub folder: String,
    pub since_days: u32,
    pub limit: usize,
    pub connect_timeout: Duration,
}

impl MailboxSettings {
    /// Build settings from config.
    ///
    /// Returns `Ok(None)` when no password is configured, which callers treat
    /// as "mailbox not set up". Plain-text IMAP is a configuration error.
    pub fn from_config(config: &MailboxConfig) -> Result<Option<Self>> {
        if !config.use_tls {
            return Err(LeadError::Config(
                "TLS is required for mailbox connections".to_string(),
            ));
        }
        let Some(password) = config.password.as_deref().filter(|p| !p.is_empty()) else {
            return Ok(None);
        };
        if config.host.trim().is_empty() {
            return Err(LeadError::Config("mailbox host is empty".to_string()));
        }
        Ok(Some(Self {
            host: config.host.clone(),
            port: config.port,
            user: config.user.clone(),
            password: SecretString::from(password.to_string()),
            folder: config.folder.clone(),
            since_days: config.since_days,
            limit: config.limit,
            connect_timeout: Duration::from_secs(config.connect_timeout_secs.max(1)),
        }))
    }

    /// `SINCE` criterion for the lookback window, e.g. `SINCE 02-Apr-2024`.
    pub fn since_query(&self) -> String {
        let since = Utc::now() - chrono::Duration::days(i64::from(self.since_days));
        format!("SINCE {}", since.format("%d-%b-%Y"))
    }
}

/// Read-only fetcher for the most recent messages of one folder.
pub struct ImapFetcher {
    settings: MailboxSettings,
}

impl ImapFetcher {
    pub fn new(settings: MailboxSettings) -> Self {
        Self { settings }
    }

    /// Fetch up to `limit` of the newest messages in the lookback window.
    pub async fn fetch_recent(&self) -> Result<Vec<RawMessage>> {
        let s = &self.settings;
        let mut session = tokio::time::timeout(s.connect_timeout, self.connect())
            .await
            .map_err(|_| {
                LeadError::Timeout(format!(
                    "connecting to {}:{} took longer than {:?}",
                    s.host, s.port, s.connect_timeout
                ))
            })??;

        let result = self.fetch_in_session(&mut session).await;

        if let Err(e) = session.logout().await {
            warn!(error = %e, "IMAP logout failed");
        }
        result
    }

    async fn connect(&self) -> Result<Session<TlsStream>> {
        let s = &self.settings;
        info!(host = %s.host, port = s.port, "Connecting to IMAP server");

        // Lookup runs on the blocking pool and the connect is async, so both
        // stay under the caller's timeout.
        let (host, port) = (s.host.clone(), s.port);
        let addr = tokio::task::spawn_blocking(move || resolve_addr(&host, port))
            .await
            .map_err(|e| LeadError::Imap(format!("address lookup failed: {e}")))??;

        let tcp = AsyncTcpStream::connect(addr)
            .await
            .map_err(|e| LeadError::Imap(format!("TCP connect to {addr}: {e}")))?;

        let tls = TlsConnector::new().connect(&s.host, tcp).await?;
        let client = async_imap::Client::new(tls);

        let session = client
            .login(&s.user, s.password.expose_secret())
            .await
            .map_err(|(e, _)| LeadError::Authentication(e.to_string()))?;
        debug!(user = %s.user, "Authenticated to IMAP server");
        Ok(session)
    }

    async fn fetch_in_session(&self, session: &mut Session<TlsStream>) -> Result<Vec<RawMessage>> {
        let s = &self.settings;

        let mailbox = session
            .examine(&s.folder)
            .await
            .map_err(|e| LeadError::Imap(format!("EXAMINE {}: {e}", s.folder)))?;
        debug!(folder = %s.folder, exists = mailbox.exists, "Folder opened read-only");

        let query = s.since_query();
        let uids = session
            .uid_search(&query)
            .await
            .map_err(|e| LeadError::Imap(format!("UID SEARCH {query}: {e}")))?;

        let recent = newest_uids(uids, s.limit);
        info!(matched = recent.len(), query = %query, "Searching mailbox");
        if recent.is_empty() {
            return Ok(Vec::new());
        }

        let uid_set = recent
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");

        let mut messages = session
            .uid_fetch(&uid_set, "(UID BODY.PEEK[])")
            .await
            .map_err(|e| LeadError::Imap(format!("UID FETCH: {e}")))?;

        let mut raw = Vec::with_capacity(recent.len());
        while let Some(item) = messages.next().await {
            match item {
                Ok(fetch) => match (fetch.uid, fetch.body()) {
                    (Some(uid), Some(body)) => {
                        raw.push(RawMessage::new(uid.to_string(), body.to_vec()))
                    }
                    _ => warn!("Fetched message is missing its UID or body"),
                },
                Err(e) => warn!(error = %e, "Error fetching message"),
            }
        }

        info!(fetched = raw.len(), "Fetched messages");
        Ok(raw)
    }
}

/// Keep the `limit` highest UIDs, ascending.
fn newest_uids(uids: impl IntoIterator<Item = u32>, limit: usize) -> Vec<u32> {
    let mut all: Vec<u32> = uids.into_iter().collect();
    all.sort_unstable();
    let skip = all.len().saturating_sub(limit);
    all.split_off(skip)
}

/// Fetch and classify recent mailbox messages.
///
/// A mailbox without a password yields an empty report with a warning.
pub async fn fetch_leads(config: &MailboxConfig) -> Result<BatchReport> {
    let Some(settings) = MailboxSettings::from_config(config)? else {
        warn!("Mailbox password not configured (set LEADSIFT_EMAIL_PASSWORD); nothing fetched");
        return Ok(BatchReport::default());
    };
    let raw = ImapFetcher::new(settings).fetch_recent().await?;
    Ok(classify_batch(raw))
}

fn resolve_addr(host: &str, port: u16) -> Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()
        .map_err(|e| LeadError::Imap(format!("cannot resolve {host}: {e}")))?
        .next()
        .ok_or_else(|| LeadError::Imap(format!("no address for {host}")))
}
