//! Sender addresses (RFC 5322 §3.4).

/// A parsed email address.
///
/// # Examples
/// - `"Jane Doe <jane@clientco.com>"` → `name = Some("Jane Doe")`, `address = "jane@clientco.com"`
/// - `"bob@acme.com"` → `name = None`, `address = "bob@acme.com"`
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct EmailAddress {
    /// Human-readable display name, if the header carried one.
    pub name: Option<String>,
    /// The bare email address (`user@domain`). May be empty for malformed headers.
    pub address: String,
}

impl EmailAddress {
    /// Build an address, normalizing an empty or blank display name to `None`.
    pub fn new(name: Option<&str>, address: &str) -> Self {
        let name = name
            .map(|n| strip_quotes(n))
            .filter(|n| !n.is_empty());
        Self {
            name,
            address: address.trim().to_string(),
        }
    }

    /// Parse a single address from a header value.
    ///
    /// Supported formats:
    /// - `"user@domain.com"`
    /// - `"<user@domain.com>"`
    /// - `"Display Name <user@domain.com>"`
    /// - `"\"Display, Name\" <user@domain.com>"`
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        if let (Some(start), Some(end)) = (trimmed.rfind('<'), trimmed.rfind('>')) {
            if end > start {
                return Self::new(Some(&trimmed[..start]), &trimmed[start + 1..end]);
            }
        }

        Self::new(None, trimmed)
    }

    /// The part of the address before `@` (the whole address if there is no `@`).
    pub fn local_part(&self) -> &str {
        self.address
            .split_once('@')
            .map(|(local, _)| local)
            .unwrap_or(&self.address)
    }

    /// Display name, falling back to the local part.
    pub fn display_name(&self) -> &str {
        match &self.name {
            Some(name) => name,
            None => self.local_part(),
        }
    }
}

/// Strip surrounding double-quotes and trim whitespace.
fn strip_quotes(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.address),
            None => write!(f, "{}", self.address),
        }
    }
}
