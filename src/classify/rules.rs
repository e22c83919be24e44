//! Keyword tables driving lead classification.
//!
//! All matching against these tables is case-insensitive substring matching
//! on lower-cased text, so every entry here must be lower-case.

/// Address fragments that mark infrastructure / automated senders.
///
/// Matched anywhere in the address, local part or domain. A legitimate
/// `supportteam@client.com` is therefore dropped too.
pub const SYSTEM_SENDER_MARKERS: &[&str] = &[
    "noreply",
    "no-reply",
    "mailer-daemon",
    "postmaster",
    "support",
    "notification",
    "automated",
    "system",
];

/// Body phrases that indicate a website form submission.
pub const WEBSITE_BODY_KEYWORDS: &[&str] = &["contact form", "website"];

/// Subject phrases that indicate a website form submission.
pub const WEBSITE_SUBJECT_KEYWORDS: &[&str] = &["website inquiry", "contact form"];

/// Body phrases that indicate a referral.
pub const REFERRAL_KEYWORDS: &[&str] = &["referred", "referral", "recommended"];

/// Checked first; any hit classifies the lead as high priority.
pub const HIGH_PRIORITY_KEYWORDS: &[&str] = &[
    "urgent",
    "asap",
    "emergency",
    "critical",
    "immediate",
    "large project",
    "enterprise",
    "major",
    "significant investment",
];

/// Checked only when no high-priority keyword matched.
pub const MEDIUM_PRIORITY_KEYWORDS: &[&str] = &[
    "quote",
    "proposal",
    "budget",
    "timeline",
    "interested",
    "project",
    "service",
    "partnership",
];

/// Topical tag taxonomy: `(tag, keywords)`. Output tags follow this order.
pub const TAG_TAXONOMY: &[(&str, &[&str])] = &[
    (
        "telecom",
        &["telecom", "telecommunications", "network", "infrastructure"],
    ),
    (
        "energy",
        &["energy", "solar", "renewable", "power", "electrical"],
    ),
    ("quote", &["quote", "pricing", "cost", "budget", "price"]),
    (
        "partnership",
        &["partnership", "collaboration", "joint venture"],
    ),
    ("support", &["support", "help", "assistance", "question"]),
    (
        "consultation",
        &["consultation", "meeting", "discuss", "advice"],
    ),
];

/// Ordered company-name patterns; the first that matches wins.
/// Capture group 1 is the company name.
pub const COMPANY_PATTERNS: &[&str] = &[
    r"(?i)company:?\s*([^\n\r]+)",
    r"(?i)organization:?\s*([^\n\r]+)",
    r"(?i)from\s+([A-Z][A-Za-z\s&]+(?:Ltd|Inc|Corp|LLC|Company))",
    r"(?i)representing\s+([A-Z][A-Za-z\s&]+)",
];

/// Phone-like run: optional `+`, then at least ten digits, spaces, hyphens or parentheses.
pub const PHONE_PATTERN: &str = r"\+?[\d\s\-()]{10,}";

/// Subject used when the message has none.
pub const DEFAULT_SUBJECT: &str = "No Subject";

/// True if any keyword in `keywords` occurs in `haystack` (already lower-cased).
pub fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| haystack.contains(k))
}
