//! Free-text field extraction: body normalization, phone numbers, company names.

use std::sync::LazyLock;

use regex::Regex;

use super::rules::{COMPANY_PATTERNS, PHONE_PATTERN};

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PHONE_PATTERN).expect("valid phone pattern"));

static COMPANY_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    COMPANY_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("valid company pattern"))
        .collect()
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"));

/// Remove `<...>` tags. Entities are left as-is and whitespace is not collapsed.
pub fn strip_html_tags(html: &str) -> String {
    TAG_RE.replace_all(html, "").into_owned()
}

/// Pick the body to classify: the text part, else the tag-stripped HTML part, else empty.
pub fn body_text(text: Option<&str>, html: Option<&str>) -> String {
    match (text, html) {
        (Some(t), _) => t.to_string(),
        (None, Some(h)) => strip_html_tags(h),
        (None, None) => String::new(),
    }
}

/// First phone-like run in `body`, trimmed.
///
/// Runs without a single digit (a long stretch of blank lines, say) are skipped.
pub fn extract_phone(body: &str) -> Option<String> {
    PHONE_RE
        .find_iter(body)
        .map(|m| m.as_str().trim())
        .find(|s| s.chars().any(|c| c.is_ascii_digit()))
        .map(str::to_string)
}

/// Company name from the first matching label pattern.
pub fn extract_company(body: &str) -> Option<String> {
    COMPANY_RES.iter().find_map(|re| {
        re.captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    })
}
